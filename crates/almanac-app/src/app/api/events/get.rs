use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};

use almanac_service::schedule::EventView;

use super::respond;
use super::types::handle_param;
use crate::error::AppResult;
use crate::middleware::auth::get_owner_from_depot;
use crate::service_handler::get_service_from_depot;

async fn get(req: &mut Request, depot: &mut Depot) -> AppResult<EventView> {
    let owner = get_owner_from_depot(depot)?;
    let handle = handle_param(req)?;
    let service = get_service_from_depot(depot)?;
    Ok(service.get(&owner, handle).await?)
}

/// ## Summary
/// GET /api/events/{handle} - Returns one event or occurrence.
///
/// ## Errors
/// Returns HTTP 400 for a malformed handle and 404 for an unknown one.
#[handler]
pub async fn get_event(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = get(req, depot).await;
    respond(res, StatusCode::OK, result);
}
