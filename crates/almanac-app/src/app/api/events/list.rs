use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};

use almanac_service::schedule::EventView;

use super::respond;
use super::types::window_query;
use crate::error::AppResult;
use crate::middleware::auth::get_owner_from_depot;
use crate::service_handler::get_service_from_depot;

async fn list(req: &mut Request, depot: &mut Depot) -> AppResult<Vec<EventView>> {
    let owner = get_owner_from_depot(depot)?;
    let window = window_query(req)?;
    let service = get_service_from_depot(depot)?;
    Ok(service.list(&owner, window).await?)
}

/// ## Summary
/// GET /api/events?startDate=&endDate= - Lists the caller's events whose start
/// date lies in the inclusive window, recurring occurrences included.
///
/// ## Errors
/// Returns HTTP 400 for a missing, malformed or inverted window.
#[handler]
pub async fn list_events(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = list(req, depot).await;
    respond(res, StatusCode::OK, result);
}
