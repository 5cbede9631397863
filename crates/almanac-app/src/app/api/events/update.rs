use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};

use almanac_service::schedule::{EventView, OccurrenceScope};

use super::respond;
use super::types::{UpdateEventRequest, handle_param, query_param, required_json};
use crate::error::AppResult;
use crate::middleware::auth::get_owner_from_depot;
use crate::service_handler::get_service_from_depot;

async fn update(req: &mut Request, depot: &mut Depot) -> AppResult<EventView> {
    let owner = get_owner_from_depot(depot)?;
    let handle = handle_param(req)?;
    let query_scope = query_param::<OccurrenceScope>(req, &["scope", "editType"])?;
    let body: UpdateEventRequest = required_json(req).await?;
    let (body_scope, patch) = body.into_parts();
    let scope = query_scope.or(body_scope).unwrap_or_default();

    let service = get_service_from_depot(depot)?;
    Ok(service.update(&owner, handle, scope, patch).await?)
}

/// ## Summary
/// PUT /api/events/{handle} - Partially updates an event.
///
/// For an occurrence, `scope=this` (the default) detaches it into its own
/// row and `scope=all` edits the whole series.
///
/// ## Errors
/// Returns HTTP 400 for malformed input and 404 for an unknown handle.
#[handler]
pub async fn update_event(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = update(req, depot).await;
    respond(res, StatusCode::OK, result);
}
