use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};

use almanac_service::schedule::{EventView, OccurrenceScope};

use super::respond;
use super::types::{CompleteEventRequest, handle_param, optional_json, query_param};
use crate::error::AppResult;
use crate::middleware::auth::get_owner_from_depot;
use crate::service_handler::get_service_from_depot;

async fn complete(req: &mut Request, depot: &mut Depot) -> AppResult<EventView> {
    let owner = get_owner_from_depot(depot)?;
    let handle = handle_param(req)?;
    let query_scope = query_param::<OccurrenceScope>(req, &["scope", "completeType"])?;
    let body: CompleteEventRequest = optional_json(req).await?;
    let scope = query_scope.or(body.scope).unwrap_or_default();

    let service = get_service_from_depot(depot)?;
    Ok(service.complete(&owner, handle, scope).await?)
}

async fn uncomplete(req: &mut Request, depot: &mut Depot) -> AppResult<EventView> {
    let owner = get_owner_from_depot(depot)?;
    let handle = handle_param(req)?;
    let service = get_service_from_depot(depot)?;
    Ok(service.uncomplete(&owner, handle).await?)
}

/// ## Summary
/// POST /api/events/{handle}/complete - Marks an event, one occurrence or a
/// whole series (`scope=all`) as done.
///
/// ## Errors
/// Returns HTTP 404 for an unknown handle.
#[handler]
pub async fn complete_event(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = complete(req, depot).await;
    respond(res, StatusCode::OK, result);
}

/// ## Summary
/// POST /api/events/{handle}/uncomplete - Reverts a completion. Repeating it
/// changes nothing.
///
/// ## Errors
/// Returns HTTP 404 for an unknown handle.
#[handler]
pub async fn uncomplete_event(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = uncomplete(req, depot).await;
    respond(res, StatusCode::OK, result);
}
