use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};

use almanac_service::schedule::DeleteScope;

use super::types::{DeleteEventRequest, handle_param, optional_json, query_param};
use crate::error::AppResult;
use crate::middleware::auth::get_owner_from_depot;
use crate::service_handler::get_service_from_depot;

async fn delete(req: &mut Request, depot: &mut Depot) -> AppResult<()> {
    let owner = get_owner_from_depot(depot)?;
    let handle = handle_param(req)?;
    let query_scope = query_param::<DeleteScope>(req, &["scope", "deleteType"])?;
    let body: DeleteEventRequest = optional_json(req).await?;
    let scope = query_scope.or(body.scope).unwrap_or_default();

    let service = get_service_from_depot(depot)?;
    Ok(service.delete(&owner, handle, scope).await?)
}

/// ## Summary
/// DELETE /api/events/{handle} - Deletes an event, one occurrence
/// (`scope=single`, the default) or a whole series (`scope=series`).
///
/// ## Errors
/// Returns HTTP 400 for malformed input and 404 for an unknown handle.
#[handler]
pub async fn delete_event(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match delete(req, depot).await {
        Ok(()) => {
            res.status_code(StatusCode::NO_CONTENT);
        }
        Err(e) => e.render(res),
    }
}
