use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};

use almanac_service::schedule::{EventView, NewEvent};

use super::respond;
use super::types::{CreateEventRequest, required_json};
use crate::error::AppResult;
use crate::middleware::auth::get_owner_from_depot;
use crate::service_handler::get_service_from_depot;

async fn create(req: &mut Request, depot: &mut Depot) -> AppResult<EventView> {
    let owner = get_owner_from_depot(depot)?;
    let body: CreateEventRequest = required_json(req).await?;
    let service = get_service_from_depot(depot)?;
    Ok(service.create(&owner, NewEvent::from(body)).await?)
}

/// ## Summary
/// POST /api/events - Creates a single event, or a series when the body sets
/// `isRecurring`.
///
/// ## Side Effects
/// Writes the event or series and an `EVENT_CREATED` notification.
///
/// ## Errors
/// Returns HTTP 400 for a malformed body, an inverted time range or an
/// invalid recurrence rule.
#[handler]
pub async fn create_event(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = create(req, depot).await;
    respond(res, StatusCode::CREATED, result);
}
