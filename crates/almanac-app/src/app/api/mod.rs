mod app_specific;
mod events;
mod notifications;

use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Response, Router};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthMiddleware;

pub use almanac_core::constants::{
    API_ROUTE_COMPONENT, API_ROUTE_PREFIX, EVENTS_ROUTE_PREFIX, NOTIFICATIONS_ROUTE_PREFIX,
};

/// Renders `result` as JSON with `status`, or as the mapped error response.
fn respond<T: Serialize + Send>(res: &mut Response, status: StatusCode, result: AppResult<T>) {
    match result {
        Ok(body) => {
            res.status_code(status);
            res.render(Json(body));
        }
        Err(e) => e.render(res),
    }
}

/// ## Summary
/// Constructs the API router with every event and notification handler.
///
/// ## Errors
/// Returns an error if any child route handler fails to initialize.
pub fn routes() -> anyhow::Result<Router> {
    Ok(Router::with_path(API_ROUTE_COMPONENT)
        .push(app_specific::routes())
        .push(
            Router::new()
                .hoop(AuthMiddleware)
                .push(events::routes())
                .push(notifications::routes()),
        ))
}
