//! Event routes.
//!
//! `{handle}` is either a bare UUID naming a stored row or the
//! `series-{uuid}-{epochMillis}` form naming one occurrence of a series.

use salvo::Router;

use almanac_core::constants::EVENTS_ROUTE_COMPONENT;

use super::respond;

mod complete;
mod create;
mod delete;
mod get;
mod list;
mod types;
mod update;

#[must_use]
pub fn routes() -> Router {
    Router::with_path(EVENTS_ROUTE_COMPONENT)
        .get(list::list_events)
        .post(create::create_event)
        .push(
            Router::with_path("{handle}")
                .get(get::get_event)
                .put(update::update_event)
                .delete(delete::delete_event)
                .push(Router::with_path("complete").post(complete::complete_event))
                .push(Router::with_path("uncomplete").post(complete::uncomplete_event)),
        )
}
