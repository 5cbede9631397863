//! Query composition for `event_exception`.

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::event_exception;
use crate::model::exception::{EventException, NewEventException};

/// ## Summary
/// Returns a query for the exceptions of the given series.
#[must_use]
pub fn for_series(series_ids: &[Uuid]) -> event_exception::BoxedQuery<'static, diesel::pg::Pg> {
    event_exception::table
        .filter(event_exception::series_id.eq_any(series_ids.to_vec()))
        .order((
            event_exception::series_id.asc(),
            event_exception::exception_date.asc(),
        ))
        .into_boxed()
}

/// ## Summary
/// Loads the exceptions of the given series.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn load_for_series(
    conn: &mut DbConnection<'_>,
    series_ids: &[Uuid],
) -> QueryResult<Vec<EventException>> {
    if series_ids.is_empty() {
        return Ok(Vec::new());
    }
    for_series(series_ids).load::<EventException>(conn).await
}

/// ## Summary
/// Records an exception, doing nothing if the same date is already excluded.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert_ignore(
    conn: &mut DbConnection<'_>,
    exception: &NewEventException,
) -> QueryResult<()> {
    diesel::insert_into(event_exception::table)
        .values(exception)
        .on_conflict((event_exception::series_id, event_exception::exception_date))
        .do_nothing()
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Removes an exception, restoring the date to its series.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete(
    conn: &mut DbConnection<'_>,
    series_id: Uuid,
    date: NaiveDate,
) -> QueryResult<usize> {
    diesel::delete(
        event_exception::table
            .filter(event_exception::series_id.eq(series_id))
            .filter(event_exception::exception_date.eq(date)),
    )
    .execute(conn)
    .await
}
