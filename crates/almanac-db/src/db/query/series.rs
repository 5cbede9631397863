//! Query composition for `event_series`.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::enums::EventStatus;
use crate::db::schema::event_series;
use crate::model::series::EventSeries;

/// ## Summary
/// Returns a query to select all series.
#[must_use]
pub fn all() -> event_series::BoxedQuery<'static, diesel::pg::Pg> {
    event_series::table.into_boxed()
}

/// ## Summary
/// Returns a query for the series created by `owner`.
#[must_use]
pub fn by_owner(owner: Uuid) -> event_series::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(event_series::creator_id.eq(owner))
}

/// ## Summary
/// Returns a query for one series, visible only to its creator.
#[must_use]
pub fn by_id_for_owner(id: Uuid, owner: Uuid) -> event_series::BoxedQuery<'static, diesel::pg::Pg> {
    by_owner(owner).filter(event_series::id.eq(id))
}

/// ## Summary
/// Returns a query for series that may produce occurrences between `start`
/// and `end` (inclusive): not ended before the window and not starting
/// after it.
#[must_use]
pub fn overlapping(
    start: NaiveDate,
    end: NaiveDate,
) -> event_series::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(event_series::first_occurrence_date.le(end))
        .filter(
            event_series::recurrence_end_date
                .is_null()
                .or(event_series::recurrence_end_date.ge(start)),
        )
}

/// ## Summary
/// Returns [`overlapping`] restricted to one owner, in creation order.
#[must_use]
pub fn overlapping_for_owner(
    owner: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> event_series::BoxedQuery<'static, diesel::pg::Pg> {
    overlapping(start, end)
        .filter(event_series::creator_id.eq(owner))
        .order(event_series::created_at.asc())
}

/// ## Summary
/// Loads one owned series.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find_for_owner(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    owner: Uuid,
) -> QueryResult<Option<EventSeries>> {
    by_id_for_owner(id, owner)
        .first::<EventSeries>(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads the owner's series overlapping a date window.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn load_overlapping_for_owner(
    conn: &mut DbConnection<'_>,
    owner: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> QueryResult<Vec<EventSeries>> {
    overlapping_for_owner(owner, start, end)
        .load::<EventSeries>(conn)
        .await
}

/// ## Summary
/// Loads pending series of every owner overlapping a date window.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn load_pending_overlapping(
    conn: &mut DbConnection<'_>,
    start: NaiveDate,
    end: NaiveDate,
) -> QueryResult<Vec<EventSeries>> {
    overlapping(start, end)
        .filter(event_series::status.eq(EventStatus::Pending))
        .load::<EventSeries>(conn)
        .await
}

/// ## Summary
/// Inserts a series row.
///
/// ## Errors
/// Returns an error if the database operation fails, including CHECK
/// violations on the interval or duration.
pub async fn insert(conn: &mut DbConnection<'_>, series: &EventSeries) -> QueryResult<()> {
    diesel::insert_into(event_series::table)
        .values(series)
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Overwrites every non-key column of a series row.
///
/// ## Errors
/// Returns an error if the database operation fails or the row is gone.
pub async fn update(conn: &mut DbConnection<'_>, series: &EventSeries) -> QueryResult<()> {
    let updated = diesel::update(event_series::table.find(series.id))
        .set(series)
        .execute(conn)
        .await?;
    if updated == 0 {
        return Err(diesel::result::Error::NotFound);
    }
    Ok(())
}

/// ## Summary
/// Sets the whole-series completion state.
///
/// ## Errors
/// Returns an error if the database operation fails or the row is gone.
pub async fn set_status(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    status: EventStatus,
    completed_at: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> QueryResult<()> {
    let updated = diesel::update(event_series::table.find(id))
        .set((
            event_series::status.eq(status),
            event_series::completed_at.eq(completed_at),
            event_series::updated_at.eq(now),
        ))
        .execute(conn)
        .await?;
    if updated == 0 {
        return Err(diesel::result::Error::NotFound);
    }
    Ok(())
}

/// ## Summary
/// Deletes a series. Its exceptions go with it by cascade; detached event
/// rows are left alone.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<usize> {
    diesel::delete(event_series::table.find(id))
        .execute(conn)
        .await
}
