//! Query composition for `event`.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::enums::EventStatus;
use crate::db::schema::event;
use crate::model::event::Event;

/// ## Summary
/// Returns a query to select all event rows.
#[must_use]
pub fn all() -> event::BoxedQuery<'static, diesel::pg::Pg> {
    event::table.into_boxed()
}

/// ## Summary
/// Returns a query for one event row, visible only to its creator.
#[must_use]
pub fn by_id_for_owner(id: Uuid, owner: Uuid) -> event::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(event::id.eq(id))
        .filter(event::creator_id.eq(owner))
}

/// ## Summary
/// Returns a query for rows of `owner` starting in `[from, until)`.
#[must_use]
pub fn starting_between(
    owner: Uuid,
    from: NaiveDateTime,
    until: NaiveDateTime,
) -> event::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(event::creator_id.eq(owner))
        .filter(event::start_at.ge(from))
        .filter(event::start_at.lt(until))
}

/// ## Summary
/// Returns a query for one-off rows that do not belong to any series.
#[must_use]
pub fn standalone_between(
    owner: Uuid,
    from: NaiveDateTime,
    until: NaiveDateTime,
) -> event::BoxedQuery<'static, diesel::pg::Pg> {
    starting_between(owner, from, until)
        .filter(event::series_id.is_null())
        .filter(event::is_exception.eq(false))
}

/// ## Summary
/// Returns a query for detached occurrence rows.
#[must_use]
pub fn detached_between(
    owner: Uuid,
    from: NaiveDateTime,
    until: NaiveDateTime,
) -> event::BoxedQuery<'static, diesel::pg::Pg> {
    starting_between(owner, from, until).filter(event::is_exception.eq(true))
}

/// ## Summary
/// Returns a query for the detached rows of one series.
#[must_use]
pub fn detached_of_series(series_id: Uuid) -> event::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(event::series_id.eq(series_id))
        .filter(event::is_exception.eq(true))
}

/// ## Summary
/// Returns a query for the detached row replacing one occurrence.
#[must_use]
pub fn detached_for_occurrence(
    series_id: Uuid,
    date: NaiveDate,
) -> event::BoxedQuery<'static, diesel::pg::Pg> {
    detached_of_series(series_id).filter(event::occurrence_date.eq(date))
}

/// ## Summary
/// Loads one owned event row.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find_for_owner(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    owner: Uuid,
) -> QueryResult<Option<Event>> {
    by_id_for_owner(id, owner).first::<Event>(conn).await.optional()
}

/// ## Summary
/// Loads the detached row replacing an occurrence, if there is one.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn find_detached(
    conn: &mut DbConnection<'_>,
    series_id: Uuid,
    date: NaiveDate,
) -> QueryResult<Option<Event>> {
    detached_for_occurrence(series_id, date)
        .order(event::created_at.desc())
        .first::<Event>(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads the owner's one-off rows starting in `[from, until)`.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn load_standalone_between(
    conn: &mut DbConnection<'_>,
    owner: Uuid,
    from: NaiveDateTime,
    until: NaiveDateTime,
) -> QueryResult<Vec<Event>> {
    standalone_between(owner, from, until)
        .order(event::start_at.asc())
        .load::<Event>(conn)
        .await
}

/// ## Summary
/// Loads the owner's detached rows starting in `[from, until)`.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn load_detached_between(
    conn: &mut DbConnection<'_>,
    owner: Uuid,
    from: NaiveDateTime,
    until: NaiveDateTime,
) -> QueryResult<Vec<Event>> {
    detached_between(owner, from, until)
        .order(event::start_at.asc())
        .load::<Event>(conn)
        .await
}

/// ## Summary
/// Loads pending rows of every owner starting in `[from, until)`.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn load_pending_starting_between(
    conn: &mut DbConnection<'_>,
    from: NaiveDateTime,
    until: NaiveDateTime,
) -> QueryResult<Vec<Event>> {
    all()
        .filter(event::status.eq(EventStatus::Pending))
        .filter(event::start_at.ge(from))
        .filter(event::start_at.lt(until))
        .load::<Event>(conn)
        .await
}

/// ## Summary
/// Inserts an event row.
///
/// ## Errors
/// Returns an error if the database operation fails, including a violated
/// time range CHECK.
pub async fn insert(conn: &mut DbConnection<'_>, row: &Event) -> QueryResult<()> {
    diesel::insert_into(event::table)
        .values(row)
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Overwrites every non-key column of an event row.
///
/// ## Errors
/// Returns an error if the database operation fails or the row is gone.
pub async fn update(conn: &mut DbConnection<'_>, row: &Event) -> QueryResult<()> {
    let updated = diesel::update(event::table.find(row.id))
        .set(row)
        .execute(conn)
        .await?;
    if updated == 0 {
        return Err(diesel::result::Error::NotFound);
    }
    Ok(())
}

/// ## Summary
/// Deletes an event row.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<usize> {
    diesel::delete(event::table.find(id)).execute(conn).await
}

/// ## Summary
/// Moves every detached row of a series that is not already in `status`
/// to `status`.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn set_detached_status(
    conn: &mut DbConnection<'_>,
    series_id: Uuid,
    status: EventStatus,
    completed_at: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> QueryResult<usize> {
    diesel::update(
        event::table
            .filter(event::series_id.eq(series_id))
            .filter(event::is_exception.eq(true))
            .filter(event::status.ne(status)),
    )
    .set((
        event::status.eq(status),
        event::completed_at.eq(completed_at),
        event::updated_at.eq(now),
    ))
    .execute(conn)
    .await
}
