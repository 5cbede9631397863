//! Query composition for `notification`.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::notification;
use crate::model::notification::{NewNotification, Notification};

/// ## Summary
/// Returns a query for an owner's notifications, newest first, optionally
/// restricted to read or unread ones.
#[must_use]
pub fn for_owner(
    owner: Uuid,
    is_read: Option<bool>,
) -> notification::BoxedQuery<'static, diesel::pg::Pg> {
    let mut query = notification::table
        .filter(notification::owner_id.eq(owner))
        .order(notification::created_at.desc())
        .into_boxed();
    if let Some(is_read) = is_read {
        query = query.filter(notification::is_read.eq(is_read));
    }
    query
}

/// ## Summary
/// Returns a query for one notification of `owner`.
#[must_use]
pub fn by_id_for_owner(id: Uuid, owner: Uuid) -> notification::BoxedQuery<'static, diesel::pg::Pg> {
    notification::table
        .filter(notification::id.eq(id))
        .filter(notification::owner_id.eq(owner))
        .into_boxed()
}

/// ## Summary
/// Loads up to `limit` of an owner's notifications, newest first.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn load_for_owner(
    conn: &mut DbConnection<'_>,
    owner: Uuid,
    is_read: Option<bool>,
    limit: i64,
) -> QueryResult<Vec<Notification>> {
    for_owner(owner, is_read)
        .limit(limit)
        .load::<Notification>(conn)
        .await
}

/// ## Summary
/// Counts an owner's unread notifications.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn count_unread(conn: &mut DbConnection<'_>, owner: Uuid) -> QueryResult<i64> {
    notification::table
        .filter(notification::owner_id.eq(owner))
        .filter(notification::is_read.eq(false))
        .count()
        .get_result::<i64>(conn)
        .await
}

/// ## Summary
/// Marks one notification read and returns it, or `None` if the owner has no
/// such notification. Marking it again keeps the first `read_at`.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn mark_read(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    owner: Uuid,
    now: NaiveDateTime,
) -> QueryResult<Option<Notification>> {
    diesel::update(
        notification::table
            .filter(notification::id.eq(id))
            .filter(notification::owner_id.eq(owner))
            .filter(notification::is_read.eq(false)),
    )
    .set((
        notification::is_read.eq(true),
        notification::read_at.eq(Some(now)),
    ))
    .execute(conn)
    .await?;

    by_id_for_owner(id, owner)
        .first::<Notification>(conn)
        .await
        .optional()
}

/// ## Summary
/// Marks every unread notification of `owner` read and returns the ones that
/// changed.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn mark_all_read(
    conn: &mut DbConnection<'_>,
    owner: Uuid,
    now: NaiveDateTime,
) -> QueryResult<Vec<Notification>> {
    diesel::update(
        notification::table
            .filter(notification::owner_id.eq(owner))
            .filter(notification::is_read.eq(false)),
    )
    .set((
        notification::is_read.eq(true),
        notification::read_at.eq(Some(now)),
    ))
    .returning(Notification::as_returning())
    .get_results(conn)
    .await
}

/// ## Summary
/// Deletes one notification of `owner`, returning the number of rows removed.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete_for_owner(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    owner: Uuid,
) -> QueryResult<usize> {
    diesel::delete(
        notification::table
            .filter(notification::id.eq(id))
            .filter(notification::owner_id.eq(owner)),
    )
    .execute(conn)
    .await
}

/// ## Summary
/// Inserts a notification.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert(conn: &mut DbConnection<'_>, row: &NewNotification) -> QueryResult<()> {
    diesel::insert_into(notification::table)
        .values(row)
        .execute(conn)
        .await?;
    Ok(())
}

/// ## Summary
/// Whether a notification with `dedup_key` was written at or after `since`.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn exists_since(
    conn: &mut DbConnection<'_>,
    dedup_key: &str,
    since: NaiveDateTime,
) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        notification::table
            .filter(notification::dedup_key.eq(dedup_key))
            .filter(notification::created_at.ge(since)),
    ))
    .get_result::<bool>(conn)
    .await
}
