//! In-app notifications.
//!
//! ## Summary
//! Mutations and the reminder scan report to a [`Notifier`]. Delivery is
//! best-effort: callers log a failed notification and carry on.

use std::sync::Arc;

use chrono::NaiveDateTime;
use uuid::Uuid;

use almanac_db::db::DbProvider;
use almanac_db::db::enums::NotificationKind;
use almanac_db::db::query::notification;
use almanac_db::model::notification::{NewNotification, Notification};

use crate::error::ServiceError;
use crate::schedule::store::StoreFuture;

/// A notification about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotice {
    pub owner_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Handle string of the event the notice is about.
    pub related_event_id: Option<String>,
    /// Notices sharing a key are not repeated within the dedup window.
    pub dedup_key: Option<String>,
}

impl NewNotice {
    /// ## Summary
    /// Builds the notice sent after a successful mutation.
    #[must_use]
    pub fn for_mutation(
        owner_id: Uuid,
        kind: NotificationKind,
        title: &str,
        related_event_id: Option<String>,
    ) -> Self {
        let verb = match kind {
            NotificationKind::EventCreated => "created",
            NotificationKind::EventUpdated => "updated",
            NotificationKind::EventDeleted => "deleted",
            NotificationKind::EventCompleted => "completed",
            NotificationKind::EventReminder => "coming up",
        };
        Self {
            owner_id,
            kind,
            title: title.to_owned(),
            message: format!("Event \"{title}\" was {verb}."),
            related_event_id,
            dedup_key: None,
        }
    }
}

pub trait Notifier: Send + Sync {
    /// ## Summary
    /// Writes one notification stamped with `now`.
    ///
    /// ## Errors
    /// Returns `NotificationError` if the notification could not be written.
    fn notify<'a>(&'a self, notice: NewNotice, now: NaiveDateTime) -> StoreFuture<'a, ()>;

    /// Returns the newest `limit` notifications of `owner`, optionally only
    /// the read or the unread ones.
    fn recent<'a>(
        &'a self,
        owner: Uuid,
        is_read: Option<bool>,
        limit: i64,
    ) -> StoreFuture<'a, Vec<Notification>>;

    /// Number of unread notifications of `owner`.
    fn unread_count<'a>(&'a self, owner: Uuid) -> StoreFuture<'a, i64>;

    /// Marks one notification read. `None` if `owner` has no notification `id`.
    fn mark_read<'a>(
        &'a self,
        owner: Uuid,
        id: Uuid,
        now: NaiveDateTime,
    ) -> StoreFuture<'a, Option<Notification>>;

    /// Marks every unread notification of `owner` read, returning those.
    fn mark_all_read<'a>(
        &'a self,
        owner: Uuid,
        now: NaiveDateTime,
    ) -> StoreFuture<'a, Vec<Notification>>;

    /// Deletes one notification. `false` if `owner` has no notification `id`.
    fn remove<'a>(&'a self, owner: Uuid, id: Uuid) -> StoreFuture<'a, bool>;

    /// Whether a notification with `dedup_key` was written at or after `since`.
    fn sent_since<'a>(
        &'a self,
        dedup_key: &'a str,
        since: NaiveDateTime,
    ) -> StoreFuture<'a, bool>;
}

/// Writes notifications to the `notification` table.
pub struct PgNotifier {
    provider: Arc<dyn DbProvider>,
}

impl PgNotifier {
    #[must_use]
    pub fn new(provider: Arc<dyn DbProvider>) -> Self {
        Self { provider }
    }
}

impl Notifier for PgNotifier {
    #[tracing::instrument(skip(self, notice), fields(owner_id = %notice.owner_id, kind = %notice.kind))]
    fn notify<'a>(&'a self, notice: NewNotice, now: NaiveDateTime) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let row = NewNotification {
                id: Uuid::now_v7(),
                owner_id: notice.owner_id,
                kind: notice.kind,
                title: notice.title,
                message: notice.message,
                related_event_id: notice.related_event_id,
                dedup_key: notice.dedup_key,
                created_at: now,
            };

            let mut conn = self
                .provider
                .get_connection()
                .await
                .map_err(|e| ServiceError::NotificationError(e.to_string()))?;
            notification::insert(&mut conn, &row)
                .await
                .map_err(|e| ServiceError::NotificationError(e.to_string()))?;

            tracing::debug!(notification_id = %row.id, "Notification written");
            Ok(())
        })
    }

    fn recent<'a>(
        &'a self,
        owner: Uuid,
        is_read: Option<bool>,
        limit: i64,
    ) -> StoreFuture<'a, Vec<Notification>> {
        Box::pin(async move {
            let mut conn = self.provider.get_connection().await?;
            Ok(notification::load_for_owner(&mut conn, owner, is_read, limit).await?)
        })
    }

    fn unread_count<'a>(&'a self, owner: Uuid) -> StoreFuture<'a, i64> {
        Box::pin(async move {
            let mut conn = self.provider.get_connection().await?;
            Ok(notification::count_unread(&mut conn, owner).await?)
        })
    }

    #[tracing::instrument(skip(self))]
    fn mark_read<'a>(
        &'a self,
        owner: Uuid,
        id: Uuid,
        now: NaiveDateTime,
    ) -> StoreFuture<'a, Option<Notification>> {
        Box::pin(async move {
            let mut conn = self.provider.get_connection().await?;
            Ok(notification::mark_read(&mut conn, id, owner, now).await?)
        })
    }

    #[tracing::instrument(skip(self))]
    fn mark_all_read<'a>(
        &'a self,
        owner: Uuid,
        now: NaiveDateTime,
    ) -> StoreFuture<'a, Vec<Notification>> {
        Box::pin(async move {
            let mut conn = self.provider.get_connection().await?;
            let changed = notification::mark_all_read(&mut conn, owner, now).await?;
            tracing::debug!(count = changed.len(), "Notifications marked read");
            Ok(changed)
        })
    }

    #[tracing::instrument(skip(self))]
    fn remove<'a>(&'a self, owner: Uuid, id: Uuid) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let mut conn = self.provider.get_connection().await?;
            Ok(notification::delete_for_owner(&mut conn, id, owner).await? > 0)
        })
    }

    fn sent_since<'a>(
        &'a self,
        dedup_key: &'a str,
        since: NaiveDateTime,
    ) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let mut conn = self.provider.get_connection().await?;
            Ok(notification::exists_since(&mut conn, dedup_key, since).await?)
        })
    }
}
