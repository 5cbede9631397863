//! Schedule operations on behalf of one owner.
//!
//! ## Summary
//! Resolves handles to owned records, plans the mutation, commits the plan
//! through the store and reports it to the notifier. Records of other owners
//! are indistinguishable from missing ones.

use std::sync::Arc;

use chrono::NaiveDateTime;
use uuid::Uuid;

use almanac_core::constants::DEFAULT_MAX_QUERY_WINDOW_DAYS;
use almanac_core::types::Owner;
use almanac_db::db::enums::NotificationKind;
use almanac_db::model::notification::Notification;
use almanac_recur::{DateWindow, EventHandle};

use crate::error::{ServiceError, ServiceResult};
use crate::notify::{NewNotice, Notifier};
use crate::schedule::assemble::EventQueryAssembler;
use crate::schedule::protocol::{
    Target, WritePlan, plan_complete, plan_create, plan_delete, plan_uncomplete, plan_update,
};
use crate::schedule::request::{DeleteScope, NewEvent, OccurrenceScope, SeriesPatch};
use crate::schedule::store::ScheduleStore;
use crate::schedule::view::EventView;

/// Wall-clock time as a naive local timestamp.
#[must_use]
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn not_found(handle: EventHandle) -> ServiceError {
    ServiceError::NotFound(format!("event {handle}"))
}

pub struct ScheduleService {
    store: Arc<dyn ScheduleStore>,
    notifier: Arc<dyn Notifier>,
    assembler: EventQueryAssembler,
    max_window_days: u32,
}

impl ScheduleService {
    #[must_use]
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        notifier: Arc<dyn Notifier>,
        horizon_days: u32,
    ) -> Self {
        Self {
            store,
            notifier,
            assembler: EventQueryAssembler::new(horizon_days),
            max_window_days: DEFAULT_MAX_QUERY_WINDOW_DAYS,
        }
    }

    /// Sets the longest window, in days, that [`ScheduleService::list`] accepts.
    #[must_use]
    pub const fn with_max_window_days(mut self, days: u32) -> Self {
        self.max_window_days = days;
        self
    }

    /// ## Summary
    /// Lists the owner's events whose start date lies in `window`, ordered by
    /// start instant.
    ///
    /// ## Errors
    /// `ValidationError` if the window ends before it starts or spans more
    /// than the configured limit; storage errors otherwise.
    #[tracing::instrument(skip(self), fields(owner = %owner))]
    pub async fn list(&self, owner: &Owner, window: DateWindow) -> ServiceResult<Vec<EventView>> {
        if window.end < window.start {
            return Err(ServiceError::ValidationError(format!(
                "window ends on {} before it starts on {}",
                window.end, window.start
            )));
        }
        if window.span_days() > i64::from(self.max_window_days) {
            return Err(ServiceError::ValidationError(format!(
                "window spans {} days, the limit is {}",
                window.span_days(),
                self.max_window_days
            )));
        }

        let snapshot = self.store.load_window(owner.id, window).await?;
        let views = self.assembler.assemble(&snapshot, window)?;

        tracing::debug!(count = views.len(), "Events listed");
        Ok(views)
    }

    /// ## Summary
    /// Returns one event. An occurrence shows the completion state of the
    /// row that replaced it, if any.
    ///
    /// ## Errors
    /// `NotFound` if the handle does not name an owned event, or names a date
    /// the series rule does not produce.
    #[tracing::instrument(skip(self), fields(owner = %owner, %handle))]
    pub async fn get(&self, owner: &Owner, handle: EventHandle) -> ServiceResult<EventView> {
        match self.resolve(owner, handle).await? {
            Target::Standalone { row, .. } => Ok(EventView::from_event(&row)),
            Target::Occurrence {
                series,
                date,
                detached,
            } => {
                let view = self
                    .assembler
                    .occurrence_view(&series, date)?
                    .ok_or_else(|| not_found(handle))?;
                Ok(match detached {
                    Some(row) => view.with_override(&row),
                    None => view,
                })
            }
        }
    }

    /// ## Summary
    /// Creates a standalone event, or a series when `input` carries
    /// recurrence settings.
    ///
    /// ## Errors
    /// `InvalidTimeRange`, `InvalidRecurrenceRule` or `ValidationError` for
    /// bad input; `TransactionFailure` if the write fails.
    #[tracing::instrument(skip(self, input), fields(owner = %owner, recurring = input.recurrence.is_some()))]
    pub async fn create(&self, owner: &Owner, input: NewEvent) -> ServiceResult<EventView> {
        let plan = plan_create(owner, &input, local_now())?;
        self.commit(owner, &plan, NotificationKind::EventCreated, None)
            .await?;
        self.subject_view(owner, &plan).await
    }

    /// ## Summary
    /// Applies a partial update to a row, one occurrence or a whole series.
    ///
    /// ## Errors
    /// `NotFound` for an unknown handle; validation errors before any write;
    /// `TransactionFailure` if the write fails.
    #[tracing::instrument(skip(self, patch), fields(owner = %owner, %handle, ?scope))]
    pub async fn update(
        &self,
        owner: &Owner,
        handle: EventHandle,
        scope: OccurrenceScope,
        patch: SeriesPatch,
    ) -> ServiceResult<EventView> {
        let target = self.resolve(owner, handle).await?;
        let plan = plan_update(&target, scope, &patch, local_now())?;
        self.commit(owner, &plan, NotificationKind::EventUpdated, None)
            .await?;
        self.subject_view(owner, &plan).await
    }

    /// ## Summary
    /// Deletes a row, one occurrence or a whole series.
    ///
    /// ## Errors
    /// `NotFound` for an unknown handle; `TransactionFailure` if the write
    /// fails.
    #[tracing::instrument(skip(self), fields(owner = %owner, %handle, ?scope))]
    pub async fn delete(
        &self,
        owner: &Owner,
        handle: EventHandle,
        scope: DeleteScope,
    ) -> ServiceResult<()> {
        let target = self.resolve(owner, handle).await?;
        let plan = plan_delete(&target, scope, local_now());
        self.commit(
            owner,
            &plan,
            NotificationKind::EventDeleted,
            Some(handle.to_string()),
        )
        .await
    }

    /// ## Summary
    /// Marks a row, one occurrence or a whole series as done.
    ///
    /// ## Errors
    /// `NotFound` for an unknown handle; `TransactionFailure` if the write
    /// fails.
    #[tracing::instrument(skip(self), fields(owner = %owner, %handle, ?scope))]
    pub async fn complete(
        &self,
        owner: &Owner,
        handle: EventHandle,
        scope: OccurrenceScope,
    ) -> ServiceResult<EventView> {
        let target = self.resolve(owner, handle).await?;
        let plan = plan_complete(&target, scope, local_now())?;
        self.commit(owner, &plan, NotificationKind::EventCompleted, None)
            .await?;
        self.subject_view(owner, &plan).await
    }

    /// ## Summary
    /// Reverts a completion. Calling it on something that is not completed
    /// changes nothing.
    ///
    /// ## Errors
    /// `NotFound` for an unknown handle; `TransactionFailure` if the write
    /// fails.
    #[tracing::instrument(skip(self), fields(owner = %owner, %handle))]
    pub async fn uncomplete(&self, owner: &Owner, handle: EventHandle) -> ServiceResult<EventView> {
        let target = self.resolve(owner, handle).await?;
        let plan = plan_uncomplete(&target, local_now());
        self.commit(owner, &plan, NotificationKind::EventUpdated, None)
            .await?;
        self.subject_view(owner, &plan).await
    }

    /// ## Summary
    /// Returns the owner's newest notifications, optionally only the read or
    /// the unread ones.
    ///
    /// ## Errors
    /// Returns an error if the notifications cannot be read.
    pub async fn notifications(
        &self,
        owner: &Owner,
        is_read: Option<bool>,
        limit: i64,
    ) -> ServiceResult<Vec<Notification>> {
        self.notifier.recent(owner.id, is_read, limit).await
    }

    /// ## Errors
    /// Returns an error if the notifications cannot be read.
    pub async fn unread_notification_count(&self, owner: &Owner) -> ServiceResult<i64> {
        self.notifier.unread_count(owner.id).await
    }

    /// ## Summary
    /// Marks one notification read. Marking it again keeps the first read
    /// time.
    ///
    /// ## Errors
    /// `NotFound` if the owner has no such notification.
    #[tracing::instrument(skip(self), fields(owner = %owner))]
    pub async fn mark_notification_read(
        &self,
        owner: &Owner,
        id: Uuid,
    ) -> ServiceResult<Notification> {
        self.notifier
            .mark_read(owner.id, id, local_now())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("notification {id}")))
    }

    /// ## Summary
    /// Marks every unread notification of the owner read and returns them.
    ///
    /// ## Errors
    /// Returns an error if the notifications cannot be written.
    #[tracing::instrument(skip(self), fields(owner = %owner))]
    pub async fn mark_all_notifications_read(
        &self,
        owner: &Owner,
    ) -> ServiceResult<Vec<Notification>> {
        self.notifier.mark_all_read(owner.id, local_now()).await
    }

    /// ## Errors
    /// `NotFound` if the owner has no such notification.
    #[tracing::instrument(skip(self), fields(owner = %owner))]
    pub async fn delete_notification(&self, owner: &Owner, id: Uuid) -> ServiceResult<()> {
        if self.notifier.remove(owner.id, id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!("notification {id}")))
        }
    }

    /// ## Summary
    /// Loads the owned records behind `handle`.
    ///
    /// A row whose series is gone or belongs to someone else resolves
    /// without its series. An occurrence handle must name a date the rule
    /// produces.
    async fn resolve(&self, owner: &Owner, handle: EventHandle) -> ServiceResult<Target> {
        match handle {
            EventHandle::Standalone { id } => {
                let row = self
                    .store
                    .find_event(owner.id, id)
                    .await?
                    .ok_or_else(|| not_found(handle))?;
                let series = match row.series_id {
                    Some(series_id) => self.store.find_series(owner.id, series_id).await?,
                    None => None,
                };
                Ok(Target::Standalone { row, series })
            }
            EventHandle::Occurrence {
                series_id,
                occurrence_date,
            } => {
                let series = self
                    .store
                    .find_series(owner.id, series_id)
                    .await?
                    .ok_or_else(|| not_found(handle))?;
                if self
                    .assembler
                    .occurrence_view(&series, occurrence_date)?
                    .is_none()
                {
                    tracing::debug!(%series_id, %occurrence_date, "Date is not on the series rule");
                    return Err(not_found(handle));
                }
                let detached = self.store.find_detached(series_id, occurrence_date).await?;
                Ok(Target::Occurrence {
                    series,
                    date: occurrence_date,
                    detached,
                })
            }
        }
    }

    async fn subject_view(&self, owner: &Owner, plan: &WritePlan) -> ServiceResult<EventView> {
        let handle = plan.subject.ok_or_else(|| {
            ServiceError::NotFound("the event no longer exists".to_owned())
        })?;
        self.get(owner, handle).await
    }

    /// Commits `plan` and, if it changed anything, notifies the owner.
    /// A failed notification does not fail the mutation.
    async fn commit(
        &self,
        owner: &Owner,
        plan: &WritePlan,
        kind: NotificationKind,
        related: Option<String>,
    ) -> ServiceResult<()> {
        self.store.apply(plan).await?;
        if plan.is_noop() {
            return Ok(());
        }

        let related = related.or_else(|| plan.subject.map(|h| h.to_string()));
        let notice = NewNotice::for_mutation(owner.id, kind, &plan.title, related);
        if let Err(e) = self.notifier.notify(notice, plan.now).await {
            tracing::warn!(error = %e, %kind, "Notification failed after commit");
        }
        Ok(())
    }
}

