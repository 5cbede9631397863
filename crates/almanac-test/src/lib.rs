//! Almanac scheduling server - integration test support.
//!
//! Provides an in-memory [`ScheduleStore`] and recording [`Notifier`]s so the
//! service and HTTP layers can be exercised without a database. The store
//! applies a plan to a scratch copy of its state and swaps it in only when
//! every write succeeded, the same all-or-nothing contract the PostgreSQL
//! store gets from its transaction.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use almanac_db::db::enums::EventStatus;
use almanac_db::model::event::Event;
use almanac_db::model::notification::Notification;
use almanac_db::model::series::EventSeries;
use almanac_recur::{DateWindow, ExceptionOverlay};
use almanac_service::error::ServiceError;
use almanac_service::notify::{NewNotice, Notifier};
use almanac_service::schedule::store::window_bounds;
use almanac_service::schedule::{
    ReminderCandidates, ScheduleStore, StoreFuture, WindowSnapshot, WriteOp, WritePlan,
};

/// Locks a mutex and recovers from poisoning.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            mutex.clear_poison();
            poisoned.into_inner()
        }
    }
}

#[derive(Debug, Clone, Default)]
struct State {
    events: BTreeMap<Uuid, Event>,
    series: BTreeMap<Uuid, EventSeries>,
    exceptions: ExceptionOverlay<Uuid>,
}

fn missing(what: &str, id: Uuid) -> ServiceError {
    ServiceError::TransactionFailure(format!("{what} {id} does not exist"))
}

impl State {
    fn apply_op(&mut self, op: &WriteOp, now: NaiveDateTime) -> Result<(), ServiceError> {
        match op {
            WriteOp::InsertSeries(row) => {
                if self.series.insert(row.id, row.clone()).is_some() {
                    return Err(ServiceError::TransactionFailure(format!(
                        "duplicate series {}",
                        row.id
                    )));
                }
            }
            WriteOp::UpdateSeries(row) => {
                let slot = self
                    .series
                    .get_mut(&row.id)
                    .ok_or_else(|| missing("series", row.id))?;
                *slot = row.clone();
            }
            WriteOp::SetSeriesStatus {
                series_id,
                status,
                completed_at,
            } => {
                let slot = self
                    .series
                    .get_mut(series_id)
                    .ok_or_else(|| missing("series", *series_id))?;
                slot.status = *status;
                slot.completed_at = *completed_at;
                slot.updated_at = now;
            }
            WriteOp::DeleteSeries(id) => {
                self.series.remove(id);
                let dates: Vec<NaiveDate> = self.exceptions.dates(id).iter().copied().collect();
                for date in dates {
                    self.exceptions.remove(id, date);
                }
            }
            WriteOp::InsertEvent(row) => {
                if row.end_at <= row.start_at {
                    return Err(ServiceError::TransactionFailure(format!(
                        "event {} violates the time range check",
                        row.id
                    )));
                }
                if self.events.insert(row.id, row.clone()).is_some() {
                    return Err(ServiceError::TransactionFailure(format!(
                        "duplicate event {}",
                        row.id
                    )));
                }
            }
            WriteOp::UpdateEvent(row) => {
                let slot = self
                    .events
                    .get_mut(&row.id)
                    .ok_or_else(|| missing("event", row.id))?;
                *slot = row.clone();
            }
            WriteOp::DeleteEvent(id) => {
                self.events.remove(id);
            }
            WriteOp::AddException { series_id, date } => {
                self.exceptions.add(*series_id, *date);
            }
            WriteOp::RemoveException { series_id, date } => {
                self.exceptions.remove(series_id, *date);
            }
            WriteOp::SetDetachedStatus {
                series_id,
                status,
                completed_at,
            } => {
                for row in self.events.values_mut().filter(|row| {
                    row.is_exception && row.series_id == Some(*series_id) && row.status != *status
                }) {
                    row.status = *status;
                    row.completed_at = *completed_at;
                    row.updated_at = now;
                }
            }
        }
        Ok(())
    }

    fn exceptions_of(&self, series: &[EventSeries]) -> ExceptionOverlay<Uuid> {
        series
            .iter()
            .flat_map(|s| self.exceptions.dates(&s.id).iter().map(move |d| (s.id, *d)))
            .collect()
    }
}

fn overlaps(series: &EventSeries, start: NaiveDate, end: NaiveDate) -> bool {
    series.first_occurrence_date <= end && series.recurrence_end_date.is_none_or(|e| e >= start)
}

/// In-memory [`ScheduleStore`] with optional failure injection.
#[derive(Debug, Default)]
pub struct MemoryScheduleStore {
    state: Mutex<State>,
    fail_next_apply: AtomicBool,
}

impl MemoryScheduleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next non-empty [`ScheduleStore::apply`] fail after all of its
    /// writes were staged, so nothing of the plan may become visible.
    pub fn fail_next_apply(&self) {
        self.fail_next_apply.store(true, Ordering::SeqCst);
    }

    /// Inserts a row directly, bypassing the planner.
    pub fn seed_event(&self, row: Event) {
        lock(&self.state).events.insert(row.id, row);
    }

    /// Inserts a series directly, bypassing the planner.
    pub fn seed_series(&self, row: EventSeries) {
        lock(&self.state).series.insert(row.id, row);
    }

    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        lock(&self.state).events.values().cloned().collect()
    }

    #[must_use]
    pub fn event(&self, id: Uuid) -> Option<Event> {
        lock(&self.state).events.get(&id).cloned()
    }

    #[must_use]
    pub fn series(&self, id: Uuid) -> Option<EventSeries> {
        lock(&self.state).series.get(&id).cloned()
    }

    #[must_use]
    pub fn series_count(&self) -> usize {
        lock(&self.state).series.len()
    }

    #[must_use]
    pub fn exception_dates(&self, series_id: Uuid) -> Vec<NaiveDate> {
        lock(&self.state)
            .exceptions
            .dates(&series_id)
            .iter()
            .copied()
            .collect()
    }
}

impl ScheduleStore for MemoryScheduleStore {
    fn load_window<'a>(
        &'a self,
        owner: Uuid,
        window: DateWindow,
    ) -> StoreFuture<'a, WindowSnapshot> {
        Box::pin(async move {
            let state = lock(&self.state);
            let (from, until) = window_bounds(window);
            let in_window =
                |row: &&Event| row.creator_id == owner && from <= row.start_at && row.start_at < until;

            let standalone = state
                .events
                .values()
                .filter(in_window)
                .filter(|row| row.series_id.is_none() && !row.is_exception)
                .cloned()
                .collect();
            let detached = state
                .events
                .values()
                .filter(in_window)
                .filter(|row| row.is_exception)
                .cloned()
                .collect();
            let mut series: Vec<EventSeries> = state
                .series
                .values()
                .filter(|s| s.creator_id == owner && overlaps(s, window.start, window.end))
                .cloned()
                .collect();
            series.sort_by_key(|s| s.created_at);
            let exceptions = state.exceptions_of(&series);

            Ok(WindowSnapshot {
                standalone,
                detached,
                series,
                exceptions,
            })
        })
    }

    fn find_event<'a>(&'a self, owner: Uuid, id: Uuid) -> StoreFuture<'a, Option<Event>> {
        Box::pin(async move {
            Ok(lock(&self.state)
                .events
                .get(&id)
                .filter(|row| row.creator_id == owner)
                .cloned())
        })
    }

    fn find_series<'a>(&'a self, owner: Uuid, id: Uuid) -> StoreFuture<'a, Option<EventSeries>> {
        Box::pin(async move {
            Ok(lock(&self.state)
                .series
                .get(&id)
                .filter(|row| row.creator_id == owner)
                .cloned())
        })
    }

    fn find_detached<'a>(
        &'a self,
        series_id: Uuid,
        date: NaiveDate,
    ) -> StoreFuture<'a, Option<Event>> {
        Box::pin(async move {
            Ok(lock(&self.state)
                .events
                .values()
                .find(|row| {
                    row.is_exception
                        && row.series_id == Some(series_id)
                        && row.occurrence_date == Some(date)
                })
                .cloned())
        })
    }

    fn apply<'a>(&'a self, plan: &'a WritePlan) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            if plan.is_noop() {
                return Ok(());
            }

            let mut state = lock(&self.state);
            let mut staged = state.clone();
            for op in &plan.ops {
                staged.apply_op(op, plan.now)?;
            }
            if self.fail_next_apply.swap(false, Ordering::SeqCst) {
                tracing::debug!("Injected write failure");
                return Err(ServiceError::TransactionFailure(
                    "injected write failure".to_owned(),
                ));
            }
            *state = staged;
            Ok(())
        })
    }

    fn load_reminder_candidates<'a>(
        &'a self,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> StoreFuture<'a, ReminderCandidates> {
        Box::pin(async move {
            let state = lock(&self.state);
            let events = state
                .events
                .values()
                .filter(|row| {
                    row.status == EventStatus::Pending && from <= row.start_at && row.start_at < until
                })
                .cloned()
                .collect();
            let series: Vec<EventSeries> = state
                .series
                .values()
                .filter(|s| {
                    s.status == EventStatus::Pending && overlaps(s, from.date(), until.date())
                })
                .cloned()
                .collect();
            let exceptions = state.exceptions_of(&series);

            Ok(ReminderCandidates {
                events,
                series,
                exceptions,
            })
        })
    }
}

/// [`Notifier`] keeping every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification written so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        lock(&self.sent).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify<'a>(&'a self, notice: NewNotice, now: NaiveDateTime) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            lock(&self.sent).push(Notification {
                id: Uuid::now_v7(),
                owner_id: notice.owner_id,
                kind: notice.kind,
                title: notice.title,
                message: notice.message,
                related_event_id: notice.related_event_id,
                dedup_key: notice.dedup_key,
                is_read: false,
                read_at: None,
                created_at: now,
            });
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
            let take = usize::try_from(limit).unwrap_or(0);
            Ok(lock(&self.sent)
                .iter()
                .rev()
                .filter(|n| n.owner_id == owner)
                .filter(|n| is_read.is_none_or(|read| n.is_read == read))
                .take(take)
                .cloned()
                .collect())
        })
    }

    fn unread_count<'a>(&'a self, owner: Uuid) -> StoreFuture<'a, i64> {
        Box::pin(async move {
            let unread = lock(&self.sent)
                .iter()
                .filter(|n| n.owner_id == owner && !n.is_read)
                .count();
            Ok(i64::try_from(unread).unwrap_or(i64::MAX))
        })
    }

    fn mark_read<'a>(
        &'a self,
        owner: Uuid,
        id: Uuid,
        now: NaiveDateTime,
    ) -> StoreFuture<'a, Option<Notification>> {
        Box::pin(async move {
            let mut sent = lock(&self.sent);
            let Some(row) = sent.iter_mut().find(|n| n.id == id && n.owner_id == owner) else {
                return Ok(None);
            };
            if !row.is_read {
                row.is_read = true;
                row.read_at = Some(now);
            }
            Ok(Some(row.clone()))
        })
    }

    fn mark_all_read<'a>(
        &'a self,
        owner: Uuid,
        now: NaiveDateTime,
    ) -> StoreFuture<'a, Vec<Notification>> {
        Box::pin(async move {
            let mut changed = Vec::new();
            for row in lock(&self.sent)
                .iter_mut()
                .filter(|n| n.owner_id == owner && !n.is_read)
            {
                row.is_read = true;
                row.read_at = Some(now);
                changed.push(row.clone());
            }
            Ok(changed)
        })
    }

    fn remove<'a>(&'a self, owner: Uuid, id: Uuid) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let mut sent = lock(&self.sent);
            let before = sent.len();
            sent.retain(|n| !(n.id == id && n.owner_id == owner));
            Ok(sent.len() < before)
        })
    }

    fn sent_since<'a>(
        &'a self,
        dedup_key: &'a str,
        since: NaiveDateTime,
    ) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            Ok(lock(&self.sent)
                .iter()
                .any(|n| n.dedup_key.as_deref() == Some(dedup_key) && n.created_at >= since))
        })
    }
}

/// [`Notifier`] whose writes always fail.
#[derive(Debug, Default)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify<'a>(&'a self, _notice: NewNotice, _now: NaiveDateTime) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            Err(ServiceError::NotificationError(
                "notification table unavailable".to_owned(),
            ))
        })
    }

    fn recent<'a>(
        &'a self,
        _owner: Uuid,
        _is_read: Option<bool>,
        _limit: i64,
    ) -> StoreFuture<'a, Vec<Notification>> {
        Box::pin(async move { Ok(Vec::new()) })
    }

    fn unread_count<'a>(&'a self, _owner: Uuid) -> StoreFuture<'a, i64> {
        Box::pin(async move { Ok(0) })
    }

    fn mark_read<'a>(
        &'a self,
        _owner: Uuid,
        _id: Uuid,
        _now: NaiveDateTime,
    ) -> StoreFuture<'a, Option<Notification>> {
        Box::pin(async move { Ok(None) })
    }

    fn mark_all_read<'a>(
        &'a self,
        _owner: Uuid,
        _now: NaiveDateTime,
    ) -> StoreFuture<'a, Vec<Notification>> {
        Box::pin(async move { Ok(Vec::new()) })
    }

    fn remove<'a>(&'a self, _owner: Uuid, _id: Uuid) -> StoreFuture<'a, bool> {
        Box::pin(async move { Ok(false) })
    }

    fn sent_since<'a>(
        &'a self,
        _dedup_key: &'a str,
        _since: NaiveDateTime,
    ) -> StoreFuture<'a, bool> {
        Box::pin(async move { Ok(false) })
    }
}
