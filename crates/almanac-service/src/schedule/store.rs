//! Storage seam of the schedule service.
//!
//! ## Summary
//! The service reads through ownership-filtered lookups and writes whole
//! [`WritePlan`]s. [`PgScheduleStore`](super::pg::PgScheduleStore) is the
//! production implementation; tests swap in an in-memory one.

use std::future::Future;
use std::pin::Pin;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use almanac_db::model::event::Event;
use almanac_db::model::series::EventSeries;
use almanac_recur::{DateWindow, ExceptionOverlay};

use crate::error::ServiceResult;
use crate::schedule::protocol::WritePlan;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = ServiceResult<T>> + Send + 'a>>;

/// Everything of one owner that can appear in a date window.
#[derive(Debug, Clone, Default)]
pub struct WindowSnapshot {
    /// One-off rows not tied to any series.
    pub standalone: Vec<Event>,
    /// Rows replacing an occurrence of a series.
    pub detached: Vec<Event>,
    /// Series that may produce occurrences in the window.
    pub series: Vec<EventSeries>,
    /// Exception dates of `series`.
    pub exceptions: ExceptionOverlay<Uuid>,
}

/// Pending work of every owner that starts soon, for the reminder scan.
#[derive(Debug, Clone, Default)]
pub struct ReminderCandidates {
    /// Pending rows starting in the scanned range.
    pub events: Vec<Event>,
    /// Pending series overlapping the scanned dates.
    pub series: Vec<EventSeries>,
    pub exceptions: ExceptionOverlay<Uuid>,
}

pub trait ScheduleStore: Send + Sync {
    /// ## Summary
    /// Loads the rows and series of `owner` relevant to `window`.
    ///
    /// Rows are selected by start instant: from the first day's midnight up
    /// to, but excluding, midnight after the last day.
    fn load_window<'a>(
        &'a self,
        owner: Uuid,
        window: DateWindow,
    ) -> StoreFuture<'a, WindowSnapshot>;

    /// Loads one row if it exists and belongs to `owner`.
    fn find_event<'a>(&'a self, owner: Uuid, id: Uuid) -> StoreFuture<'a, Option<Event>>;

    /// Loads one series if it exists and belongs to `owner`.
    fn find_series<'a>(&'a self, owner: Uuid, id: Uuid) -> StoreFuture<'a, Option<EventSeries>>;

    /// Loads the detached row replacing the occurrence of `series_id` on `date`.
    fn find_detached<'a>(
        &'a self,
        series_id: Uuid,
        date: NaiveDate,
    ) -> StoreFuture<'a, Option<Event>>;

    /// ## Summary
    /// Commits every write of `plan`, or none of them.
    ///
    /// ## Errors
    /// Any failure rolls the plan back and surfaces as `TransactionFailure`.
    fn apply<'a>(&'a self, plan: &'a WritePlan) -> StoreFuture<'a, ()>;

    /// Loads pending rows starting in `[from, until)` and pending series that
    /// may have occurrences between the two dates, across all owners.
    fn load_reminder_candidates<'a>(
        &'a self,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> StoreFuture<'a, ReminderCandidates>;
}

/// The `[from, until)` instants covering every day of `window`.
#[must_use]
pub fn window_bounds(window: DateWindow) -> (NaiveDateTime, NaiveDateTime) {
    let from = window.start.and_time(chrono::NaiveTime::MIN);
    let until = window
        .end
        .succ_opt()
        .unwrap_or(NaiveDate::MAX)
        .and_time(chrono::NaiveTime::MIN);
    (from, until)
}
