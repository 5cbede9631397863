//! Occurrence expansion for a single series.
//!
//! ## Summary
//! Walks a series' rule from its first occurrence, skips ahead to the query
//! window without emitting, then yields every non-excluded occurrence inside
//! the window. Exceptions suppress output but never iteration, so the cursor
//! stays aligned with the rule.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::rule::RecurrenceRule;

/// The recurrence-relevant part of a stored series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRule {
    pub rule: RecurrenceRule,
    pub first_occurrence: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Days between an occurrence's start date and its end date.
    pub duration_days: u32,
    /// Last date an occurrence may fall on; `None` means unbounded.
    pub until: Option<NaiveDate>,
}

impl SeriesRule {
    /// Builds the concrete occurrence that starts on `date`.
    #[must_use]
    pub fn occurrence_on(&self, date: NaiveDate) -> Occurrence {
        let end_date = date
            .checked_add_days(Days::new(u64::from(self.duration_days)))
            .unwrap_or(NaiveDate::MAX);
        Occurrence {
            date,
            start_at: date.and_time(self.start_time),
            end_at: end_date.and_time(self.end_time),
        }
    }
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of days covered, counting both ends. Zero for an inverted window.
    #[must_use]
    pub fn span_days(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(0)
    }
}

/// One materialized occurrence of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub date: NaiveDate,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
}

/// Lazy iterator over the occurrences of a series inside a window.
#[derive(Debug)]
pub struct Occurrences<'a> {
    series: &'a SeriesRule,
    exceptions: &'a BTreeSet<NaiveDate>,
    cursor: Option<NaiveDate>,
    last: NaiveDate,
}

impl<'a> Occurrences<'a> {
    /// ## Summary
    /// Positions the cursor on the first rule date at or after the window start.
    /// Skipping stops as soon as the cursor passes the last date that could be
    /// emitted.
    ///
    /// Unbounded series stop at `window.end + horizon_days`; since iteration
    /// also stops at the window end, the horizon only matters for callers that
    /// widen the window.
    #[must_use]
    pub fn new(
        series: &'a SeriesRule,
        window: DateWindow,
        exceptions: &'a BTreeSet<NaiveDate>,
        horizon_days: u32,
    ) -> Self {
        let bound = series.until.unwrap_or_else(|| {
            window
                .end
                .checked_add_days(Days::new(u64::from(horizon_days)))
                .unwrap_or(NaiveDate::MAX)
        });
        let last = window.end.min(bound);

        let mut cursor = Some(series.first_occurrence);
        while let Some(current) = cursor {
            if current > last {
                cursor = None;
                break;
            }
            if current >= window.start {
                break;
            }
            cursor = series.rule.skip_toward(current, window.start).ok();
        }

        Self {
            series,
            exceptions,
            cursor,
            last,
        }
    }
}

impl Iterator for Occurrences<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = self.cursor?;
            if current > self.last {
                self.cursor = None;
                return None;
            }
            self.cursor = self.series.rule.next_after(current).ok();
            if self.exceptions.contains(&current) {
                tracing::trace!(date = %current, "Occurrence suppressed by exception");
                continue;
            }
            return Some(self.series.occurrence_on(current));
        }
    }
}

/// ## Summary
/// Expands a series into the ordered occurrences intersecting `window`,
/// skipping dates present in `exceptions`.
#[must_use]
pub fn expand(
    series: &SeriesRule,
    window: DateWindow,
    exceptions: &BTreeSet<NaiveDate>,
    horizon_days: u32,
) -> Vec<Occurrence> {
    Occurrences::new(series, window, exceptions, horizon_days).collect()
}
