//! Per-series exception dates.
//!
//! ## Summary
//! An exception suppresses the virtual occurrence of one series on one
//! calendar date. Lookups compare calendar dates only; anything carrying a
//! time of day is normalized through [`CalendarDay`] first.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use chrono::{NaiveDate, NaiveDateTime};

static NO_EXCEPTIONS: BTreeSet<NaiveDate> = BTreeSet::new();

/// A value that falls on a single calendar date.
pub trait CalendarDay {
    fn calendar_day(&self) -> NaiveDate;
}

impl CalendarDay for NaiveDate {
    fn calendar_day(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDay for NaiveDateTime {
    fn calendar_day(&self) -> NaiveDate {
        self.date()
    }
}

/// Exception dates grouped by series.
#[derive(Debug, Clone)]
pub struct ExceptionOverlay<K> {
    by_series: HashMap<K, BTreeSet<NaiveDate>>,
}

impl<K> Default for ExceptionOverlay<K> {
    fn default() -> Self {
        Self {
            by_series: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> ExceptionOverlay<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Records an exception. Adding an existing exception is a no-op.
    ///
    /// Returns `true` if the exception was not present before.
    pub fn add(&mut self, series: K, day: impl CalendarDay) -> bool {
        self.by_series
            .entry(series)
            .or_default()
            .insert(day.calendar_day())
    }

    /// ## Summary
    /// Removes an exception, restoring the date to the series. Removing an
    /// absent exception is a no-op.
    ///
    /// Returns `true` if an exception was removed.
    pub fn remove(&mut self, series: &K, day: impl CalendarDay) -> bool {
        let Some(dates) = self.by_series.get_mut(series) else {
            return false;
        };
        let removed = dates.remove(&day.calendar_day());
        if dates.is_empty() {
            self.by_series.remove(series);
        }
        removed
    }

    #[must_use]
    pub fn is_excluded(&self, series: &K, day: impl CalendarDay) -> bool {
        self.by_series
            .get(series)
            .is_some_and(|dates| dates.contains(&day.calendar_day()))
    }

    /// Returns the exception dates of one series (empty if it has none).
    #[must_use]
    pub fn dates(&self, series: &K) -> &BTreeSet<NaiveDate> {
        self.by_series.get(series).unwrap_or(&NO_EXCEPTIONS)
    }

    /// Total number of exceptions across all series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_series.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_series.is_empty()
    }
}

impl<K: Eq + Hash, D: CalendarDay> FromIterator<(K, D)> for ExceptionOverlay<K> {
    fn from_iter<I: IntoIterator<Item = (K, D)>>(iter: I) -> Self {
        let mut overlay = Self::new();
        for (series, day) in iter {
            overlay.add(series, day);
        }
        overlay
    }
}
