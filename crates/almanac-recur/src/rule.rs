//! Recurrence rule evaluation.
//!
//! ## Summary
//! A rule is a frequency plus a positive interval. [`next_occurrence`] steps a
//! date forward by one rule period.
//!
//! Month and year arithmetic use overflow semantics: the day-of-month is kept
//! and any days past the end of the target month roll into the following
//! month. Jan 31 plus one month is Mar 3 (Mar 2 in a leap year), and Feb 29
//! plus one year is Mar 1. The result becomes the next cursor, so a series
//! anchored on the 31st drifts after its first short month.

use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::error::{RecurError, RecurResult};

/// How often a series repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the canonical name of this frequency.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = RecurError;

    /// Accepts both the adverb (`weekly`) and the unit (`week`) spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            "yearly" | "year" => Ok(Self::Yearly),
            other => Err(RecurError::InvalidRecurrenceRule(format!(
                "unknown frequency '{other}'"
            ))),
        }
    }
}

/// A validated recurrence rule. The interval is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: NonZeroU32,
}

impl RecurrenceRule {
    /// ## Summary
    /// Validates an interval coming from an untyped source.
    ///
    /// ## Errors
    /// Returns `InvalidRecurrenceRule` if the interval is zero, negative or
    /// does not fit in a `u32`.
    pub fn new(frequency: Frequency, interval: i64) -> RecurResult<Self> {
        let interval = u32::try_from(interval)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| {
                RecurError::InvalidRecurrenceRule(format!(
                    "interval must be a positive integer, got {interval}"
                ))
            })?;
        Ok(Self {
            frequency,
            interval,
        })
    }

    /// ## Summary
    /// Parses a frequency name and validates the interval.
    ///
    /// ## Errors
    /// Returns `InvalidRecurrenceRule` for an unknown frequency or a
    /// non-positive interval.
    pub fn parse(frequency: &str, interval: i64) -> RecurResult<Self> {
        Self::new(frequency.parse()?, interval)
    }

    /// ## Summary
    /// Returns the date one rule period after `date`.
    ///
    /// ## Errors
    /// Returns `DateOutOfRange` if the result does not fit the calendar range.
    pub fn next_after(&self, date: NaiveDate) -> RecurResult<NaiveDate> {
        next_occurrence(date, self.frequency, self.interval)
    }

    /// ## Summary
    /// Advances `date` by as many whole periods as possible without passing
    /// `target`, and by at least one period.
    ///
    /// The result is a date the one-period walk from `date` would also reach.
    /// Day and week steps jump straight to the last period before `target`.
    /// Month and year steps jump only while the day-of-month is at most 28,
    /// because later days may overflow and drift.
    ///
    /// ## Errors
    /// Returns `DateOutOfRange` if the result does not fit the calendar range.
    pub fn skip_toward(&self, date: NaiveDate, target: NaiveDate) -> RecurResult<NaiveDate> {
        let step = u64::from(self.interval.get());
        let periods = match self.frequency {
            Frequency::Daily | Frequency::Weekly => {
                let period_days = if self.frequency == Frequency::Daily {
                    step
                } else {
                    7 * step
                };
                let gap = u64::try_from((target - date).num_days()).unwrap_or(0);
                gap.saturating_sub(1) / period_days
            }
            Frequency::Monthly | Frequency::Yearly if date.day() <= 28 => {
                let period_months = if self.frequency == Frequency::Monthly {
                    step
                } else {
                    12 * step
                };
                let gap = month_index(target) - month_index(date);
                u64::try_from(gap).unwrap_or(0).saturating_sub(1) / period_months
            }
            Frequency::Monthly | Frequency::Yearly => 0,
        };

        if periods <= 1 {
            return self.next_after(date);
        }
        let jumped = match self.frequency {
            Frequency::Daily => periods
                .checked_mul(step)
                .and_then(|days| date.checked_add_days(Days::new(days))),
            Frequency::Weekly => periods
                .checked_mul(7 * step)
                .and_then(|days| date.checked_add_days(Days::new(days))),
            Frequency::Monthly => periods
                .checked_mul(step)
                .and_then(|months| add_months_overflowing(date, months)),
            Frequency::Yearly => periods
                .checked_mul(12 * step)
                .and_then(|months| add_months_overflowing(date, months)),
        };
        jumped.ok_or(RecurError::DateOutOfRange(date))
    }
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

/// ## Summary
/// Computes the next occurrence date after `date`.
///
/// ## Errors
/// Returns `DateOutOfRange` if the result falls outside the range chrono can
/// represent.
pub fn next_occurrence(
    date: NaiveDate,
    frequency: Frequency,
    interval: NonZeroU32,
) -> RecurResult<NaiveDate> {
    let step = interval.get();
    let next = match frequency {
        Frequency::Daily => date.checked_add_days(Days::new(u64::from(step))),
        Frequency::Weekly => date.checked_add_days(Days::new(7 * u64::from(step))),
        Frequency::Monthly => add_months_overflowing(date, u64::from(step)),
        Frequency::Yearly => add_months_overflowing(date, 12 * u64::from(step)),
    };
    next.ok_or(RecurError::DateOutOfRange(date))
}

/// Adds whole months keeping the day-of-month, letting short months overflow.
fn add_months_overflowing(date: NaiveDate, months: u64) -> Option<NaiveDate> {
    let months = i64::try_from(months).ok()?;
    let total = i64::from(date.year())
        .checked_mul(12)?
        .checked_add(i64::from(date.month0()))?
        .checked_add(months)?;
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
    NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(u64::from(date.day0())))
}
