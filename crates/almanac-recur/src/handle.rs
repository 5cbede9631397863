//! Event identity.
//!
//! ## Summary
//! A handle names either a stored standalone row or one virtual occurrence of
//! a series. The string form is a bare UUID for standalone rows and
//! `series-{series_id}-{epoch_millis}` for occurrences, where the millis are
//! the occurrence date at midnight read as a naive timestamp.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RecurError, RecurResult};

const SERIES_PREFIX: &str = "series-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventHandle {
    Standalone {
        id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    Occurrence {
        series_id: Uuid,
        occurrence_date: NaiveDate,
    },
}

impl EventHandle {
    #[must_use]
    pub const fn standalone(id: Uuid) -> Self {
        Self::Standalone { id }
    }

    #[must_use]
    pub const fn occurrence(series_id: Uuid, occurrence_date: NaiveDate) -> Self {
        Self::Occurrence {
            series_id,
            occurrence_date,
        }
    }

    /// Returns the series this handle refers to, if it names an occurrence.
    #[must_use]
    pub const fn series_id(&self) -> Option<Uuid> {
        match self {
            Self::Standalone { .. } => None,
            Self::Occurrence { series_id, .. } => Some(*series_id),
        }
    }
}

/// Milliseconds since the epoch for midnight of `date`, without zone shift.
fn date_to_millis(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN)
        .and_utc()
        .timestamp_millis()
}

fn millis_to_date(millis: i64) -> RecurResult<NaiveDate> {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| RecurError::InvalidHandle(format!("timestamp {millis} out of range")))
}

impl std::fmt::Display for EventHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standalone { id } => write!(f, "{id}"),
            Self::Occurrence {
                series_id,
                occurrence_date,
            } => write!(
                f,
                "{SERIES_PREFIX}{series_id}-{}",
                date_to_millis(*occurrence_date)
            ),
        }
    }
}

impl FromStr for EventHandle {
    type Err = RecurError;

    /// ## Summary
    /// Parses either handle string form.
    ///
    /// The series id contains hyphens itself, so the millis part is split off
    /// from the right. Any time-of-day carried by the millis is dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || RecurError::InvalidHandle(s.to_owned());

        if let Some(rest) = s.strip_prefix(SERIES_PREFIX) {
            let (series, millis) = rest.rsplit_once('-').ok_or_else(invalid)?;
            let series_id = Uuid::parse_str(series).map_err(|_| invalid())?;
            let millis = millis.parse::<i64>().map_err(|_| invalid())?;
            return Ok(Self::occurrence(series_id, millis_to_date(millis)?));
        }

        Uuid::parse_str(s)
            .map(Self::standalone)
            .map_err(|_| invalid())
    }
}
