//! Mutation inputs.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use almanac_db::db::enums::EventStatus;
use almanac_db::model::event::Event;

/// Recurrence settings of a new event. The frequency stays a string until
/// validation so an unknown name surfaces as `InvalidRecurrenceRule`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecurrenceInput {
    pub frequency: Option<String>,
    pub interval: Option<i64>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub content: String,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub alert: Option<String>,
    pub status: Option<EventStatus>,
    /// `Some` creates a series instead of a single event.
    pub recurrence: Option<RecurrenceInput>,
}

/// Partial update of a single event. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub start_at: Option<NaiveDateTime>,
    pub end_at: Option<NaiveDateTime>,
    pub alert: Option<String>,
    pub status: Option<EventStatus>,
}

impl EventPatch {
    /// Applies the present fields to `row`. Completion time follows the
    /// status when the status changes.
    pub fn apply_to(&self, row: &mut Event, now: NaiveDateTime) {
        if let Some(title) = &self.title {
            row.title.clone_from(title);
        }
        if let Some(content) = &self.content {
            row.content.clone_from(content);
        }
        if let Some(start_at) = self.start_at {
            row.start_at = start_at;
        }
        if let Some(end_at) = self.end_at {
            row.end_at = end_at;
        }
        if let Some(alert) = &self.alert {
            row.alert.clone_from(alert);
        }
        if let Some(status) = self.status
            && status != row.status
        {
            row.status = status;
            row.completed_at = status.is_done().then_some(now);
        }
        row.updated_at = now;
    }
}

/// Partial update of a whole series.
///
/// `start_at` and `end_at` contribute their time of day; when both are
/// present their calendar-date difference becomes the new duration.
/// `recurrence_end_date` is doubly optional: `Some(None)` clears the end date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesPatch {
    pub fields: EventPatch,
    pub frequency: Option<String>,
    pub interval: Option<i64>,
    pub recurrence_end_date: Option<Option<NaiveDate>>,
}

impl From<EventPatch> for SeriesPatch {
    fn from(fields: EventPatch) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }
}

/// Which part of a recurring event an update or completion targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceScope {
    #[default]
    This,
    All,
}

/// Which part of a recurring event a delete targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteScope {
    #[default]
    #[serde(alias = "this")]
    Single,
    #[serde(alias = "all")]
    Series,
}
