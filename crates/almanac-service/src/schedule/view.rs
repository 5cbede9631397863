//! Uniform event output.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

use almanac_db::db::enums::EventStatus;
use almanac_db::model::event::Event;
use almanac_db::model::series::EventSeries;
use almanac_recur::{EventHandle, Occurrence};

/// One event as seen by a caller, whether it is a stored row or a virtual
/// occurrence of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    /// Handle in string form, accepted back by every event route.
    pub id: String,
    pub handle: EventHandle,
    pub title: String,
    pub content: String,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub status: EventStatus,
    pub completed_at: Option<NaiveDateTime>,
    pub alert: String,
    pub series_id: Option<Uuid>,
    pub occurrence_date: Option<NaiveDate>,
    pub is_exception: bool,
    pub is_generated: bool,
    pub is_recurring: bool,
    pub creator: Uuid,
    pub department: Option<Uuid>,
    pub office: Option<Uuid>,
    pub division: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl EventView {
    #[must_use]
    pub fn from_event(row: &Event) -> Self {
        let handle = EventHandle::standalone(row.id);
        Self {
            id: handle.to_string(),
            handle,
            title: row.title.clone(),
            content: row.content.clone(),
            start_at: row.start_at,
            end_at: row.end_at,
            status: row.status,
            completed_at: row.completed_at,
            alert: row.alert.clone(),
            series_id: row.series_id,
            occurrence_date: row.occurrence_date,
            is_exception: row.is_exception,
            is_generated: false,
            is_recurring: row.series_id.is_some(),
            creator: row.creator_id,
            department: row.department_id,
            office: row.office_id,
            division: row.division_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    /// Builds the view of a virtual occurrence. It carries the series' own
    /// completion state.
    #[must_use]
    pub fn from_occurrence(series: &EventSeries, occurrence: &Occurrence) -> Self {
        let handle = EventHandle::occurrence(series.id, occurrence.date);
        Self {
            id: handle.to_string(),
            handle,
            title: series.title.clone(),
            content: series.content.clone(),
            start_at: occurrence.start_at,
            end_at: occurrence.end_at,
            status: series.status,
            completed_at: series.completed_at,
            alert: series.alert.clone(),
            series_id: Some(series.id),
            occurrence_date: Some(occurrence.date),
            is_exception: false,
            is_generated: true,
            is_recurring: true,
            creator: series.creator_id,
            department: series.department_id,
            office: series.office_id,
            division: series.division_id,
            created_at: series.created_at,
            updated_at: series.updated_at,
        }
    }

    /// Takes the completion state of the row that replaced this occurrence.
    #[must_use]
    pub fn with_override(mut self, detached: &Event) -> Self {
        self.status = detached.status;
        self.completed_at = detached.completed_at;
        self
    }
}
