use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::{pg::Pg, prelude::*};

use almanac_recur::{RecurError, RecurResult, RecurrenceRule, SeriesRule};

use crate::db::{
    enums::{EventStatus, RecurrenceType},
    schema,
};

/// A recurring event stored as a rule.
///
/// Written whole on insert and on update, so the same struct serves as the
/// insert and changeset type.
#[derive(
    Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Insertable, AsChangeset,
)]
#[diesel(table_name = schema::event_series)]
#[diesel(check_for_backend(Pg))]
#[diesel(treat_none_as_null = true)]
pub struct EventSeries {
    pub id: uuid::Uuid,
    pub title: String,
    pub content: String,
    pub frequency: RecurrenceType,
    pub repeat_interval: i32,
    pub first_occurrence_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_days: i32,
    pub recurrence_end_date: Option<NaiveDate>,
    pub alert: String,
    pub status: EventStatus,
    pub completed_at: Option<NaiveDateTime>,
    pub creator_id: uuid::Uuid,
    pub department_id: Option<uuid::Uuid>,
    pub office_id: Option<uuid::Uuid>,
    pub division_id: Option<uuid::Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl EventSeries {
    /// ## Summary
    /// Extracts the recurrence part of the row for expansion.
    ///
    /// ## Errors
    /// Returns `InvalidRecurrenceRule` if the stored interval or duration is
    /// out of range.
    pub fn rule(&self) -> RecurResult<SeriesRule> {
        let rule = RecurrenceRule::new(self.frequency.into(), i64::from(self.repeat_interval))?;
        let duration_days = u32::try_from(self.duration_days).map_err(|_| {
            RecurError::InvalidRecurrenceRule(format!(
                "negative duration of {} days",
                self.duration_days
            ))
        })?;
        Ok(SeriesRule {
            rule,
            first_occurrence: self.first_occurrence_date,
            start_time: self.start_time,
            end_time: self.end_time,
            duration_days,
            until: self.recurrence_end_date,
        })
    }
}
