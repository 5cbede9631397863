use chrono::{NaiveDate, NaiveDateTime};
use diesel::{pg::Pg, prelude::*};

use crate::db::{enums::EventStatus, schema};

/// A stored event row: a one-off event, or a detached occurrence of a series
/// when `is_exception` is set.
#[derive(
    Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Insertable, AsChangeset,
)]
#[diesel(table_name = schema::event)]
#[diesel(check_for_backend(Pg))]
#[diesel(treat_none_as_null = true)]
pub struct Event {
    pub id: uuid::Uuid,
    pub title: String,
    pub content: String,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub status: EventStatus,
    pub completed_at: Option<NaiveDateTime>,
    pub alert: String,
    pub series_id: Option<uuid::Uuid>,
    pub occurrence_date: Option<NaiveDate>,
    pub is_exception: bool,
    pub creator_id: uuid::Uuid,
    pub department_id: Option<uuid::Uuid>,
    pub office_id: Option<uuid::Uuid>,
    pub division_id: Option<uuid::Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Event {
    /// The series date this row stands for, falling back to its start date
    /// for rows written before `occurrence_date` existed.
    #[must_use]
    pub fn replaced_date(&self) -> NaiveDate {
        self.occurrence_date.unwrap_or_else(|| self.start_at.date())
    }
}
