use chrono::{NaiveDate, NaiveDateTime};
use diesel::{pg::Pg, prelude::*};

use crate::db::schema;

/// A date on which a series produces no virtual occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = schema::event_exception)]
#[diesel(belongs_to(crate::model::series::EventSeries, foreign_key = series_id))]
#[diesel(check_for_backend(Pg))]
pub struct EventException {
    pub id: uuid::Uuid,
    pub series_id: uuid::Uuid,
    pub exception_date: NaiveDate,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::event_exception)]
pub struct NewEventException {
    pub id: uuid::Uuid,
    pub series_id: uuid::Uuid,
    pub exception_date: NaiveDate,
    pub created_at: NaiveDateTime,
}
