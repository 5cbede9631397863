//! Database enum types with Diesel serialization.
//!
//! Each enum maps a `TEXT` column guarded by a CHECK constraint and
//! implements `ToSql` and `FromSql` for conversion between Rust and `PostgreSQL`.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;

use almanac_recur::Frequency;

/// Stored recurrence unit.
///
/// Maps to `event_series.frequency` CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum RecurrenceType {
    Day,
    Week,
    Month,
    Year,
}

impl ToSql<Text, Pg> for RecurrenceType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for RecurrenceType {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"day" => Ok(Self::Day),
            b"week" => Ok(Self::Week),
            b"month" => Ok(Self::Month),
            b"year" => Ok(Self::Year),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl RecurrenceType {
    /// Returns the database string representation of this recurrence unit.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RecurrenceType> for Frequency {
    fn from(db_type: RecurrenceType) -> Self {
        match db_type {
            RecurrenceType::Day => Self::Daily,
            RecurrenceType::Week => Self::Weekly,
            RecurrenceType::Month => Self::Monthly,
            RecurrenceType::Year => Self::Yearly,
        }
    }
}

impl From<Frequency> for RecurrenceType {
    fn from(frequency: Frequency) -> Self {
        match frequency {
            Frequency::Daily => Self::Day,
            Frequency::Weekly => Self::Week,
            Frequency::Monthly => Self::Month,
            Frequency::Yearly => Self::Year,
        }
    }
}

/// Completion state of a series or an event row.
///
/// Maps to the `status` CHECK constraint of `event_series` and `event`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    AsExpression,
    FromSqlRow,
    serde::Serialize,
    serde::Deserialize,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    #[default]
    Pending,
    Done,
}

impl ToSql<Text, Pg> for EventStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for EventStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"PENDING" => Ok(Self::Pending),
            b"DONE" => Ok(Self::Done),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl EventStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Done => "DONE",
        }
    }

    #[must_use]
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of an in-app notification.
///
/// Maps to `notification.kind` CHECK constraint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsExpression,
    FromSqlRow,
    serde::Serialize,
    serde::Deserialize,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    EventCreated,
    EventUpdated,
    EventDeleted,
    EventCompleted,
    EventReminder,
}

impl ToSql<Text, Pg> for NotificationKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for NotificationKind {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"EVENT_CREATED" => Ok(Self::EventCreated),
            b"EVENT_UPDATED" => Ok(Self::EventUpdated),
            b"EVENT_DELETED" => Ok(Self::EventDeleted),
            b"EVENT_COMPLETED" => Ok(Self::EventCompleted),
            b"EVENT_REMINDER" => Ok(Self::EventReminder),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EventCreated => "EVENT_CREATED",
            Self::EventUpdated => "EVENT_UPDATED",
            Self::EventDeleted => "EVENT_DELETED",
            Self::EventCompleted => "EVENT_COMPLETED",
            Self::EventReminder => "EVENT_REMINDER",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
