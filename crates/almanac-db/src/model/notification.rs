use chrono::NaiveDateTime;
use diesel::{pg::Pg, prelude::*};

use crate::db::{enums::NotificationKind, schema};

#[derive(
    Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, serde::Serialize,
)]
#[diesel(table_name = schema::notification)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_event_id: Option<String>,
    pub dedup_key: Option<String>,
    pub is_read: bool,
    pub read_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = schema::notification)]
pub struct NewNotification {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_event_id: Option<String>,
    pub dedup_key: Option<String>,
    pub created_at: NaiveDateTime,
}
