//! Request payloads of the event routes.
//!
//! Bodies use camelCase field names and also accept the older snake_case
//! spellings. Timestamps are naive local `YYYY-MM-DDTHH:MM:SS`.

use chrono::{NaiveDate, NaiveDateTime};
use salvo::Request;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use almanac_db::db::enums::EventStatus;
use almanac_recur::{DateWindow, EventHandle};
use almanac_service::schedule::{
    DeleteScope, EventPatch, NewEvent, OccurrenceScope, RecurrenceInput, SeriesPatch,
};

use crate::error::{AppError, AppResult};

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(alias = "start_at")]
    pub start_at: NaiveDateTime,
    #[serde(alias = "end_at")]
    pub end_at: NaiveDateTime,
    pub status: Option<EventStatus>,
    pub alert: Option<String>,
    #[serde(default, alias = "is_recurring")]
    pub is_recurring: bool,
    #[serde(alias = "recurrence_type")]
    pub recurrence_type: Option<String>,
    #[serde(alias = "recurrence_interval")]
    pub recurrence_interval: Option<i64>,
    #[serde(alias = "recurrence_end_date")]
    pub recurrence_end_date: Option<NaiveDate>,
}

impl From<CreateEventRequest> for NewEvent {
    fn from(req: CreateEventRequest) -> Self {
        let recurrence = req.is_recurring.then(|| RecurrenceInput {
            frequency: req.recurrence_type,
            interval: req.recurrence_interval,
            end_date: req.recurrence_end_date,
        });
        Self {
            title: req.title,
            content: req.content,
            start_at: req.start_at,
            end_at: req.end_at,
            alert: req.alert,
            status: req.status,
            recurrence,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(alias = "start_at")]
    pub start_at: Option<NaiveDateTime>,
    #[serde(alias = "end_at")]
    pub end_at: Option<NaiveDateTime>,
    pub status: Option<EventStatus>,
    pub alert: Option<String>,
    #[serde(alias = "recurrence_type")]
    pub recurrence_type: Option<String>,
    #[serde(alias = "recurrence_interval")]
    pub recurrence_interval: Option<i64>,
    #[serde(
        default,
        alias = "recurrence_end_date",
        deserialize_with = "double_option"
    )]
    pub recurrence_end_date: Option<Option<NaiveDate>>,
    #[serde(alias = "editType", alias = "edit_type")]
    pub scope: Option<OccurrenceScope>,
}

impl UpdateEventRequest {
    #[must_use]
    pub fn into_parts(self) -> (Option<OccurrenceScope>, SeriesPatch) {
        let patch = SeriesPatch {
            fields: EventPatch {
                title: self.title,
                content: self.content,
                start_at: self.start_at,
                end_at: self.end_at,
                alert: self.alert,
                status: self.status,
            },
            frequency: self.recurrence_type,
            interval: self.recurrence_interval,
            recurrence_end_date: self.recurrence_end_date,
        };
        (self.scope, patch)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteEventRequest {
    #[serde(alias = "deleteType", alias = "delete_type")]
    pub scope: Option<DeleteScope>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteEventRequest {
    #[serde(alias = "completeType", alias = "complete_type")]
    pub scope: Option<OccurrenceScope>,
}

/// ## Summary
/// Parses the `{handle}` path parameter.
///
/// ## Errors
/// `BadRequest` if the parameter is missing or is neither handle form.
pub fn handle_param(req: &Request) -> AppResult<EventHandle> {
    let raw = req
        .param::<String>("handle")
        .ok_or_else(|| AppError::BadRequest("missing event id".into()))?;
    raw.parse::<EventHandle>()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// ## Summary
/// Reads a JSON body, treating an empty body as the default value.
///
/// ## Errors
/// `BadRequest` if the body is present but malformed.
pub async fn optional_json<T>(req: &mut Request) -> AppResult<T>
where
    T: DeserializeOwned + Default,
{
    let payload = req
        .payload()
        .await
        .map_err(|e| AppError::BadRequest(format!("unreadable body: {e}")))?;
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(payload).map_err(|e| AppError::BadRequest(format!("invalid body: {e}")))
}

/// ## Summary
/// Reads a JSON body that must be present.
///
/// ## Errors
/// `BadRequest` if the body is missing, not declared as JSON, or malformed.
pub async fn required_json<T: DeserializeOwned>(req: &mut Request) -> AppResult<T> {
    req.parse_json::<T>().await.map_err(|e| {
        tracing::debug!(error = ?e, "Failed to parse request body");
        AppError::BadRequest(format!("invalid body: {e}"))
    })
}

/// ## Summary
/// Parses an optional query parameter with serde.
///
/// ## Errors
/// `BadRequest` if the parameter is present but malformed.
pub fn query_param<T: DeserializeOwned>(req: &Request, names: &[&str]) -> AppResult<Option<T>> {
    for name in names {
        if let Some(raw) = req.queries().get(*name) {
            let value = serde_json::Value::String(raw.clone());
            return serde_json::from_value(value)
                .map(Some)
                .map_err(|e| AppError::BadRequest(format!("invalid {name}: {e}")));
        }
    }
    Ok(None)
}

fn parse_query_date(req: &Request, camel: &str, snake: &str) -> AppResult<NaiveDate> {
    let raw = req
        .queries()
        .get(camel)
        .or_else(|| req.queries().get(snake))
        .ok_or_else(|| AppError::BadRequest(format!("missing {camel}")))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| AppError::BadRequest(format!("invalid {camel}: {e}")))
}

/// ## Summary
/// Reads the `startDate`/`endDate` listing window.
///
/// ## Errors
/// `BadRequest` if either date is missing or malformed.
pub fn window_query(req: &Request) -> AppResult<DateWindow> {
    Ok(DateWindow::new(
        parse_query_date(req, "startDate", "start_date")?,
        parse_query_date(req, "endDate", "end_date")?,
    ))
}
