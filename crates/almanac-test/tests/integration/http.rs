#![allow(clippy::expect_used)]
//! The API routes end to end over the in-memory store.

use salvo::http::StatusCode;
use salvo::test::{ResponseExt, TestClient};
use serde_json::{Value, json};

use super::helpers::*;

const BASE: &str = "http://127.0.0.1:5800/api";

async fn create_weekly(service: &salvo::Service) -> Value {
    let mut res = TestClient::post(format!("{BASE}/events"))
        .json(&json!({
            "title": "Standup",
            "startAt": "2024-01-01T09:00:00",
            "endAt": "2024-01-01T09:30:00",
            "isRecurring": true,
            "recurrenceType": "weekly",
            "recurrenceInterval": 1
        }))
        .send(service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::CREATED));
    res.take_json::<Value>().await.expect("json body")
}

async fn list_january(service: &salvo::Service) -> Vec<Value> {
    let mut res = TestClient::get(format!(
        "{BASE}/events?startDate=2024-01-01&endDate=2024-01-31"
    ))
    .send(service)
    .await;
    assert_eq!(res.status_code, Some(StatusCode::OK));
    res.take_json::<Vec<Value>>().await.expect("json body")
}

#[test_log::test(tokio::test)]
async fn create_list_and_complete_over_http() {
    let h = Harness::new();
    let service = h.http();

    let created = create_weekly(&service).await;
    assert_eq!(created["isGenerated"], json!(true));
    assert_eq!(created["startAt"], json!("2024-01-01T09:00:00"));

    let listed = list_january(&service).await;
    assert_eq!(listed.len(), 5);

    let handle = listed[2]["id"].as_str().expect("id is a string").to_owned();
    assert!(handle.starts_with("series-"), "{handle}");

    let mut res = TestClient::post(format!("{BASE}/events/{handle}/complete"))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::OK));
    let done = res.take_json::<Value>().await.expect("json body");
    assert_eq!(done["status"], json!("DONE"));
    assert_eq!(done["isException"], json!(true));
    assert_eq!(done["occurrenceDate"], json!("2024-01-15"));

    let listed = list_january(&service).await;
    assert_eq!(listed.len(), 5);
    let done_count = listed.iter().filter(|v| v["status"] == json!("DONE")).count();
    assert_eq!(done_count, 1);

    let mut res = TestClient::get(format!("{BASE}/notifications?limit=1"))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::OK));
    let notes = res.take_json::<Vec<Value>>().await.expect("json body");
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["kind"], json!("EVENT_COMPLETED"));
}

#[test_log::test(tokio::test)]
async fn update_this_then_delete_series_over_http() {
    let h = Harness::new();
    let service = h.http();
    let created = create_weekly(&service).await;
    let series_id = created["seriesId"].as_str().expect("series id").to_owned();
    let first = created["id"].as_str().expect("id").to_owned();

    let second = occurrence(
        series_id.parse().expect("uuid"),
        date(2024, 1, 8),
    )
    .to_string();
    let mut res = TestClient::put(format!("{BASE}/events/{second}"))
        .json(&json!({ "title": "Moved standup", "edit_type": "this" }))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::OK));
    let moved = res.take_json::<Value>().await.expect("json body");
    assert_eq!(moved["title"], json!("Moved standup"));
    assert_eq!(moved["isException"], json!(true));

    let res = TestClient::delete(format!("{BASE}/events/{first}?scope=series"))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::NO_CONTENT));

    let listed = list_january(&service).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["title"], json!("Moved standup"));
}

#[test_log::test(tokio::test)]
async fn delete_scope_from_legacy_body() {
    let h = Harness::new();
    let service = h.http();
    let created = create_weekly(&service).await;
    let first = created["id"].as_str().expect("id").to_owned();

    let res = TestClient::delete(format!("{BASE}/events/{first}"))
        .json(&json!({ "deleteType": "single" }))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::NO_CONTENT));

    let listed = list_january(&service).await;
    assert_eq!(listed.len(), 4);
    assert_eq!(listed[0]["startAt"], json!("2024-01-08T09:00:00"));
}

#[test_log::test(tokio::test)]
async fn errors_map_to_status_codes() {
    let h = Harness::new();
    let service = h.http();

    let mut res = TestClient::post(format!("{BASE}/events"))
        .json(&json!({
            "title": "Sync",
            "start_at": "2024-01-01T09:00:00",
            "end_at": "2024-01-01T10:00:00",
            "is_recurring": true,
            "recurrence_type": "fortnightly"
        }))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    let body = res.take_json::<Value>().await.expect("json body");
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|e| e.starts_with("Invalid recurrence rule")),
        "{body}"
    );
    assert_eq!(h.store.series_count(), 0);

    let res = TestClient::post(format!("{BASE}/events"))
        .json(&json!({
            "title": "Backwards",
            "startAt": "2024-01-01T10:00:00",
            "endAt": "2024-01-01T09:00:00"
        }))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

    let res = TestClient::post(format!("{BASE}/events"))
        .raw_json("{not json")
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

    let mut res = TestClient::post(format!("{BASE}/events"))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    let body = res.take_json::<Value>().await.expect("json body");
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|e| e.starts_with("invalid body")),
        "{body}"
    );
    assert_eq!(h.store.series_count(), 0);

    let res = TestClient::get(format!("{BASE}/events/{}", uuid::Uuid::now_v7()))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

    let res = TestClient::get(format!("{BASE}/events?startDate=2024-01-01"))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

    let res = TestClient::get(format!("{BASE}/notifications?limit=zero"))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
}

#[test_log::test(tokio::test)]
async fn failed_write_is_a_generic_server_error() {
    let h = Harness::new();
    let service = h.http();
    h.store.fail_next_apply();

    let mut res = TestClient::post(format!("{BASE}/events"))
        .json(&json!({
            "title": "Audit",
            "startAt": "2024-01-02T09:00:00",
            "endAt": "2024-01-02T10:00:00"
        }))
        .send(&service)
        .await;

    assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));
    let body = res.take_json::<Value>().await.expect("json body");
    assert_eq!(body["error"], json!("Internal server error"));
    assert!(h.store.events().is_empty());
}

#[test_log::test(tokio::test)]
async fn notification_read_marks_and_deletion_over_http() {
    let h = Harness::new();
    let service = h.http();
    create_weekly(&service).await;
    let created = create_weekly(&service).await;
    let second = created["id"].as_str().expect("id").to_owned();
    let res = TestClient::post(format!("{BASE}/events/{second}/complete"))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::OK));

    let mut res = TestClient::get(format!("{BASE}/notifications/unread-count"))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::OK));
    let body = res.take_json::<Value>().await.expect("json body");
    assert_eq!(body["count"], json!(3));

    let newest = h.recorder.sent().last().expect("notified").id;
    let mut res = TestClient::patch(format!("{BASE}/notifications/{newest}/read"))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::OK));
    let marked = res.take_json::<Value>().await.expect("json body");
    assert_eq!(marked["isRead"], json!(true));
    let first_read_at = marked["readAt"].clone();
    assert!(first_read_at.is_string());

    let mut res = TestClient::patch(format!("{BASE}/notifications/{newest}/read"))
        .send(&service)
        .await;
    let again = res.take_json::<Value>().await.expect("json body");
    assert_eq!(again["readAt"], first_read_at);

    let mut res = TestClient::get(format!("{BASE}/notifications?isRead=false"))
        .send(&service)
        .await;
    let unread = res.take_json::<Vec<Value>>().await.expect("json body");
    assert_eq!(unread.len(), 2);
    assert!(unread.iter().all(|n| n["isRead"] == json!(false)));

    let mut res = TestClient::post(format!("{BASE}/notifications/read-all"))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::OK));
    let body = res.take_json::<Value>().await.expect("json body");
    assert_eq!(body["count"], json!(2));

    let mut res = TestClient::get(format!("{BASE}/notifications/unread-count"))
        .send(&service)
        .await;
    let body = res.take_json::<Value>().await.expect("json body");
    assert_eq!(body["count"], json!(0));

    let res = TestClient::delete(format!("{BASE}/notifications/{newest}"))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::NO_CONTENT));
    assert_eq!(h.recorder.sent().len(), 2);

    let res = TestClient::delete(format!("{BASE}/notifications/{newest}"))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

    let res = TestClient::patch(format!("{BASE}/notifications/{}/read", uuid::Uuid::now_v7()))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

    let res = TestClient::get(format!("{BASE}/notifications?isRead=maybe"))
        .send(&service)
        .await;
    assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
}
