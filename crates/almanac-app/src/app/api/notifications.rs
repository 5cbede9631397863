//! Notification routes: listing, unread count, read marks and deletion.

use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, Router, handler};
use serde::Serialize;
use uuid::Uuid;

use almanac_core::constants::NOTIFICATIONS_ROUTE_COMPONENT;
use almanac_db::model::notification::Notification;

use super::respond;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::get_owner_from_depot;
use crate::service_handler::get_service_from_depot;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Serialize)]
struct UnreadCount {
    count: i64,
}

#[derive(Debug, Serialize)]
struct MarkedRead {
    notifications: Vec<Notification>,
    count: usize,
}

fn limit_query(req: &Request) -> AppResult<i64> {
    match req.queries().get("limit") {
        None => Ok(DEFAULT_LIMIT),
        Some(raw) => match raw.parse::<i64>() {
            Ok(limit) if limit > 0 => Ok(limit.min(MAX_LIMIT)),
            _ => Err(AppError::BadRequest(format!("invalid limit: {raw}"))),
        },
    }
}

fn is_read_query(req: &Request) -> AppResult<Option<bool>> {
    let Some(raw) = req
        .queries()
        .get("isRead")
        .or_else(|| req.queries().get("is_read"))
    else {
        return Ok(None);
    };
    match raw.as_str() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        other => Err(AppError::BadRequest(format!("invalid isRead: {other}"))),
    }
}

fn id_param(req: &Request) -> AppResult<Uuid> {
    let raw = req
        .param::<String>("id")
        .ok_or_else(|| AppError::BadRequest("missing notification id".into()))?;
    Uuid::parse_str(&raw).map_err(|e| AppError::BadRequest(format!("invalid notification id: {e}")))
}

async fn list(req: &mut Request, depot: &mut Depot) -> AppResult<Vec<Notification>> {
    let owner = get_owner_from_depot(depot)?;
    let limit = limit_query(req)?;
    let is_read = is_read_query(req)?;
    let service = get_service_from_depot(depot)?;
    Ok(service.notifications(&owner, is_read, limit).await?)
}

async fn unread(depot: &mut Depot) -> AppResult<UnreadCount> {
    let owner = get_owner_from_depot(depot)?;
    let service = get_service_from_depot(depot)?;
    let count = service.unread_notification_count(&owner).await?;
    Ok(UnreadCount { count })
}

async fn mark_one(req: &mut Request, depot: &mut Depot) -> AppResult<Notification> {
    let owner = get_owner_from_depot(depot)?;
    let id = id_param(req)?;
    let service = get_service_from_depot(depot)?;
    Ok(service.mark_notification_read(&owner, id).await?)
}

async fn mark_all(depot: &mut Depot) -> AppResult<MarkedRead> {
    let owner = get_owner_from_depot(depot)?;
    let service = get_service_from_depot(depot)?;
    let notifications = service.mark_all_notifications_read(&owner).await?;
    Ok(MarkedRead {
        count: notifications.len(),
        notifications,
    })
}

async fn delete(req: &mut Request, depot: &mut Depot) -> AppResult<()> {
    let owner = get_owner_from_depot(depot)?;
    let id = id_param(req)?;
    let service = get_service_from_depot(depot)?;
    Ok(service.delete_notification(&owner, id).await?)
}

/// ## Summary
/// GET /api/notifications?limit=&isRead= - Lists the caller's notifications,
/// newest first.
#[handler]
async fn list_notifications(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = list(req, depot).await;
    respond(res, StatusCode::OK, result);
}

/// GET /api/notifications/unread-count
#[handler]
async fn unread_count(depot: &mut Depot, res: &mut Response) {
    let result = unread(depot).await;
    respond(res, StatusCode::OK, result);
}

/// ## Summary
/// PATCH /api/notifications/{id}/read - Marks one notification read.
///
/// ## Errors
/// Returns HTTP 404 if the caller has no such notification.
#[handler]
async fn mark_read(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let result = mark_one(req, depot).await;
    respond(res, StatusCode::OK, result);
}

/// POST /api/notifications/read-all
#[handler]
async fn mark_all_read(depot: &mut Depot, res: &mut Response) {
    let result = mark_all(depot).await;
    respond(res, StatusCode::OK, result);
}

/// ## Summary
/// DELETE /api/notifications/{id}
///
/// ## Errors
/// Returns HTTP 404 if the caller has no such notification.
#[handler]
async fn delete_notification(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match delete(req, depot).await {
        Ok(()) => {
            res.status_code(StatusCode::NO_CONTENT);
        }
        Err(e) => e.render(res),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(NOTIFICATIONS_ROUTE_COMPONENT)
        .get(list_notifications)
        .push(Router::with_path("unread-count").get(unread_count))
        .push(Router::with_path("read-all").post(mark_all_read))
        .push(
            Router::with_path("{id}")
                .delete(delete_notification)
                .push(Router::with_path("read").patch(mark_read)),
        )
}
