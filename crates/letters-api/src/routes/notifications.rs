//! Notification trigger surface
//!
//! The polling client hits `GET /api/v1/notifications?filter=overdue` and
//! `?filter=urgent` on its refetch interval. Both collections come from the
//! same classifier predicate the letter views use, capped at `limit`
//! (default 100), with snoozed letters filtered out.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use letters_core::{next_day_start, Letter, SnoozeStore};
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::auth::Caller;
use crate::middleware::permissions::Permission;
use crate::models::*;
use crate::store::NOTIFICATION_LIMIT;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:id/snooze", post(snooze_letter).delete(unsnooze_letter))
}

#[derive(serde::Deserialize)]
pub struct NotificationParams {
    filter: Option<String>,
    limit: Option<usize>,
}

/// List surfaced notifications
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(
        ("filter" = Option<String>, Query, description = "overdue (default) | urgent"),
        ("limit" = Option<usize>, Query, description = "Collection cap, default 100")
    ),
    responses(
        (status = 200, description = "Surfaced letters", body = NotificationsResponse),
        (status = 400, description = "Unknown filter")
    ),
    tag = "notifications",
    security(("api_key" = []))
)]
pub async fn list_notifications(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Query(params): Query<NotificationParams>,
) -> ApiResult<NotificationList> {
    caller.require(Permission::NotificationsRead)?;
    let now = Utc::now();
    let limit = params.limit.unwrap_or(NOTIFICATION_LIMIT);
    let filter = params.filter.as_deref().unwrap_or("overdue");

    let matched = match filter {
        "overdue" => state.store.overdue(now, limit),
        "urgent" => state.store.urgent(now, limit),
        other => return Err(ApiError::bad_request(format!("unknown filter: {other}"))),
    };

    let letters: Vec<NotificationItem> = matched
        .iter()
        .filter(|l| !state.snooze.is_snoozed(l.id, now))
        .map(|l| item(&state, l))
        .collect();

    Ok(Json(ApiResponse::success(NotificationList {
        filter: filter.to_string(),
        letters,
    })))
}

fn item(state: &ApiState, letter: &Letter) -> NotificationItem {
    NotificationItem {
        id: letter.id,
        number: letter.number,
        org: letter.org.clone(),
        deadline_date: letter.deadline_date,
        owner: state.store.user_name(letter.owner_id),
    }
}

/// Suppress a letter's notifications until the start of the next day
pub async fn snooze_letter(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    caller.require(Permission::NotificationsSnooze)?;
    if state.store.letter(id).is_none() {
        return Err(ApiError::not_found("letter"));
    }
    state.snooze.set(id, next_day_start(Utc::now()));
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unsnooze_letter(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    caller.require(Permission::NotificationsSnooze)?;
    state.snooze.clear(id);
    Ok(StatusCode::NO_CONTENT)
}
