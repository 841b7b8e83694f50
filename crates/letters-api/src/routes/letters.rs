//! Letter management endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use letters_core::LetterStatus;
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::auth::Caller;
use crate::middleware::permissions::Permission;
use crate::models::*;
use crate::notifier::{Event, EventKind};
use crate::store::NOTIFICATION_LIMIT;
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_letters).post(create_letter))
        .route("/bulk/status", post(bulk_status))
        .route("/:id", get(get_letter).put(update_letter).delete(delete_letter))
        .route("/:id/status", post(change_status))
        .route("/:id/reopen", post(reopen_letter))
        .route("/:id/assign", post(assign_letter))
        .route("/:id/watchers", post(add_watcher))
        .route("/:id/watchers/:user_id", delete(remove_watcher))
}

#[derive(serde::Deserialize)]
pub struct ListParams {
    page: Option<u32>,
    per_page: Option<u32>,
    /// `overdue`, `urgent`, or `status:<name>`
    filter: Option<String>,
    /// Cap for the overdue/urgent collections
    limit: Option<usize>,
}

enum ListFilter {
    Overdue,
    Urgent,
    Status(LetterStatus),
}

fn parse_filter(raw: &str) -> Result<ListFilter, ApiError> {
    match raw {
        "overdue" => Ok(ListFilter::Overdue),
        "urgent" => Ok(ListFilter::Urgent),
        _ => match raw.strip_prefix("status:") {
            Some(name) => name
                .parse()
                .map(ListFilter::Status)
                .map_err(|e| ApiError::bad_request(format!("{e}"))),
            None => Err(ApiError::bad_request(format!("unknown filter: {raw}"))),
        },
    }
}

/// List letters
///
/// The `overdue` and `urgent` filters run through the SLA classifier, the
/// same predicate the detail view uses, capped at `limit` (default 100).
/// `urgent` means due within the shared due-soon boundary of working days.
#[utoipa::path(
    get,
    path = "/api/v1/letters",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page"),
        ("filter" = Option<String>, Query, description = "overdue | urgent | status:<name>"),
        ("limit" = Option<usize>, Query, description = "Cap for filtered collections")
    ),
    responses(
        (status = 200, description = "Letter listing", body = LettersPageResponse),
        (status = 400, description = "Unknown filter")
    ),
    tag = "letters",
    security(("api_key" = []))
)]
pub async fn list_letters(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Query(params): Query<ListParams>,
) -> ApiResult<LettersPage> {
    caller.require(Permission::LettersRead)?;
    let now = Utc::now();

    if let Some(raw) = params.filter.as_deref() {
        let limit = params.limit.unwrap_or(NOTIFICATION_LIMIT);
        let matched = match parse_filter(raw)? {
            ListFilter::Overdue => state.store.overdue(now, limit),
            ListFilter::Urgent => state.store.urgent(now, limit),
            ListFilter::Status(status) => {
                let mut letters = state.store.letters();
                letters.retain(|l| l.status == status);
                letters.truncate(limit);
                letters
            }
        };
        let items: Vec<LetterView> = matched.iter().map(|l| LetterView::of(l, now)).collect();
        let total = items.len() as u64;
        return Ok(Json(ApiResponse::success(LettersPage {
            items,
            total,
            page: 1,
            per_page: limit as u32,
            total_pages: 1,
        })));
    }

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 200);
    let all = state.store.letters();
    let total = all.len() as u64;
    let total_pages = (total as u32).div_ceil(per_page).max(1);
    // Offset math in usize: u32 page numbers can overflow a u32 product
    let items: Vec<LetterView> = all
        .iter()
        .skip((page as usize - 1) * per_page as usize)
        .take(per_page as usize)
        .map(|l| LetterView::of(l, now))
        .collect();

    Ok(Json(ApiResponse::success(LettersPage {
        items,
        total,
        page,
        per_page,
        total_pages,
    })))
}

/// Get letter by ID
#[utoipa::path(
    get,
    path = "/api/v1/letters/{id}",
    params(("id" = Uuid, Path, description = "Letter ID")),
    responses(
        (status = 200, description = "Letter with projected SLA state", body = LetterResponse),
        (status = 404, description = "Letter not found")
    ),
    tag = "letters",
    security(("api_key" = []))
)]
pub async fn get_letter(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<LetterView> {
    caller.require(Permission::LettersRead)?;
    let letter = state.store.letter(id).ok_or_else(|| ApiError::not_found("letter"))?;
    let view = if caller.holds(Permission::PortalTokenRead) {
        LetterView::with_token(&letter, Utc::now())
    } else {
        LetterView::of(&letter, Utc::now())
    };
    Ok(Json(ApiResponse::success(view)))
}

/// Register a new letter
#[utoipa::path(
    post,
    path = "/api/v1/letters",
    request_body = LetterCreate,
    responses(
        (status = 201, description = "Letter registered", body = LetterResponse)
    ),
    tag = "letters",
    security(("api_key" = []))
)]
pub async fn create_letter(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Json(input): Json<LetterCreate>,
) -> Result<(StatusCode, Json<ApiResponse<LetterView>>), ApiError> {
    caller.require(Permission::LettersWrite)?;
    let letter = state.store.create_letter(input);
    tracing::info!(number = letter.number, org = %letter.org, "letter registered");
    // The registering caller gets the token so it can be handed to the org
    let view = if caller.holds(Permission::PortalTokenRead) {
        LetterView::with_token(&letter, Utc::now())
    } else {
        LetterView::of(&letter, Utc::now())
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::success(view))))
}

pub async fn update_letter(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<LetterUpdate>,
) -> ApiResult<LetterView> {
    caller.require(Permission::LettersWrite)?;
    let letter = state.store.update_letter(id, input)?;
    Ok(Json(ApiResponse::success(LetterView::of(&letter, Utc::now()))))
}

pub async fn delete_letter(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    caller.require(Permission::LettersDelete)?;
    state.store.delete_letter(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a letter through the workflow
pub async fn change_status(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<StatusChange>,
) -> ApiResult<LetterView> {
    caller.require(Permission::LettersWrite)?;
    let now = Utc::now();
    let letter = state.store.with_letter(id, |l| {
        l.set_status(input.status);
        Ok(())
    })?;
    state
        .notifier
        .publish(Event::for_letter(EventKind::StatusChanged, &letter, now));
    Ok(Json(ApiResponse::success(LetterView::of(&letter, now))))
}

pub async fn reopen_letter(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<LetterView> {
    caller.require(Permission::LettersWrite)?;
    let now = Utc::now();
    let letter = state.store.with_letter(id, |l| l.reopen())?;
    state
        .notifier
        .publish(Event::for_letter(EventKind::StatusChanged, &letter, now));
    Ok(Json(ApiResponse::success(LetterView::of(&letter, now))))
}

pub async fn assign_letter(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<AssignRequest>,
) -> ApiResult<LetterView> {
    caller.require(Permission::LettersWrite)?;
    let now = Utc::now();
    let letter = state.store.with_letter(id, |l| {
        l.assign(input.owner_id);
        Ok(())
    })?;
    state
        .notifier
        .publish(Event::for_letter(EventKind::LetterAssigned, &letter, now));
    Ok(Json(ApiResponse::success(LetterView::of(&letter, now))))
}

pub async fn add_watcher(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<WatchRequest>,
) -> ApiResult<LetterView> {
    caller.require(Permission::LettersWrite)?;
    let letter = state.store.with_letter(id, |l| {
        l.watch(input.user_id);
        Ok(())
    })?;
    Ok(Json(ApiResponse::success(LetterView::of(&letter, Utc::now()))))
}

pub async fn remove_watcher(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<LetterView> {
    caller.require(Permission::LettersWrite)?;
    let letter = state.store.with_letter(id, |l| {
        l.unwatch(user_id);
        Ok(())
    })?;
    Ok(Json(ApiResponse::success(LetterView::of(&letter, Utc::now()))))
}

/// Batch status update
#[utoipa::path(
    post,
    path = "/api/v1/letters/bulk/status",
    responses(
        (status = 200, description = "Per-batch outcome", body = BulkStatusResponse)
    ),
    tag = "letters",
    security(("api_key" = []))
)]
pub async fn bulk_status(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Json(input): Json<BulkStatusRequest>,
) -> ApiResult<BulkStatusResult> {
    caller.require(Permission::BulkUpdate)?;
    let now = Utc::now();
    let result = state.store.bulk_set_status(&input.ids, input.status);
    for id in &input.ids {
        if result.missing.contains(id) {
            continue;
        }
        if let Some(letter) = state.store.letter(*id) {
            state
                .notifier
                .publish(Event::for_letter(EventKind::StatusChanged, &letter, now));
        }
    }
    tracing::info!(updated = result.updated, status = %input.status, "bulk status update");
    Ok(Json(ApiResponse::success(result)))
}
