//! Comment endpoints, nested under a letter

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::Utc;
use letters_core::Comment;
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::auth::Caller;
use crate::middleware::permissions::Permission;
use crate::models::{ApiError, ApiResponse, ApiResult, CommentCreate};
use crate::notifier::{Event, EventKind};
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_comments).post(create_comment))
        .route("/:comment_id", delete(delete_comment))
}

pub async fn list_comments(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Comment>> {
    caller.require(Permission::CommentsRead)?;
    if state.store.letter(id).is_none() {
        return Err(ApiError::not_found("letter"));
    }
    Ok(Json(ApiResponse::success(state.store.comments_for(id))))
}

pub async fn create_comment(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<CommentCreate>,
) -> Result<(StatusCode, Json<ApiResponse<Comment>>), ApiError> {
    caller.require(Permission::CommentsWrite)?;
    let now = Utc::now();
    let comment = state.store.add_comment(id, input)?;
    if let Some(letter) = state.store.letter(id) {
        state
            .notifier
            .publish(Event::for_letter(EventKind::CommentAdded, &letter, now));
    }
    Ok((StatusCode::CREATED, Json(ApiResponse::success(comment))))
}

pub async fn delete_comment(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path((id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    caller.require(Permission::CommentsWrite)?;
    state.store.delete_comment(id, comment_id)?;
    Ok(StatusCode::NO_CONTENT)
}
