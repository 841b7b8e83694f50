//! Attachment metadata endpoints, nested under a letter
//!
//! Only metadata lives here; the file bytes are handled by the external
//! file store.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use letters_core::Attachment;
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::auth::Caller;
use crate::middleware::permissions::Permission;
use crate::models::{ApiError, ApiResponse, ApiResult, AttachmentCreate};
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_attachments).post(create_attachment))
        .route("/:attachment_id", delete(delete_attachment))
}

pub async fn list_attachments(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Attachment>> {
    caller.require(Permission::AttachmentsRead)?;
    if state.store.letter(id).is_none() {
        return Err(ApiError::not_found("letter"));
    }
    Ok(Json(ApiResponse::success(state.store.attachments_for(id))))
}

pub async fn create_attachment(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<AttachmentCreate>,
) -> Result<(StatusCode, Json<ApiResponse<Attachment>>), ApiError> {
    caller.require(Permission::AttachmentsWrite)?;
    let attachment = state.store.add_attachment(id, input)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(attachment))))
}

pub async fn delete_attachment(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path((id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    caller.require(Permission::AttachmentsWrite)?;
    state.store.delete_attachment(id, attachment_id)?;
    Ok(StatusCode::NO_CONTENT)
}
