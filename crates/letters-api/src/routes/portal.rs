//! Applicant portal
//!
//! Token-authenticated, read-only view for the organization that submitted a
//! letter. The token is the only credential; unknown tokens get a plain 404
//! so they leak nothing about which letters exist.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use std::sync::Arc;

use crate::models::{comment_view, ApiError, ApiResponse, ApiResult, PortalView, SlaView};
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/:token", get(portal_view))
}

pub async fn portal_view(
    State(state): State<Arc<ApiState>>,
    Path(token): Path<String>,
) -> ApiResult<PortalView> {
    let letter = state
        .store
        .letter_by_portal_token(&token)
        .ok_or_else(|| ApiError::not_found("letter"))?;

    let comments = state
        .store
        .public_comments_for(letter.id)
        .iter()
        .map(|c| comment_view(c, state.store.user(c.author_id).as_ref()))
        .collect();

    Ok(Json(ApiResponse::success(PortalView {
        number: letter.number,
        subject: letter.subject.clone(),
        org: letter.org.clone(),
        status: letter.status.to_string(),
        created_at: letter.created_at,
        deadline_date: letter.deadline_date,
        sla: SlaView::of(&letter, Utc::now()),
        comments,
    })))
}
