//! User management endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use letters_core::User;
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::auth::Caller;
use crate::middleware::permissions::Permission;
use crate::models::{ApiError, ApiResponse, ApiResult, UserCreate};
use crate::ApiState;

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

pub async fn list_users(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
) -> ApiResult<Vec<User>> {
    caller.require(Permission::UsersRead)?;
    Ok(Json(ApiResponse::success(state.store.users())))
}

pub async fn get_user(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<User> {
    caller.require(Permission::UsersRead)?;
    let user = state.store.user(id).ok_or_else(|| ApiError::not_found("user"))?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn create_user(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Json(input): Json<UserCreate>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    caller.require(Permission::UsersWrite)?;
    let user = state.store.create_user(input);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

pub async fn update_user(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(input): Json<UserCreate>,
) -> ApiResult<User> {
    caller.require(Permission::UsersWrite)?;
    let user = state.store.update_user(id, input)?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn delete_user(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    caller.require(Permission::UsersWrite)?;
    state.store.delete_user(id)?;
    Ok(StatusCode::NO_CONTENT)
}
