//! API Models

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use letters_core::LetterError;
use letters_core::{Comment, Letter, LetterStatus, User, UserRole};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Standard API response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(
    LetterResponse = ApiResponse<LetterView>,
    LettersPageResponse = ApiResponse<LettersPage>,
    NotificationsResponse = ApiResponse<NotificationList>,
    BulkStatusResponse = ApiResponse<BulkStatusResult>
)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Paginated letter listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LettersPage {
    pub items: Vec<LetterView>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

// ============ Letters ============

/// Letter as presented to clients, with the projected SLA view attached
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LetterView {
    pub id: Uuid,
    pub number: u64,
    pub subject: String,
    pub body: String,
    pub org: String,
    pub status: String,
    pub owner_id: Option<Uuid>,
    pub watchers: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub deadline_date: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub frozen_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// Token the applicant uses on the portal. Revealed only on creation
    /// and detail responses, and only to callers holding the portal-token
    /// permission; absent everywhere else.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portal_token: Option<String>,
    pub sla: SlaView,
}

impl LetterView {
    /// Build the client view of a letter at the given instant
    pub fn of(letter: &Letter, now: DateTime<Utc>) -> Self {
        Self {
            id: letter.id,
            number: letter.number,
            subject: letter.subject.clone(),
            body: letter.body.clone(),
            org: letter.org.clone(),
            status: letter.status.to_string(),
            owner_id: letter.owner_id,
            watchers: letter.watchers.clone(),
            created_at: letter.created_at,
            deadline_date: letter.deadline_date,
            closed_at: letter.closed_at,
            frozen_at: letter.frozen_at,
            updated_at: letter.updated_at,
            portal_token: None,
            sla: SlaView::of(letter, now),
        }
    }

    /// Detail/creation view carrying the portal token
    pub fn with_token(letter: &Letter, now: DateTime<Utc>) -> Self {
        Self {
            portal_token: Some(letter.portal_token.clone()),
            ..Self::of(letter, now)
        }
    }
}

/// Projected SLA state for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SlaView {
    pub state: String,
    pub percent: u8,
    pub label: String,
    pub tone: String,
    pub days_left: Option<i64>,
    pub elapsed_days: i64,
    pub total_days: i64,
    pub frozen_days: Option<i64>,
}

impl SlaView {
    pub fn of(letter: &Letter, now: DateTime<Utc>) -> Self {
        let report = letters_core::classify(&letter.sla_input(), now);
        let progress = letters_core::project(&report);
        Self {
            state: to_snake(&report.state),
            percent: progress.percent,
            label: progress.label,
            tone: to_snake(&progress.tone),
            days_left: report.days_left,
            elapsed_days: report.elapsed_days,
            total_days: report.total_days,
            frozen_days: report.frozen_days,
        }
    }
}

// Enum wire names come from the core's serde renames
fn to_snake<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Letter registration request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LetterCreate {
    pub subject: String,
    pub body: String,
    pub org: String,
    pub deadline_date: Option<DateTime<Utc>>,
}

/// Partial letter update
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct LetterUpdate {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub org: Option<String>,
    pub deadline_date: Option<DateTime<Utc>>,
}

/// Status change request
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: LetterStatus,
}

/// Assignment request
#[derive(Debug, Serialize, Deserialize)]
pub struct AssignRequest {
    pub owner_id: Uuid,
}

/// Watcher subscription request
#[derive(Debug, Serialize, Deserialize)]
pub struct WatchRequest {
    pub user_id: Uuid,
}

/// Batch status update
#[derive(Debug, Serialize, Deserialize)]
pub struct BulkStatusRequest {
    pub ids: Vec<Uuid>,
    pub status: LetterStatus,
}

/// Batch update outcome
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkStatusResult {
    pub updated: u64,
    pub missing: Vec<Uuid>,
}

// ============ Comments & Attachments ============

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentCreate {
    pub author_id: Uuid,
    pub body: String,
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttachmentCreate {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_by: Uuid,
}

// ============ Users ============

#[derive(Debug, Serialize, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

// ============ Notifications ============

/// One surfaced notification entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationItem {
    pub id: Uuid,
    pub number: u64,
    pub org: String,
    pub deadline_date: Option<DateTime<Utc>>,
    /// Resolved name of the responsible staff member
    pub owner: Option<String>,
}

/// Surfaced notification collection
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationList {
    pub filter: String,
    pub letters: Vec<NotificationItem>,
}

// ============ Portal ============

/// Applicant-facing read view of a letter
#[derive(Debug, Serialize, Deserialize)]
pub struct PortalView {
    pub number: u64,
    pub subject: String,
    pub org: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub deadline_date: Option<DateTime<Utc>>,
    pub sla: SlaView,
    pub comments: Vec<PortalComment>,
}

/// Public comment as shown on the portal
#[derive(Debug, Serialize, Deserialize)]
pub struct PortalComment {
    pub author: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

pub fn comment_view(comment: &Comment, author: Option<&User>) -> PortalComment {
    PortalComment {
        author: author.map(|u| u.name.clone()),
        body: comment.body.clone(),
        created_at: comment.created_at,
    }
}

// ============ Errors ============

/// Handler error carrying the status code and the response envelope
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "not_found",
            message: format!("{what} not found"),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<()>::error(self.code, &self.message));
        (self.status, body).into_response()
    }
}

impl From<LetterError> for ApiError {
    fn from(err: LetterError) -> Self {
        let status = match err {
            LetterError::NotCompleted(_) => StatusCode::CONFLICT,
            _ => StatusCode::NOT_FOUND,
        };
        let code = match err {
            LetterError::NotCompleted(_) => "invalid_state",
            _ => "not_found",
        };
        Self { status, code, message: err.to_string() }
    }
}

impl From<StatusCode> for ApiError {
    fn from(status: StatusCode) -> Self {
        let code = match status {
            StatusCode::UNAUTHORIZED => "unauthorized",
            StatusCode::FORBIDDEN => "forbidden",
            StatusCode::TOO_MANY_REQUESTS => "rate_limited",
            _ => "error",
        };
        Self { status, code, message: status.to_string() }
    }
}

/// Standard handler result: success envelope or enveloped error
pub type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;
