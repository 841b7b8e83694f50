//! DMED Letters REST API
//!
//! CRUD/workflow surface over the letters domain core, plus the polling
//! endpoints that surface overdue and urgent letters.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        LETTERS API                            │
//! │                                                               │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │                      REST API                           │  │
//! │  │  OpenAPI 3.1 | API Keys | Rate Limiting | Portal Tokens │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │                                                               │
//! │  letters ──► SLA classifier ──► progress projection ──► views │
//! │     │                                                         │
//! │     └──► overdue/urgent queries ──► polling clients           │
//! │     └──► event fan-out ──► webhook subscribers                │
//! └───────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod middleware;
pub mod models;
pub mod notifier;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::{routing::get, Router};
use letters_core::MemorySnoozeStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::ApiConfig;
pub use models::*;
pub use store::Store;

use middleware::rate_limit::RateLimiter;
use notifier::NotificationDispatch;

/// Shared API state
pub struct ApiState {
    pub store: Store,
    pub snooze: MemorySnoozeStore,
    pub notifier: NotificationDispatch,
    pub limiter: RateLimiter,
    pub config: ApiConfig,
}

impl ApiState {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            store: Store::new(),
            snooze: MemorySnoozeStore::new(),
            notifier: NotificationDispatch::new(),
            limiter: RateLimiter::new(config.rate_per_minute),
            config,
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "DMED Letters API",
        version = "1.0.0",
        description = "Correspondence tracking with working-day SLA deadlines",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::letters::list_letters,
        routes::letters::get_letter,
        routes::letters::create_letter,
        routes::letters::bulk_status,
        routes::notifications::list_notifications,
    ),
    components(
        schemas(
            ErrorResponse,
            LetterResponse, LettersPageResponse, NotificationsResponse, BulkStatusResponse,
            LettersPage, LetterView, SlaView,
            LetterCreate, LetterUpdate, BulkStatusResult,
            NotificationItem, NotificationList,
            routes::health::HealthResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "letters", description = "Letter registration and workflow"),
        (name = "notifications", description = "Overdue/urgent polling surface"),
    )
)]
pub struct ApiDoc;

/// Build the API router
pub fn build_router(state: Arc<ApiState>) -> Router {
    let api = api_routes().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::auth::require_api_key,
    ));

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health::health_check))
        // Applicants authenticate with the letter token, not an API key
        .nest("/api/v1/portal", routes::portal::router())
        .nest("/api/v1", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<Arc<ApiState>> {
    Router::new()
        .nest("/letters", routes::letters::router())
        .nest("/letters/:id/comments", routes::comments::router())
        .nest("/letters/:id/attachments", routes::attachments::router())
        .nest("/users", routes::users::router())
        .nest("/notifications", routes::notifications::router())
}
