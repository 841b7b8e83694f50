//! DMED Letters API server
//!
//! Binds the HTTP listener and runs the periodic deadline scan that feeds
//! the notification dispatcher.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use letters_api::{build_router, notifier, ApiConfig, ApiState};

/// How often the deadline scan and delivery queue run
const SCAN_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();
    let state = Arc::new(ApiState::new(config));
    let admin = state.store.seed_admin();
    tracing::info!(admin = %admin.email, "seeded default admin");

    let scanner = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SCAN_INTERVAL);
        loop {
            interval.tick().await;
            let now = Utc::now();
            notifier::publish_deadline_events(
                &scanner.store,
                &scanner.snooze,
                &scanner.notifier,
                now,
            );
            scanner.notifier.process(now).await;
        }
    });

    let addr = state.config.listen_addr.clone();
    let app = build_router(state);

    tracing::info!("letters API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
