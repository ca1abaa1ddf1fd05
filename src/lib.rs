pub mod auth;
pub mod backend;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod net;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod submission;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::backend::drive::DriveClient;
use crate::config::Config;
use crate::rate_limit::SubmissionRateLimiter;
use crate::state::{AppState, SharedState};

pub fn build_app(config: Config) -> Router {
    let backend = backend::build_adapter(&config);
    tracing::info!(backend = backend.id(), "Storage backend selected");

    let drive = DriveClient::new(
        backend::http_client(),
        &config.endpoints,
        config.drive_folder_id.clone(),
    );

    let max_body_size = config.max_body_size;

    let state: SharedState = Arc::new(AppState {
        backend,
        drive,
        http: backend::http_client(),
        submission_limiter: SubmissionRateLimiter::new(),
        config,
    });

    Router::new()
        .merge(routes::form_routes())
        .merge(routes::auth_routes())
        .route("/health", axum::routing::get(health))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
