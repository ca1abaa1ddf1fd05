pub mod auth;
pub mod submit;
pub mod upload;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use crate::state::SharedState;

/// The public form surface. CORS is permissive: the promo page may be
/// served from a different origin than this API.
pub fn form_routes() -> Router<SharedState> {
    Router::new()
        .route("/submit", post(submit::submit))
        .route("/upload-audio", post(upload::upload_audio))
        .layer(CorsLayer::permissive())
}

pub fn auth_routes() -> Router<SharedState> {
    Router::new()
        .route("/auth/start", get(auth::start))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/status", get(auth::status))
}
