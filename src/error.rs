use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    InvalidInput(String),
    RateLimited(String),
    AuthenticationRequired(String),
    AuthenticationRejected(String),
    PermissionDenied(String),
    ResourceNotFound(String),
    MalformedRequest(String),
    Configuration(String),
    Upstream(String),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "Invalid Input: {msg}"),
            AppError::RateLimited(msg) => write!(f, "Rate Limited: {msg}"),
            AppError::AuthenticationRequired(msg) => write!(f, "Authentication Required: {msg}"),
            AppError::AuthenticationRejected(msg) => write!(f, "Authentication Rejected: {msg}"),
            AppError::PermissionDenied(msg) => write!(f, "Permission Denied: {msg}"),
            AppError::ResourceNotFound(msg) => write!(f, "Resource Not Found: {msg}"),
            AppError::MalformedRequest(msg) => write!(f, "Malformed Request: {msg}"),
            AppError::Configuration(msg) => write!(f, "Configuration Error: {msg}"),
            AppError::Upstream(msg) => write!(f, "Upstream Error: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            AppError::AuthenticationRequired(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::AuthenticationRejected(msg) => {
                tracing::error!("Backend rejected credentials: {msg}");
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
            AppError::PermissionDenied(msg) => {
                tracing::error!("Backend denied permission: {msg}");
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
            AppError::ResourceNotFound(msg) => {
                tracing::error!("Backend resource not found: {msg}");
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
            AppError::MalformedRequest(msg) => {
                tracing::error!("Backend rejected payload: {msg}");
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Configuration error: {msg}"),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
