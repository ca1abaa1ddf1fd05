use std::net::SocketAddr;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use serde_json::{Value, json};

use crate::auth::cookie;
use crate::error::AppError;
use crate::net;
use crate::state::SharedState;
use crate::submission::{parser, pipeline};

pub async fn submit(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let ip = net::client_ip(&headers, Some(addr.ip()), &state.config.trusted_proxies);
    if let Err(retry_after) = state.submission_limiter.check(
        ip,
        state.config.rate_limit,
        state.config.rate_limit_window_secs,
    ) {
        return Err(AppError::RateLimited(format!(
            "Rate limited. Retry after {retry_after}s"
        )));
    }

    let content_type = headers.get("content-type").and_then(|v| v.to_str().ok());

    let parsed = if content_type.is_some_and(|ct| ct.contains("multipart/form-data")) {
        parser::parse_multipart(&headers, body)
            .await
            .map_err(AppError::InvalidInput)?
    } else {
        parser::parse_body(content_type, &body).map_err(AppError::InvalidInput)?
    };

    let credential = cookie::read_credential(&jar, &state.config.credential_key);

    let record = pipeline::run(&state, parsed, credential).await?;

    let mut response = json!({
        "success": true,
        "recordId": record.reference,
    });
    if let Some(link) = record.audio_link {
        response["voiceRecordingUrl"] = json!(link);
    }

    Ok(Json(response))
}
