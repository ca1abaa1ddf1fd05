use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::backend::google::{SCOPE_DRIVE_FILE, SCOPE_SHEETS};
use crate::config::OauthConfig;
use crate::error::AppError;
use crate::models::StoredCredential;

/// Build the Google consent screen URL. `access_type=offline` plus
/// `prompt=consent` so a refresh token is issued even on re-authorization.
pub fn consent_url(cfg: &OauthConfig, auth_url: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", &cfg.client_id)
        .append_pair("redirect_uri", &cfg.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &format!("{SCOPE_SHEETS} {SCOPE_DRIVE_FILE}"))
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .finish();
    format!("{auth_url}?{query}")
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// Exchange the authorization code for a token bundle.
pub async fn exchange_code(
    client: &reqwest::Client,
    cfg: &OauthConfig,
    token_url: &str,
    code: &str,
) -> Result<StoredCredential, AppError> {
    let resp = client
        .post(token_url)
        .form(&[
            ("code", code),
            ("client_id", &cfg.client_id),
            ("client_secret", &cfg.client_secret),
            ("redirect_uri", &cfg.redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Token exchange request failed: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(AppError::Upstream(format!(
            "Failed to exchange code for tokens ({status})"
        )));
    }

    let token: TokenResponse = resp
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Unreadable token response: {e}")))?;

    Ok(StoredCredential {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at: token
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs)),
    })
}
