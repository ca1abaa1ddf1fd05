use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::BackendError;
use crate::config::ServiceAccountConfig;

pub const SCOPE_SHEETS: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const SCOPE_DRIVE_FILE: &str = "https://www.googleapis.com/auth/drive.file";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange a signed service-account assertion for a short-lived access
/// token. The private key must already be newline-normalized (the config
/// layer does this).
pub async fn service_account_token(
    client: &reqwest::Client,
    sa: &ServiceAccountConfig,
    token_url: &str,
    scope: &str,
) -> Result<String, BackendError> {
    let now = chrono::Utc::now().timestamp();
    let claims = AssertionClaims {
        iss: &sa.client_email,
        scope,
        aud: token_url,
        iat: now,
        exp: now + 3600,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = sa.private_key_id.clone();

    let key = EncodingKey::from_rsa_pem(sa.private_key.as_bytes())
        .map_err(|e| BackendError::configuration(format!("Invalid GOOGLE_PRIVATE_KEY: {e}")))?;

    let assertion = jsonwebtoken::encode(&header, &claims, &key).map_err(|e| {
        BackendError::configuration(format!("Failed to sign service account assertion: {e}"))
    })?;

    let resp = client
        .post(token_url)
        .form(&[
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ])
        .send()
        .await
        .map_err(|e| BackendError::transport("Google token endpoint", e))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(BackendError::classify(
            status,
            format!("Google rejected the service account grant ({status})"),
        ));
    }

    let token: TokenResponse = resp
        .json()
        .await
        .map_err(|e| BackendError::upstream(format!("Unreadable token response: {e}")))?;

    Ok(token.access_token)
}
