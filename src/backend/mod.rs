pub mod airtable;
pub mod drive;
pub mod google;
pub mod sheets;
pub mod sheets_oauth;
pub mod supabase;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{BackendKind, Config};
use crate::error::AppError;
use crate::models::{StoredCredential, StoredFile, StoredRecord, Submission};

/// Failure classes shared by every adapter. Provider status codes are folded
/// into this table once, at the adapter boundary; raw provider errors never
/// cross it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AuthRejected,
    PermissionDenied,
    NotFound,
    Malformed,
    Configuration,
    Upstream,
}

#[derive(Debug)]
pub struct BackendError {
    pub kind: ErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upstream, message)
    }

    /// Map a provider HTTP status onto the shared taxonomy.
    pub fn classify(status: reqwest::StatusCode, message: impl Into<String>) -> Self {
        let kind = match status.as_u16() {
            401 => ErrorKind::AuthRejected,
            403 => ErrorKind::PermissionDenied,
            404 => ErrorKind::NotFound,
            422 => ErrorKind::Malformed,
            _ => ErrorKind::Upstream,
        };
        Self::new(kind, message)
    }

    /// Wrap a transport-level reqwest failure. Timeouts get their own note
    /// so they are distinguishable from connection errors in logs.
    pub fn transport(context: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::upstream(format!("{context} timed out"))
        } else {
            Self::upstream(format!("{context} request failed: {err}"))
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err.kind {
            ErrorKind::AuthRejected => AppError::AuthenticationRejected(err.message),
            ErrorKind::PermissionDenied => AppError::PermissionDenied(err.message),
            ErrorKind::NotFound => AppError::ResourceNotFound(err.message),
            ErrorKind::Malformed => AppError::MalformedRequest(err.message),
            ErrorKind::Configuration => AppError::Configuration(err.message),
            ErrorKind::Upstream => AppError::Upstream(err.message),
        }
    }
}

/// One storage target. Adapters own their HTTP client and translate their
/// provider's failures into `BackendError` before returning.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;

    /// Whether `store` needs the operator's OAuth credential.
    fn requires_credential(&self) -> bool {
        false
    }

    /// Confirm the configuration is complete and the target resource is
    /// reachable. Read-only; never touches stored data.
    async fn validate_config(&self) -> Result<(), BackendError>;

    async fn store(
        &self,
        submission: &Submission,
        audio: Option<&StoredFile>,
        credential: Option<&StoredCredential>,
    ) -> Result<StoredRecord, BackendError>;
}

/// Build the single adapter this deployment routes to.
pub fn build_adapter(config: &Config) -> Arc<dyn BackendAdapter> {
    match config.backend {
        BackendKind::Airtable => Arc::new(airtable::AirtableAdapter::new(config)),
        BackendKind::Sheets => Arc::new(sheets::SheetsAdapter::new(config)),
        BackendKind::SheetsOauth => Arc::new(sheets_oauth::SheetsOauthAdapter::new(config)),
        BackendKind::Supabase => Arc::new(supabase::SupabaseAdapter::new(config)),
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to build reqwest client")
}

/// Pull a human-readable message out of a provider error body, falling back
/// to the status line. Covers the `{"error": {"message": ...}}` shape used
/// by Airtable and Google and the flat `message`/`error` strings used by
/// Supabase.
pub async fn provider_error_message(resp: reqwest::Response) -> String {
    let status = resp.status();
    match resp.json::<serde_json::Value>().await {
        Ok(body) => body
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .or_else(|| body.get("message").and_then(|v| v.as_str()))
            .or_else(|| body.get("error").and_then(|v| v.as_str()))
            .map(|s| s.to_string())
            .unwrap_or_else(|| status.to_string()),
        Err(_) => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn status_codes_map_onto_the_taxonomy() {
        let cases = [
            (StatusCode::UNAUTHORIZED, ErrorKind::AuthRejected),
            (StatusCode::FORBIDDEN, ErrorKind::PermissionDenied),
            (StatusCode::NOT_FOUND, ErrorKind::NotFound),
            (StatusCode::UNPROCESSABLE_ENTITY, ErrorKind::Malformed),
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Upstream),
            (StatusCode::TOO_MANY_REQUESTS, ErrorKind::Upstream),
        ];
        for (status, kind) in cases {
            assert_eq!(BackendError::classify(status, "x").kind, kind);
        }
    }

    #[test]
    fn backend_errors_surface_as_app_errors() {
        let err: AppError = BackendError::new(ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, AppError::ResourceNotFound(_)));

        let err: AppError = BackendError::configuration("no vars").into();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
