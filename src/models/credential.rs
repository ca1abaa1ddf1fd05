use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OAuth token bundle persisted for the whole deployment (single shared
/// credential, no per-user identity). Stored as an encrypted cookie; read
/// by OAuth-backed adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredCredential {
    /// Structural validity only. There is no refresh flow: an expired or
    /// rejected token means the operator must re-authenticate.
    pub fn is_usable(&self) -> bool {
        !self.access_token.is_empty()
    }
}
