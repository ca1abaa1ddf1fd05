use async_trait::async_trait;
use serde_json::json;

use super::drive::{DriveClient, voice_memo_note};
use super::{BackendAdapter, BackendError, ErrorKind, http_client, provider_error_message};
use crate::config::{Config, SheetsConfig};
use crate::models::{StoredCredential, StoredFile, StoredRecord, Submission};

/// Same row-append as the service-account variant, authenticated with the
/// operator's stored OAuth credential. Audio goes to Drive first (with the
/// same token) and the resulting link lands in the row.
pub struct SheetsOauthAdapter {
    sheets: Result<SheetsConfig, String>,
    api_url: String,
    drive: DriveClient,
    client: reqwest::Client,
}

impl SheetsOauthAdapter {
    pub fn new(config: &Config) -> Self {
        Self {
            sheets: config.sheets.clone(),
            api_url: config.endpoints.sheets_api_url.clone(),
            drive: DriveClient::new(
                http_client(),
                &config.endpoints,
                config.drive_folder_id.clone(),
            ),
            client: http_client(),
        }
    }

    fn sheets(&self) -> Result<&SheetsConfig, BackendError> {
        self.sheets
            .as_ref()
            .map_err(|msg| BackendError::configuration(msg.clone()))
    }

    /// A 401 from Google means the stored credential is stale or revoked,
    /// which the operator fixes by signing in again.
    fn reauth_on_401(err: BackendError) -> BackendError {
        if err.kind == ErrorKind::AuthRejected {
            BackendError::new(
                ErrorKind::AuthRejected,
                "Google rejected the stored credential - sign in again at /auth/start",
            )
        } else {
            err
        }
    }
}

#[async_trait]
impl BackendAdapter for SheetsOauthAdapter {
    fn id(&self) -> &str {
        "sheets-oauth"
    }

    fn name(&self) -> &str {
        "Google Sheets (OAuth)"
    }

    fn requires_credential(&self) -> bool {
        true
    }

    /// Presence checks only; the credential arrives per-request, so there
    /// is nothing to probe ahead of time.
    async fn validate_config(&self) -> Result<(), BackendError> {
        self.sheets()?;
        Ok(())
    }

    async fn store(
        &self,
        submission: &Submission,
        audio: Option<&StoredFile>,
        credential: Option<&StoredCredential>,
    ) -> Result<StoredRecord, BackendError> {
        let sheets = self.sheets()?;

        let credential = credential.filter(|c| c.is_usable()).ok_or_else(|| {
            BackendError::new(ErrorKind::AuthRejected, "No stored Google credential")
        })?;
        let token = &credential.access_token;

        let audio_link = match audio {
            Some(file) => {
                let note = voice_memo_note(submission);
                let uploaded = self
                    .drive
                    .upload(token, file, &note)
                    .await
                    .map_err(Self::reauth_on_401)?;
                Some(uploaded.web_view_link)
            }
            None => None,
        };

        let row = vec![
            json!(chrono::Utc::now().to_rfc3339()),
            json!(submission.name.as_deref().unwrap_or("")),
            json!(submission.company.as_deref().unwrap_or("")),
            json!(submission.message),
            json!(if audio_link.is_some() { "Yes" } else { "No" }),
            json!(audio_link.as_deref().unwrap_or("")),
        ];

        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}:append?valueInputOption=USER_ENTERED",
            self.api_url, sheets.sheet_id, sheets.range
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .map_err(|e| BackendError::transport("Google Sheets append", e))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = provider_error_message(resp).await;
            return Err(Self::reauth_on_401(BackendError::classify(
                status,
                format!("Google Sheets append failed: {detail}"),
            )));
        }

        tracing::debug!(sheet_id = %sheets.sheet_id, "Sheet row appended");
        Ok(StoredRecord {
            reference: "appended".to_string(),
            audio_link,
        })
    }
}
