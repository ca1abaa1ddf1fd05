use async_trait::async_trait;
use serde_json::json;

use super::{BackendAdapter, BackendError, google, http_client, provider_error_message};
use crate::config::{Config, ServiceAccountConfig, SheetsConfig};
use crate::models::{StoredCredential, StoredFile, StoredRecord, Submission};

/// Appends one row per submission using long-lived service-account
/// credentials. The append API returns no row id, so the reference is the
/// literal "appended".
pub struct SheetsAdapter {
    sa: Result<ServiceAccountConfig, String>,
    sheets: Result<SheetsConfig, String>,
    api_url: String,
    token_url: String,
    client: reqwest::Client,
}

impl SheetsAdapter {
    pub fn new(config: &Config) -> Self {
        Self {
            sa: config.service_account.clone(),
            sheets: config.sheets.clone(),
            api_url: config.endpoints.sheets_api_url.clone(),
            token_url: config.endpoints.token_url.clone(),
            client: http_client(),
        }
    }

    fn sa(&self) -> Result<&ServiceAccountConfig, BackendError> {
        self.sa
            .as_ref()
            .map_err(|msg| BackendError::configuration(msg.clone()))
    }

    fn sheets(&self) -> Result<&SheetsConfig, BackendError> {
        self.sheets
            .as_ref()
            .map_err(|msg| BackendError::configuration(msg.clone()))
    }

    async fn append_row(
        &self,
        token: &str,
        sheets: &SheetsConfig,
        row: Vec<serde_json::Value>,
    ) -> Result<(), BackendError> {
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
            return Err(BackendError::classify(
                status,
                format!("Google Sheets append failed: {detail}"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl BackendAdapter for SheetsAdapter {
    fn id(&self) -> &str {
        "sheets"
    }

    fn name(&self) -> &str {
        "Google Sheets (service account)"
    }

    /// Mint a token, then a read-only metadata probe of the spreadsheet.
    async fn validate_config(&self) -> Result<(), BackendError> {
        let sa = self.sa()?;
        let sheets = self.sheets()?;

        let token =
            google::service_account_token(&self.client, sa, &self.token_url, google::SCOPE_SHEETS)
                .await?;

        let url = format!(
            "{}/v4/spreadsheets/{}?fields=spreadsheetId",
            self.api_url, sheets.sheet_id
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| BackendError::transport("Google Sheets metadata", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                404 => BackendError::classify(
                    status,
                    format!(
                        "Spreadsheet '{}' not found - check GOOGLE_SHEET_ID and share the \
                         sheet with the service account",
                        sheets.sheet_id
                    ),
                ),
                _ => BackendError::classify(
                    status,
                    format!("Google Sheets metadata request returned {status}"),
                ),
            });
        }
        Ok(())
    }

    async fn store(
        &self,
        submission: &Submission,
        _audio: Option<&StoredFile>,
        _credential: Option<&StoredCredential>,
    ) -> Result<StoredRecord, BackendError> {
        let sa = self.sa()?;
        let sheets = self.sheets()?;

        let token =
            google::service_account_token(&self.client, sa, &self.token_url, google::SCOPE_SHEETS)
                .await?;

        let row = vec![
            json!(chrono::Utc::now().to_rfc3339()),
            json!(submission.name.as_deref().unwrap_or("")),
            json!(submission.company.as_deref().unwrap_or("")),
            json!(submission.message),
        ];
        self.append_row(&token, sheets, row).await?;

        tracing::debug!(sheet_id = %sheets.sheet_id, "Sheet row appended");
        Ok(StoredRecord::new("appended"))
    }
}
