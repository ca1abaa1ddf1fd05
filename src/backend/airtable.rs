use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;

use super::{BackendAdapter, BackendError, ErrorKind, http_client, provider_error_message};
use crate::config::{AirtableConfig, Config};
use crate::models::{StoredCredential, StoredFile, StoredRecord, Submission};

/// Writes each submission as one record with a fixed column set; audio is
/// attached inline as base64.
pub struct AirtableAdapter {
    cfg: Result<AirtableConfig, String>,
    api_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TableListing {
    tables: Option<Vec<TableInfo>>,
}

#[derive(Deserialize)]
struct TableInfo {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct CreatedRecord {
    id: String,
}

impl AirtableAdapter {
    pub fn new(config: &Config) -> Self {
        Self {
            cfg: config.airtable.clone(),
            api_url: config.endpoints.airtable_api_url.clone(),
            client: http_client(),
        }
    }

    fn cfg(&self) -> Result<&AirtableConfig, BackendError> {
        self.cfg
            .as_ref()
            .map_err(|msg| BackendError::configuration(msg.clone()))
    }
}

#[async_trait]
impl BackendAdapter for AirtableAdapter {
    fn id(&self) -> &str {
        "airtable"
    }

    fn name(&self) -> &str {
        "Airtable"
    }

    /// Live metadata read: the configured table must exist among the tables
    /// the token can see. An empty or unreadable listing fails closed.
    async fn validate_config(&self) -> Result<(), BackendError> {
        let cfg = self.cfg()?;

        let url = format!("{}/v0/meta/bases/{}/tables", self.api_url, cfg.base_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&cfg.personal_access_token)
            .send()
            .await
            .map_err(|e| BackendError::transport("Airtable metadata", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 => BackendError::new(
                    ErrorKind::AuthRejected,
                    "Invalid AIRTABLE_PERSONAL_ACCESS_TOKEN - check your token permissions",
                ),
                403 => BackendError::new(
                    ErrorKind::PermissionDenied,
                    "Access forbidden - the token needs 'data.records:write' and \
                     'schema.bases:read' scopes for this base",
                ),
                404 => BackendError::new(
                    ErrorKind::NotFound,
                    "Invalid AIRTABLE_BASE_ID - base not found or no access",
                ),
                _ => BackendError::upstream(format!("Airtable metadata request returned {status}")),
            });
        }

        let listing: TableListing = resp
            .json()
            .await
            .map_err(|e| BackendError::upstream(format!("Unreadable Airtable metadata: {e}")))?;

        let tables = listing
            .tables
            .ok_or_else(|| BackendError::upstream("Airtable metadata response had no table listing"))?;

        let exists = tables
            .iter()
            .any(|t| t.id == cfg.table_id || t.name == cfg.table_id);

        if !exists {
            let available = tables
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let available = if available.is_empty() {
                "none".to_string()
            } else {
                available
            };
            return Err(BackendError::new(
                ErrorKind::NotFound,
                format!(
                    "Table '{}' not found. Available tables: {available}",
                    cfg.table_id
                ),
            ));
        }

        Ok(())
    }

    async fn store(
        &self,
        submission: &Submission,
        audio: Option<&StoredFile>,
        _credential: Option<&StoredCredential>,
    ) -> Result<StoredRecord, BackendError> {
        let cfg = self.cfg()?;

        let mut fields = json!({
            "Name": submission.name.as_deref().unwrap_or(""),
            "Company": submission.company.as_deref().unwrap_or(""),
            "Message": submission.message,
        });

        if let Some(file) = audio {
            fields["Voice Recording"] = json!([{
                "filename": file.file_name,
                "content": BASE64.encode(&file.bytes),
                "contentType": file.content_type,
            }]);
        }

        let url = format!("{}/v0/{}/{}", self.api_url, cfg.base_id, cfg.table_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&cfg.personal_access_token)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| BackendError::transport("Airtable record create", e))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = provider_error_message(resp).await;
            return Err(BackendError::classify(
                status,
                format!("Airtable record create failed: {detail}"),
            ));
        }

        let created: CreatedRecord = resp
            .json()
            .await
            .map_err(|e| BackendError::upstream(format!("Unreadable Airtable response: {e}")))?;

        tracing::debug!(record_id = %created.id, "Airtable record created");
        Ok(StoredRecord::new(created.id))
    }
}
