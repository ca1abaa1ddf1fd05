use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;

use super::{BackendAdapter, BackendError, ErrorKind, http_client, provider_error_message};
use crate::config::{Config, SupabaseConfig};
use crate::models::{StoredCredential, StoredFile, StoredRecord, Submission};

/// Managed-storage variant: audio goes to a storage bucket, the submission
/// row goes into a Postgres table via PostgREST, and the row id is the
/// reference.
pub struct SupabaseAdapter {
    cfg: Result<SupabaseConfig, String>,
    client: reqwest::Client,
}

impl SupabaseAdapter {
    pub fn new(config: &Config) -> Self {
        Self {
            cfg: config.supabase.clone(),
            client: http_client(),
        }
    }

    fn cfg(&self) -> Result<&SupabaseConfig, BackendError> {
        self.cfg
            .as_ref()
            .map_err(|msg| BackendError::configuration(msg.clone()))
    }

    async fn upload_audio(
        &self,
        cfg: &SupabaseConfig,
        file: &StoredFile,
    ) -> Result<String, BackendError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            cfg.url, cfg.bucket, file.file_name
        );

        let resp = self
            .client
            .post(&url)
            .header("apikey", &cfg.service_role_key)
            .bearer_auth(&cfg.service_role_key)
            .header(CONTENT_TYPE, &file.content_type)
            .body(file.bytes.clone())
            .send()
            .await
            .map_err(|e| BackendError::transport("Supabase storage upload", e))?;

        let status = resp.status();
        if !status.is_success() {
            if status.as_u16() == 404 {
                return Err(BackendError::new(
                    ErrorKind::NotFound,
                    format!(
                        "Storage bucket '{}' not found - create it before accepting voice memos",
                        cfg.bucket
                    ),
                ));
            }
            let detail = provider_error_message(resp).await;
            return Err(BackendError::classify(
                status,
                format!("Supabase storage upload failed: {detail}"),
            ));
        }

        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            cfg.url, cfg.bucket, file.file_name
        ))
    }
}

#[async_trait]
impl BackendAdapter for SupabaseAdapter {
    fn id(&self) -> &str {
        "supabase"
    }

    fn name(&self) -> &str {
        "Supabase"
    }

    /// Read-only probe of the submissions table; confirms the key works
    /// and the table exists before anything is written.
    async fn validate_config(&self) -> Result<(), BackendError> {
        let cfg = self.cfg()?;

        let url = format!("{}/rest/v1/{}?select=id&limit=1", cfg.url, cfg.table);
        let resp = self
            .client
            .get(&url)
            .header("apikey", &cfg.service_role_key)
            .bearer_auth(&cfg.service_role_key)
            .send()
            .await
            .map_err(|e| BackendError::transport("Supabase table probe", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 => BackendError::new(
                    ErrorKind::AuthRejected,
                    "Invalid SUPABASE_SERVICE_ROLE_KEY",
                ),
                404 => BackendError::new(
                    ErrorKind::NotFound,
                    format!(
                        "Table '{}' not found - create it before accepting submissions",
                        cfg.table
                    ),
                ),
                _ => BackendError::classify(
                    status,
                    format!("Supabase table probe returned {status}"),
                ),
            });
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

        let voice_url = match audio {
            Some(file) => Some(self.upload_audio(cfg, file).await?),
            None => None,
        };

        let resp = self
            .client
            .post(format!("{}/rest/v1/{}", cfg.url, cfg.table))
            .header("apikey", &cfg.service_role_key)
            .bearer_auth(&cfg.service_role_key)
            .header("Prefer", "return=representation")
            .json(&json!({
                "name": submission.name,
                "company": submission.company,
                "message": submission.message,
                "email": submission.email,
                "voice_recording_url": voice_url,
            }))
            .send()
            .await
            .map_err(|e| BackendError::transport("Supabase insert", e))?;

        let status = resp.status();
        if !status.is_success() {
            if status.as_u16() == 404 {
                return Err(BackendError::new(
                    ErrorKind::NotFound,
                    format!(
                        "Table '{}' not found - create it before accepting submissions",
                        cfg.table
                    ),
                ));
            }
            let detail = provider_error_message(resp).await;
            return Err(BackendError::classify(
                status,
                format!("Supabase insert failed: {detail}"),
            ));
        }

        let rows: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| BackendError::upstream(format!("Unreadable Supabase response: {e}")))?;

        let reference = rows
            .get(0)
            .and_then(|row| row.get("id"))
            .map(|id| match id.as_str() {
                Some(s) => s.to_string(),
                None => id.to_string(),
            })
            .ok_or_else(|| BackendError::upstream("Supabase insert returned no row id"))?;

        tracing::debug!(row_id = %reference, "Supabase row inserted");
        Ok(StoredRecord {
            reference,
            audio_link: voice_url,
        })
    }
}
