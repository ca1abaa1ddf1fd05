use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::BackendError;
use crate::config::ProviderEndpoints;
use crate::models::{StoredFile, Submission};

/// Uploads voice memos to Google Drive. Shared by the standalone
/// `/upload-audio` endpoint and the Sheets-OAuth adapter.
pub struct DriveClient {
    client: reqwest::Client,
    api_url: String,
    upload_url: String,
    folder_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DriveFile {
    pub file_id: String,
    pub file_name: String,
    pub web_view_link: String,
}

#[derive(Deserialize)]
struct DriveCreateResponse {
    id: String,
}

impl DriveClient {
    pub fn new(
        client: reqwest::Client,
        endpoints: &ProviderEndpoints,
        folder_id: Option<String>,
    ) -> Self {
        Self {
            client,
            api_url: endpoints.drive_api_url.clone(),
            upload_url: endpoints.drive_upload_url.clone(),
            folder_id,
        }
    }

    /// Multipart-related upload of the audio bytes plus file metadata.
    /// Granting public read afterwards is allowed to fail; the upload
    /// itself is not.
    pub async fn upload(
        &self,
        token: &str,
        file: &StoredFile,
        note: &str,
    ) -> Result<DriveFile, BackendError> {
        let mut metadata = json!({
            "name": file.file_name,
            "description": note,
        });
        if let Some(folder) = &self.folder_id {
            metadata["parents"] = json!([folder]);
        }

        let boundary = format!("hotline-{}", Uuid::new_v4());
        let body = multipart_related(&boundary, &metadata, file);

        let resp = self
            .client
            .post(format!("{}?uploadType=multipart&fields=id", self.upload_url))
            .bearer_auth(token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| BackendError::transport("Google Drive upload", e))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = super::provider_error_message(resp).await;
            return Err(BackendError::classify(
                status,
                format!("Google Drive upload failed: {detail}"),
            ));
        }

        let created: DriveCreateResponse = resp
            .json()
            .await
            .map_err(|e| BackendError::upstream(format!("Unreadable Drive response: {e}")))?;

        if let Err(e) = self.grant_public_read(token, &created.id).await {
            tracing::warn!(file_id = %created.id, "Drive permission grant failed: {e}");
        }

        tracing::debug!(file_id = %created.id, file_name = %file.file_name, "Drive upload complete");

        Ok(DriveFile {
            web_view_link: format!("https://drive.google.com/file/d/{}/view", created.id),
            file_id: created.id,
            file_name: file.file_name.clone(),
        })
    }

    async fn grant_public_read(&self, token: &str, file_id: &str) -> Result<(), BackendError> {
        let resp = self
            .client
            .post(format!(
                "{}/drive/v3/files/{file_id}/permissions",
                self.api_url
            ))
            .bearer_auth(token)
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(|e| BackendError::transport("Google Drive permissions", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::classify(
                status,
                format!("permissions.create returned {status}"),
            ));
        }
        Ok(())
    }
}

/// Descriptive note stored on the Drive file.
pub fn voice_memo_note(submission: &Submission) -> String {
    format!(
        "Voice memo from {} ({}) - {}",
        submission.name_or_anonymous(),
        submission.company_or_na(),
        chrono::Utc::now().to_rfc3339(),
    )
}

fn multipart_related(boundary: &str, metadata: &serde_json::Value, file: &StoredFile) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(
        format!("\r\n--{boundary}\r\nContent-Type: {}\r\n\r\n", file.content_type).as_bytes(),
    );
    body.extend_from_slice(&file.bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipart_body_carries_metadata_and_media() {
        let file = StoredFile {
            file_name: "voice-memo-x.webm".to_string(),
            content_type: "audio/webm".to_string(),
            bytes: bytes::Bytes::from_static(b"RIFFdata"),
        };
        let metadata = json!({ "name": file.file_name });
        let body = multipart_related("b123", &metadata, &file);
        let text = String::from_utf8_lossy(&body);

        assert!(text.starts_with("--b123\r\n"));
        assert!(text.contains("Content-Type: application/json"));
        assert!(text.contains("voice-memo-x.webm"));
        assert!(text.contains("Content-Type: audio/webm"));
        assert!(text.contains("RIFFdata"));
        assert!(text.trim_end().ends_with("--b123--"));
    }
}
