use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use serde_json::{Value, json};

use crate::auth::cookie;
use crate::backend::drive::voice_memo_note;
use crate::backend::google::{self, SCOPE_DRIVE_FILE};
use crate::error::AppError;
use crate::state::SharedState;
use crate::submission::{audio, parser};

/// Standalone voice-memo upload to Google Drive, used when the audio is
/// stored separately from the submission row. Authenticates with the
/// service account when configured, otherwise the operator's stored
/// OAuth credential.
pub async fn upload_audio(
    State(state): State<SharedState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let parsed = parser::parse_multipart(&headers, body)
        .await
        .map_err(AppError::InvalidInput)?;

    let Some(raw_audio) = parsed.audio else {
        return Err(AppError::InvalidInput("No audio file provided".to_string()));
    };
    let submission = parsed.submission;

    let file = audio::build_stored_file(
        raw_audio.bytes,
        raw_audio.content_type.as_deref(),
        submission.name.as_deref(),
    );

    let token = resolve_drive_token(&state, &jar).await?;
    let note = voice_memo_note(&submission);

    let uploaded = state
        .drive
        .upload(&token, &file, &note)
        .await
        .map_err(AppError::from)?;

    Ok(Json(json!({
        "success": true,
        "fileId": uploaded.file_id,
        "fileName": uploaded.file_name,
        "webViewLink": uploaded.web_view_link,
    })))
}

async fn resolve_drive_token(state: &SharedState, jar: &CookieJar) -> Result<String, AppError> {
    if let Ok(sa) = &state.config.service_account {
        let token = google::service_account_token(
            &state.http,
            sa,
            &state.config.endpoints.token_url,
            SCOPE_DRIVE_FILE,
        )
        .await?;
        return Ok(token);
    }

    cookie::read_credential(jar, &state.config.credential_key)
        .filter(|c| c.is_usable())
        .map(|c| c.access_token)
        .ok_or_else(|| {
            AppError::AuthenticationRequired(
                "Authentication required - connect Google Drive at /auth/start".to_string(),
            )
        })
}
