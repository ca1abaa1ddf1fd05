use crate::error::AppError;
use crate::models::{StoredCredential, StoredRecord};
use crate::state::SharedState;

use super::audio;
use super::parser::ParsedSubmission;

/// Run one submission through the pipeline: validate, resolve the
/// credential, validate backend config, prepare the audio file, store.
/// Terminal on first failure; nothing is queued or retried.
pub async fn run(
    state: &SharedState,
    parsed: ParsedSubmission,
    credential: Option<StoredCredential>,
) -> Result<StoredRecord, AppError> {
    let submission = parsed.submission;

    if submission.message.trim().is_empty() {
        return Err(AppError::InvalidInput("Message is required".to_string()));
    }

    let adapter = &state.backend;

    let credential = credential.filter(|c| c.is_usable());
    if adapter.requires_credential() && credential.is_none() {
        return Err(AppError::AuthenticationRequired(
            "Authentication required".to_string(),
        ));
    }

    adapter
        .validate_config()
        .await
        .map_err(|e| AppError::Configuration(e.message))?;

    let file = parsed.audio.map(|a| {
        audio::build_stored_file(a.bytes, a.content_type.as_deref(), submission.name.as_deref())
    });

    tracing::info!(
        backend = adapter.id(),
        has_audio = file.is_some(),
        "Storing submission"
    );

    let record = adapter
        .store(&submission, file.as_ref(), credential.as_ref())
        .await
        .map_err(|e| {
            tracing::warn!(backend = adapter.id(), "Store failed: {e}");
            AppError::from(e)
        })?;

    tracing::info!(
        backend = adapter.id(),
        reference = %record.reference,
        "Submission stored"
    );

    Ok(record)
}
