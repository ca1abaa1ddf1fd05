use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::StoredFile;

const DEFAULT_CONTENT_TYPE: &str = "audio/webm";

/// Wrap raw audio bytes with the generated `voice-memo-<timestamp>[-<name>]`
/// filename and a resolved content type.
pub fn build_stored_file(
    bytes: Bytes,
    content_type: Option<&str>,
    submitter: Option<&str>,
) -> StoredFile {
    let content_type = content_type
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    let file_name = file_name(Utc::now(), &content_type, submitter);
    StoredFile {
        file_name,
        content_type,
        bytes,
    }
}

fn file_name(now: DateTime<Utc>, content_type: &str, submitter: Option<&str>) -> String {
    let stamp = timestamp_slug(now);
    let ext = extension_for(content_type);
    match submitter.map(sanitize).filter(|s| !s.is_empty()) {
        Some(name) => format!("voice-memo-{stamp}-{name}.{ext}"),
        None => format!("voice-memo-{stamp}.{ext}"),
    }
}

/// UTC ISO instant with the characters that are awkward in filenames and
/// URLs (`:` and `.`) replaced by dashes.
fn timestamp_slug(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

fn extension_for(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    match mime {
        "audio/webm" | "video/webm" => "webm",
        "audio/ogg" => "ogg",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/mp4" | "audio/x-m4a" | "audio/aac" => "m4a",
        "audio/wav" | "audio/x-wav" => "wav",
        _ => "webm",
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 31, 23, 59, 7).unwrap()
    }

    #[test]
    fn filename_without_submitter() {
        let name = file_name(fixed_instant(), "audio/webm", None);
        assert_eq!(name, "voice-memo-2025-10-31T23-59-07-000Z.webm");
    }

    #[test]
    fn filename_with_submitter() {
        let name = file_name(fixed_instant(), "audio/webm", Some("Ash Graves"));
        assert_eq!(name, "voice-memo-2025-10-31T23-59-07-000Z-Ash-Graves.webm");
    }

    #[test]
    fn submitter_is_sanitized_to_safe_characters() {
        let name = file_name(fixed_instant(), "audio/webm", Some("../etc/passwd?"));
        assert_eq!(name, "voice-memo-2025-10-31T23-59-07-000Z-..etcpasswd.webm");
    }

    #[test]
    fn extension_follows_content_type() {
        assert_eq!(extension_for("audio/ogg"), "ogg");
        assert_eq!(extension_for("audio/mpeg"), "mp3");
        assert_eq!(extension_for("audio/mp4"), "m4a");
        assert_eq!(extension_for("audio/webm;codecs=opus"), "webm");
        assert_eq!(extension_for("application/octet-stream"), "webm");
    }

    #[test]
    fn unknown_content_type_defaults_to_webm() {
        let file = build_stored_file(Bytes::from_static(b"x"), None, None);
        assert_eq!(file.content_type, "audio/webm");
        assert!(file.file_name.starts_with("voice-memo-"));
        assert!(file.file_name.ends_with(".webm"));
    }
}
