use axum::http::HeaderMap;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::Submission;

/// A decoded request body: the submission fields plus the raw audio bytes,
/// before any filename or content-type generation happens.
pub struct ParsedSubmission {
    pub submission: Submission,
    pub audio: Option<RawAudio>,
}

pub struct RawAudio {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

#[derive(Deserialize)]
struct SubmitBody {
    name: Option<String>,
    company: Option<String>,
    #[serde(default)]
    message: String,
    email: Option<String>,
    #[serde(rename = "voiceRecording")]
    voice_recording: Option<String>,
    #[serde(rename = "voiceRecordingType")]
    voice_recording_type: Option<String>,
}

/// Parse a request body based on Content-Type header. Multipart bodies go
/// through `parse_multipart` instead.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<ParsedSubmission, String> {
    let ct = content_type.unwrap_or("application/json");

    if ct.contains("application/json") {
        parse_json(body)
    } else if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)
    } else {
        // Try JSON first, then form-urlencoded
        parse_json(body).or_else(|_| parse_form_urlencoded(body))
    }
}

fn parse_json(body: &[u8]) -> Result<ParsedSubmission, String> {
    let parsed: SubmitBody =
        serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?;

    let audio = match parsed.voice_recording {
        Some(encoded) if !encoded.is_empty() => {
            Some(decode_voice_recording(&encoded, parsed.voice_recording_type)?)
        }
        _ => None,
    };

    Ok(ParsedSubmission {
        submission: Submission {
            name: non_empty(parsed.name),
            company: non_empty(parsed.company),
            message: parsed.message,
            email: non_empty(parsed.email),
        },
        audio,
    })
}

/// JSON clients send the recording as base64, optionally wrapped in a data
/// URL (`data:audio/webm;base64,...`), which also carries the content type.
fn decode_voice_recording(
    encoded: &str,
    declared_type: Option<String>,
) -> Result<RawAudio, String> {
    let (content_type, payload) = match encoded.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| "Invalid data URL in voiceRecording".to_string())?;
            let mime = header.trim_end_matches(";base64");
            let mime = if mime.is_empty() { None } else { Some(mime.to_string()) };
            (mime.or(declared_type), data)
        }
        None => (declared_type, encoded),
    };

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| format!("Invalid base64 in voiceRecording: {e}"))?;

    Ok(RawAudio {
        bytes: Bytes::from(bytes),
        content_type,
    })
}

fn parse_form_urlencoded(body: &[u8]) -> Result<ParsedSubmission, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    let mut pairs: HashMap<String, String> = form_urlencoded::parse(body_str.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Ok(ParsedSubmission {
        submission: Submission {
            name: non_empty(pairs.remove("name")),
            company: non_empty(pairs.remove("company")),
            message: pairs.remove("message").unwrap_or_default(),
            email: non_empty(pairs.remove("email")),
        },
        audio: None,
    })
}

/// Parse multipart form data using multer. The audio part may arrive under
/// either name the historical clients used.
pub async fn parse_multipart(
    headers: &HeaderMap,
    body: Bytes,
) -> Result<ParsedSubmission, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields: HashMap<String, String> = HashMap::new();
    let mut audio: Option<RawAudio> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let name = field.name().unwrap_or("unknown").to_string();

        if name == "audio" || name == "voiceRecording" {
            let content_type = field.content_type().map(|m| m.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| format!("Audio read error: {e}"))?;
            if !bytes.is_empty() {
                audio = Some(RawAudio {
                    bytes,
                    content_type,
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| format!("Field read error: {e}"))?;
            fields.insert(name, value);
        }
    }

    Ok(ParsedSubmission {
        submission: Submission {
            name: non_empty(fields.remove("name")),
            company: non_empty(fields.remove("company")),
            message: fields.remove("message").unwrap_or_default(),
            email: non_empty(fields.remove("email")),
        },
        audio,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
