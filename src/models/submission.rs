use serde::{Deserialize, Serialize};

/// One visitor story, as received from the form. Built once per request
/// and consumed exactly once by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub name: Option<String>,
    pub company: Option<String>,
    pub message: String,
    pub email: Option<String>,
}

impl Submission {
    pub fn name_or_anonymous(&self) -> &str {
        self.name.as_deref().filter(|s| !s.is_empty()).unwrap_or("Anonymous")
    }

    pub fn company_or_na(&self) -> &str {
        self.company.as_deref().filter(|s| !s.is_empty()).unwrap_or("N/A")
    }
}

/// Audio bytes wrapped with the generated filename and content type,
/// ready for whichever encoding the selected backend needs.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: bytes::Bytes,
}

/// Reference to the record a backend created, plus the public link to the
/// audio when it was uploaded out-of-band.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRecord {
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_link: Option<String>,
}

impl StoredRecord {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            audio_link: None,
        }
    }

    pub fn with_audio_link(reference: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            audio_link: Some(link.into()),
        }
    }
}
