//! Wire messages exchanged with a streaming client.
//!
//! Inbound: one text message per video frame, a data-URI style
//! `<meta>,<base64>` string. Outbound: JSON replies tagged by `status`.

use crate::error::{Result, SignscribeError};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

/// Extracts and decodes the base64 payload after the first comma.
pub fn decode_frame_payload(message: &str) -> Result<Vec<u8>> {
    let (_, payload) = message.split_once(',').ok_or_else(|| SignscribeError::Decode {
        message: "missing ',' separator".to_string(),
    })?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| SignscribeError::Decode {
            message: format!("invalid base64 payload: {e}"),
        })?;

    if bytes.is_empty() {
        return Err(SignscribeError::Decode {
            message: "empty payload".to_string(),
        });
    }
    Ok(bytes)
}

/// Builds a `data:` message from raw bytes. Mostly useful to clients and tests.
pub fn encode_frame_payload(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Outbound reply envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply<T> {
    Success { result: T },
    Error { message: String },
}

impl<T> Reply<T> {
    pub fn success(result: T) -> Self {
        Reply::Success { result }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Success { .. })
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            Reply::Success { result } => Some(result),
            Reply::Error { .. } => None,
        }
    }
}

impl<T> From<Result<T>> for Reply<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Reply::success(value),
            Err(e) => Reply::error(e.to_string()),
        }
    }
}

impl<T: Serialize> Reply<T> {
    /// Serialize reply to JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl<T: DeserializeOwned> Reply<T> {
    /// Deserialize reply from JSON string.
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Result of processing one inbound frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub word_gloss: String,
    pub word_confidence: f32,
    pub confirmed: bool,
    pub buffered_frames: usize,
}

/// Result of one generation tick. `text` is empty when nothing was generated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationReport {
    pub text: String,
}

/// Result of the one-shot image path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReport {
    pub text: String,
    pub word_confidence: f32,
}
