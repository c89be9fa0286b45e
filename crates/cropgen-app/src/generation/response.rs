//! Response parsing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::GenerationError;

const MAX_ERROR_MESSAGE_LEN: usize = 200;

/// One generated image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    /// Base64-encoded image bytes.
    pub base64: String,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default, rename = "finishReason")]
    pub finish_reason: Option<String>,
}

impl GeneratedArtifact {
    /// Decode the image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, GenerationError> {
        STANDARD
            .decode(self.base64.trim())
            .map_err(|e| GenerationError::MalformedResponse(format!("invalid base64: {e}")))
    }
}

/// Parsed body of a successful generation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub artifacts: Vec<GeneratedArtifact>,
}

impl GenerationResult {
    /// Parse and validate a success body.
    ///
    /// The body must contain at least one artifact, and the first artifact
    /// must carry a non-empty `base64` string.
    pub fn from_json(body: &[u8]) -> Result<Self, GenerationError> {
        let result: Self = serde_json::from_slice(body)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
        match result.artifacts.first() {
            None => Err(GenerationError::MalformedResponse(
                "response contains no artifacts".to_string(),
            )),
            Some(first) if first.base64.is_empty() => Err(GenerationError::MalformedResponse(
                "first artifact has no image data".to_string(),
            )),
            Some(_) => Ok(result),
        }
    }

    /// The artifact the session shows.
    pub fn first(&self) -> Option<&GeneratedArtifact> {
        self.artifacts.first()
    }

    /// Base64 string of the first artifact.
    pub fn first_image(&self) -> Option<&str> {
        self.first().map(|a| a.base64.as_str())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Human-readable message for a failed response.
///
/// Uses the `message` field of a JSON error body when present, otherwise a
/// truncated copy of the raw body.
pub(crate) fn error_message(body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        return parsed.message;
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "empty response body".to_string();
    }
    text.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}
