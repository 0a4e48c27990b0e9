use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use crate::catalog::Commodity;
use crate::store::ArtifactBytes;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Failed to generate script for {commodity}. Please check API configuration.")]
    Script { commodity: String, reason: String },

    #[error("Failed to generate audio. The model may be unavailable or the script was invalid.")]
    Audio { reason: String },

    #[error("No audio data received from API.")]
    MissingAudio,

    #[error("Generated audio payload could not be decoded: {0}")]
    InvalidPayload(String),

    #[error("Generator API key is not configured.")]
    MissingApiKey,
}

impl GenerationError {
    /// Text shown to the user. Every audio-side failure reads as `Audio`.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingAudio | Self::InvalidPayload(_) => Self::Audio {
                reason: String::new(),
            }
            .to_string(),
            other => other.to_string(),
        }
    }
}

/// Producer of podcast scripts and narrated audio.
#[async_trait]
pub trait PodcastGenerator: Send + Sync {
    /// Write a two-speaker dialogue about `commodity`.
    async fn generate_script(&self, commodity: &Commodity) -> Result<String, GenerationError>;

    /// Narrate `script`. Returns the audio payload base64-encoded.
    async fn generate_audio(&self, script: &str) -> Result<String, GenerationError>;
}

/// Decode a base64 audio payload into an `audio/mpeg` artifact.
pub fn decode_audio_payload(encoded: &str) -> Result<ArtifactBytes, GenerationError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(GenerationError::MissingAudio);
    }
    let data = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| GenerationError::InvalidPayload(e.to_string()))?;
    Ok(ArtifactBytes::audio(data))
}
