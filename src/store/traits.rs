use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::catalog::ArtifactKey;
use crate::config::AUDIO_CONTENT_TYPE;

/// Encoded audio payload plus its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBytes {
    pub data: Bytes,
    pub content_type: String,
}

impl ArtifactBytes {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// Payload tagged as `audio/mpeg`.
    pub fn audio(data: impl Into<Bytes>) -> Self {
        Self::new(data, AUDIO_CONTENT_TYPE)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Persistent blob store keyed by artifact URL.
///
/// `put` replaces any prior entry for the key. Implementations must tolerate
/// concurrent puts for the same key; the last completed write wins.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn get(&self, key: &ArtifactKey) -> Result<Option<ArtifactBytes>>;
    async fn put(&self, key: &ArtifactKey, artifact: ArtifactBytes) -> Result<()>;
}
