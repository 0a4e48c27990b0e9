use std::sync::Arc;

use tracing::warn;

use super::traits::{ArtifactBytes, ArtifactStore};
use crate::catalog::ArtifactKey;
use crate::error::EngineError;

/// Best-effort handle over an optional backing store.
///
/// Every failure degrades: `get` reports a miss and `put` reports `false`.
/// A miss never means the artifact is absent remotely.
#[derive(Clone)]
pub struct SharedStore {
    inner: Option<Arc<dyn ArtifactStore>>,
}

impl SharedStore {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { inner: Some(store) }
    }

    /// A store for environments without any caching facility.
    pub fn unavailable() -> Self {
        Self { inner: None }
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }

    pub async fn get(&self, key: &ArtifactKey) -> Option<ArtifactBytes> {
        let store = self.inner.as_ref()?;
        match store.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(
                    "store get key={}: {}",
                    key,
                    EngineError::StorageUnavailable(format!("{:#}", e))
                );
                None
            }
        }
    }

    /// Returns whether the artifact was persisted.
    pub async fn put(&self, key: &ArtifactKey, artifact: ArtifactBytes) -> bool {
        let Some(store) = self.inner.as_ref() else {
            return false;
        };
        match store.put(key, artifact).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "store put key={}: {}",
                    key,
                    EngineError::StorageUnavailable(format!("{:#}", e))
                );
                false
            }
        }
    }
}
