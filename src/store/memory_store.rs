use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;

use super::traits::{ArtifactBytes, ArtifactStore};
use crate::catalog::ArtifactKey;

/// Process-local store. Contents are lost when the session ends.
pub struct MemoryStore {
    entries: RwLock<HashMap<ArtifactKey, ArtifactBytes>>,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            writes: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of `put` calls served so far, including overwrites.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn get(&self, key: &ArtifactKey) -> Result<Option<ArtifactBytes>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn put(&self, key: &ArtifactKey, artifact: ArtifactBytes) -> Result<()> {
        self.entries.write().insert(key.clone(), artifact);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
