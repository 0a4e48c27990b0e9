// Playback source resolution: session blob, then store, then direct stream with write-back.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::stats::EngineStats;
use crate::catalog::{ArtifactKey, Commodity, CommodityId};
use crate::error::EngineError;
use crate::source::traits::RemoteSource;
use crate::store::{ArtifactBytes, SharedStore};

/// Where the player reads the selected podcast from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackSource {
    /// Bytes generated during this session.
    SessionBlob {
        key: ArtifactKey,
        artifact: ArtifactBytes,
    },
    /// Bytes read back from the artifact store.
    Cached {
        key: ArtifactKey,
        artifact: ArtifactBytes,
    },
    /// Stream straight from the artifact URL.
    RemoteStream { key: ArtifactKey },
}

impl PlaybackSource {
    pub fn key(&self) -> &ArtifactKey {
        match self {
            Self::SessionBlob { key, .. } | Self::Cached { key, .. } | Self::RemoteStream { key } => {
                key
            }
        }
    }

    /// In-memory bytes, if the source does not need the network.
    pub fn artifact(&self) -> Option<&ArtifactBytes> {
        match self {
            Self::SessionBlob { artifact, .. } | Self::Cached { artifact, .. } => Some(artifact),
            Self::RemoteStream { .. } => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteStream { .. })
    }
}

/// Outcome of resolving one selection.
pub struct Resolution {
    pub source: PlaybackSource,
    /// Background write-back of a streamed artifact. Resolves to whether the
    /// bytes reached the store. Dropping the handle does not cancel the fill.
    pub cache_fill: Option<JoinHandle<bool>>,
}

/// What the player currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub commodity: Option<Commodity>,
    pub source: Option<PlaybackSource>,
    pub position: Duration,
}

impl Selection {
    pub fn for_commodity(commodity: Commodity) -> Self {
        Self {
            commodity: Some(commodity),
            source: None,
            position: Duration::ZERO,
        }
    }

    pub fn is_selected(&self, id: &CommodityId) -> bool {
        self.commodity.as_ref().map(|c| &c.id) == Some(id)
    }
}

pub struct PlaybackResolver {
    store: SharedStore,
    source: Arc<dyn RemoteSource>,
    base_url: String,
    stats: Arc<EngineStats>,
}

impl PlaybackResolver {
    pub fn new(
        store: SharedStore,
        source: Arc<dyn RemoteSource>,
        base_url: String,
        stats: Arc<EngineStats>,
    ) -> Self {
        Self {
            store,
            source,
            base_url,
            stats,
        }
    }

    /// Pick the playback source for `id`; first match wins.
    ///
    /// `session_audio` is the orchestrator's in-memory entry for `id`, if any.
    pub async fn resolve(
        &self,
        id: &CommodityId,
        session_audio: Option<ArtifactBytes>,
    ) -> Resolution {
        let key = ArtifactKey::for_commodity(&self.base_url, id);

        if let Some(artifact) = session_audio {
            debug!("resolve id={} source=session bytes={}", id, artifact.len());
            return Resolution {
                source: PlaybackSource::SessionBlob { key, artifact },
                cache_fill: None,
            };
        }

        let cached = self.store.get(&key).await;
        self.stats.record_store_lookup(cached.is_some());
        if let Some(artifact) = cached {
            debug!("resolve id={} source=store bytes={}", id, artifact.len());
            return Resolution {
                source: PlaybackSource::Cached { key, artifact },
                cache_fill: None,
            };
        }

        debug!("resolve id={} source=remote key={}", id, key);
        // Nothing to fill when there is no store to write into.
        let cache_fill = if self.store.is_available() {
            Some(self.spawn_cache_fill(key.clone()))
        } else {
            None
        };
        Resolution {
            source: PlaybackSource::RemoteStream { key },
            cache_fill,
        }
    }

    fn spawn_cache_fill(&self, key: ArtifactKey) -> JoinHandle<bool> {
        let store = self.store.clone();
        let source = Arc::clone(&self.source);
        let stats = Arc::clone(&self.stats);

        tokio::spawn(async move {
            stats.record_full_fetch();
            let artifact = match source.fetch(&key).await {
                Ok(artifact) => artifact,
                Err(e) => {
                    warn!(
                        "cache fill skipped key={}: {}",
                        key,
                        EngineError::NetworkFailure(format!("{:#}", e))
                    );
                    return false;
                }
            };

            let len = artifact.len();
            if store.put(&key, artifact).await {
                stats.record_cache_fill();
                debug!("cache fill stored key={} bytes={}", key, len);
                true
            } else {
                warn!("cache fill not persisted key={}", key);
                false
            }
        })
    }
}
