// Artifact store abstraction: keyed blob backends and the best-effort wrapper callers use.

pub mod disk_store;
pub mod memory_store;
pub mod shared;
pub mod traits;

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::EngineError;

pub use disk_store::DiskStore;
pub use memory_store::MemoryStore;
pub use shared::SharedStore;
pub use traits::{ArtifactBytes, ArtifactStore};

/// Open the store described by `cache_dir`.
///
/// `None` selects an in-memory store. A directory that cannot be prepared
/// leaves the session without a store: lookups miss and writes are dropped.
pub fn open_store(cache_dir: Option<&str>) -> SharedStore {
    match cache_dir {
        Some(dir) => match DiskStore::open(Path::new(dir)) {
            Ok(store) => {
                info!("artifact store opened at {}", store.dir().display());
                SharedStore::new(Arc::new(store))
            }
            Err(e) => {
                warn!("{}", EngineError::StorageUnavailable(format!("{}: {:#}", dir, e)));
                SharedStore::unavailable()
            }
        },
        None => SharedStore::new(Arc::new(MemoryStore::new())),
    }
}
