// Market flash podcast engine: artifact cache, availability reconciliation,
// playback resolution and sequential generation.

pub mod api;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod server;
pub mod source;
pub mod store;

pub use catalog::{ArtifactKey, Catalog, Commodity, CommodityId};
pub use config::EngineConfig;
pub use engine::session::{PodcastSession, SessionStatus};
pub use error::{EngineError, EngineResult};
pub use store::ArtifactBytes;
