// Engine orchestration: availability reconciliation, playback resolution and generation runs.

pub mod availability;
pub mod orchestrator;
pub mod reconciler;
pub mod resolver;
pub mod session;
pub mod stats;
