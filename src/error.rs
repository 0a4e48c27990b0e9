use thiserror::Error;

use crate::catalog::CommodityId;
use crate::generator::GenerationError;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Failures surfaced by a podcast session.
///
/// Only `Generation` and `Playback` ever reach the user. Storage and network
/// failures are logged where they happen and degrade to a cache miss or an
/// absent artifact.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The local artifact cache cannot be used in this environment.
    #[error("artifact store unavailable: {0}")]
    StorageUnavailable(String),

    /// A probe or full fetch against the artifact URL failed.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The external generator failed; the current run is halted.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The player could not decode or stream the selected artifact.
    #[error("{0}")]
    Playback(String),

    #[error("podcast availability has already been reconciled for this session")]
    AlreadyReconciled,

    #[error("a generation run is already in progress")]
    GenerationInProgress,

    #[error("unknown commodity: {0}")]
    UnknownCommodity(CommodityId),
}
