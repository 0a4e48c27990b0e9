use anyhow::Result;
use async_trait::async_trait;

use crate::catalog::ArtifactKey;
use crate::store::ArtifactBytes;

#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Header-only existence check. `Ok(true)` for any OK-class response.
    async fn probe(&self, key: &ArtifactKey) -> Result<bool>;

    /// Download the whole artifact body.
    async fn fetch(&self, key: &ArtifactKey) -> Result<ArtifactBytes>;
}
