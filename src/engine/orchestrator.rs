// Generation orchestrator: drives the external generator across the catalog, one item at a time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info};

use super::availability::completion_percent;
use super::stats::EngineStats;
use crate::catalog::{ArtifactKey, Catalog, Commodity, CommodityId};
use crate::error::{EngineError, EngineResult};
use crate::generator::{decode_audio_payload, GenerationError, PodcastGenerator};
use crate::store::{ArtifactBytes, SharedStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorPhase {
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { generated: usize },
    Failed { commodity: CommodityId, message: String },
}

/// Resets the phase to `Idle` however the run ends, including when the
/// driving future is dropped.
struct RunningGuard<'a> {
    phase: &'a Mutex<OrchestratorPhase>,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        *self.phase.lock() = OrchestratorPhase::Idle;
    }
}

pub struct GenerationOrchestrator {
    generator: Arc<dyn PodcastGenerator>,
    store: SharedStore,
    base_url: String,
    stats: Arc<EngineStats>,
    phase: Mutex<OrchestratorPhase>,
    last_outcome: Mutex<Option<RunOutcome>>,
    session_audio: RwLock<HashMap<CommodityId, ArtifactBytes>>,
}

impl GenerationOrchestrator {
    pub fn new(
        generator: Arc<dyn PodcastGenerator>,
        store: SharedStore,
        base_url: String,
        stats: Arc<EngineStats>,
    ) -> Self {
        Self {
            generator,
            store,
            base_url,
            stats,
            phase: Mutex::new(OrchestratorPhase::Idle),
            last_outcome: Mutex::new(None),
            session_audio: RwLock::new(HashMap::new()),
        }
    }

    pub fn phase(&self) -> OrchestratorPhase {
        *self.phase.lock()
    }

    pub fn is_running(&self) -> bool {
        self.phase() == OrchestratorPhase::Running
    }

    pub fn last_outcome(&self) -> Option<RunOutcome> {
        self.last_outcome.lock().clone()
    }

    /// In-memory audio generated for `id` during the current run history.
    pub fn session_audio(&self, id: &CommodityId) -> Option<ArtifactBytes> {
        self.session_audio.read().get(id).cloned()
    }

    pub fn session_audio_len(&self) -> usize {
        self.session_audio.read().len()
    }

    /// Generate every catalog entry in order.
    ///
    /// Rejected with `GenerationInProgress` while another run is active;
    /// `on_started` runs only once the run has been accepted. Each new run
    /// clears the session audio map. `on_generated` is called after an item
    /// is stored, with the progress after that item. The first generator
    /// failure halts the run; items finished before it stay in the store and
    /// in the session map.
    pub async fn run<S, F>(
        &self,
        catalog: &Catalog,
        on_started: S,
        mut on_generated: F,
    ) -> EngineResult<usize>
    where
        S: FnOnce(),
        F: FnMut(&CommodityId, u8),
    {
        let _guard = {
            let mut phase = self.phase.lock();
            if *phase == OrchestratorPhase::Running {
                return Err(EngineError::GenerationInProgress);
            }
            *phase = OrchestratorPhase::Running;
            RunningGuard { phase: &self.phase }
        };

        on_started();
        self.session_audio.write().clear();
        let t0 = Instant::now();
        let total = catalog.len();
        info!("generation run started: {} commodities", total);

        for (index, commodity) in catalog.iter().enumerate() {
            let artifact = match self.generate_one(commodity).await {
                Ok(artifact) => artifact,
                Err(e) => {
                    error!(
                        "generation halted at {} ({}/{}): {}",
                        commodity.id,
                        index + 1,
                        total,
                        e
                    );
                    *self.last_outcome.lock() = Some(RunOutcome::Failed {
                        commodity: commodity.id.clone(),
                        message: e.user_message(),
                    });
                    return Err(e.into());
                }
            };

            let key = ArtifactKey::for_commodity(&self.base_url, &commodity.id);
            self.session_audio
                .write()
                .insert(commodity.id.clone(), artifact.clone());
            self.store.put(&key, artifact).await;
            self.stats.record_generated();

            let progress = completion_percent(index + 1, total);
            debug!("generated id={} progress={}", commodity.id, progress);
            on_generated(&commodity.id, progress);
        }

        info!(
            "generation run completed: {} commodities elapsed_ms={}",
            total,
            t0.elapsed().as_millis()
        );
        *self.last_outcome.lock() = Some(RunOutcome::Completed { generated: total });
        Ok(total)
    }

    async fn generate_one(&self, commodity: &Commodity) -> Result<ArtifactBytes, GenerationError> {
        let script = self.generator.generate_script(commodity).await?;
        let encoded = self.generator.generate_audio(&script).await?;
        decode_audio_payload(&encoded)
    }
}
