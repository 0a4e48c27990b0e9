// Startup availability pass: store lookup first, header-only probe as fallback.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use super::availability::{completion_percent, AvailabilityState};
use super::stats::EngineStats;
use crate::catalog::{ArtifactKey, Catalog, CommodityId};
use crate::error::EngineError;
use crate::source::traits::RemoteSource;
use crate::store::SharedStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Final state of every catalog entry, in catalog order.
    pub outcomes: Vec<(CommodityId, AvailabilityState)>,
    /// Progress emitted after each item.
    pub progress_steps: Vec<u8>,
    /// Final aggregate progress.
    pub progress: u8,
}

impl ReconciliationReport {
    pub fn available_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, s)| s.is_available()).count()
    }
}

pub struct Reconciler {
    store: SharedStore,
    source: Arc<dyn RemoteSource>,
    base_url: String,
    stats: Arc<EngineStats>,
}

impl Reconciler {
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

    /// Classify every catalog entry, one at a time.
    ///
    /// `on_item` is called after each entry with its state and the updated
    /// aggregate progress. Probe failures count as `Absent`; the pass never
    /// aborts.
    pub async fn run<F>(&self, catalog: &Catalog, mut on_item: F) -> ReconciliationReport
    where
        F: FnMut(&CommodityId, AvailabilityState, u8),
    {
        let t0 = Instant::now();
        let total = catalog.len();
        let mut available = 0usize;
        let mut outcomes = Vec::with_capacity(total);
        let mut progress_steps = Vec::with_capacity(total);

        for commodity in catalog.iter() {
            let key = ArtifactKey::for_commodity(&self.base_url, &commodity.id);
            let state = self.classify(&key).await;
            if state.is_available() {
                available += 1;
            }

            let progress = completion_percent(available, total);
            debug!(
                "reconcile id={} state={:?} progress={}",
                commodity.id, state, progress
            );
            on_item(&commodity.id, state, progress);

            outcomes.push((commodity.id.clone(), state));
            progress_steps.push(progress);
        }

        let progress = completion_percent(available, total);
        info!(
            "reconciliation done: {}/{} available ({}%) elapsed_ms={}",
            available,
            total,
            progress,
            t0.elapsed().as_millis()
        );

        ReconciliationReport {
            outcomes,
            progress_steps,
            progress,
        }
    }

    async fn classify(&self, key: &ArtifactKey) -> AvailabilityState {
        let hit = self.store.get(key).await.is_some();
        self.stats.record_store_lookup(hit);
        if hit {
            return AvailabilityState::Cached;
        }

        self.stats.record_probe();
        match self.source.probe(key).await {
            Ok(true) => AvailabilityState::RemoteAvailable,
            Ok(false) => AvailabilityState::Absent,
            Err(e) => {
                debug!(
                    "probe key={}: {}",
                    key,
                    EngineError::NetworkFailure(format!("{:#}", e))
                );
                AvailabilityState::Absent
            }
        }
    }
}
