// Podcast session: owns availability, selection and progress, and wires the components together.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info};

use super::availability::{AvailabilityState, AvailabilityTable};
use super::orchestrator::{GenerationOrchestrator, RunOutcome};
use super::reconciler::{Reconciler, ReconciliationReport};
use super::resolver::{PlaybackResolver, PlaybackSource, Resolution, Selection};
use super::stats::{EngineStats, StatsSnapshot};
use crate::catalog::{ArtifactKey, Catalog, CommodityId};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::generator::{GeminiGenerator, PodcastGenerator};
use crate::server::ObjectUrlServer;
use crate::source::http_source::HttpSource;
use crate::source::traits::RemoteSource;
use crate::store::{open_store, SharedStore};

/// Which pass last wrote the progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressSource {
    Reconciliation,
    Generation,
}

/// Headline shown above the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusBanner {
    /// Reconciliation has not reported yet.
    Checking,
    Generating,
    UpToDate,
    Updating,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub progress: Option<u8>,
    pub progress_source: Option<ProgressSource>,
    pub generating: bool,
    pub error: Option<String>,
    pub selected: Option<CommodityId>,
    pub availability: Vec<(CommodityId, AvailabilityState)>,
}

impl SessionStatus {
    pub fn banner(&self) -> StatusBanner {
        if self.generating {
            return StatusBanner::Generating;
        }
        match self.progress {
            None => StatusBanner::Checking,
            Some(100) => StatusBanner::UpToDate,
            Some(_) => StatusBanner::Updating,
        }
    }
}

pub fn playback_error_message(name: &str) -> String {
    format!(
        "The podcast for \"{}\" could not be loaded. It may still be generating or temporarily unavailable.",
        name
    )
}

struct SessionState {
    availability: AvailabilityTable,
    selection: Selection,
    progress: Option<u8>,
    progress_source: Option<ProgressSource>,
    error: Option<String>,
}

pub struct PodcastSession {
    catalog: Catalog,
    base_url: String,
    reconciler: Reconciler,
    resolver: PlaybackResolver,
    orchestrator: GenerationOrchestrator,
    stats: Arc<EngineStats>,
    object_urls: Option<Arc<ObjectUrlServer>>,
    reconcile_started: AtomicBool,
    state: Mutex<SessionState>,
}

impl PodcastSession {
    pub fn new(
        catalog: Catalog,
        base_url: impl Into<String>,
        store: SharedStore,
        source: Arc<dyn RemoteSource>,
        generator: Arc<dyn PodcastGenerator>,
    ) -> Self {
        let base_url = base_url.into();
        let stats = Arc::new(EngineStats::new());

        let reconciler = Reconciler::new(
            store.clone(),
            Arc::clone(&source),
            base_url.clone(),
            Arc::clone(&stats),
        );
        let resolver = PlaybackResolver::new(
            store.clone(),
            source,
            base_url.clone(),
            Arc::clone(&stats),
        );
        let orchestrator =
            GenerationOrchestrator::new(generator, store, base_url.clone(), Arc::clone(&stats));

        let state = SessionState {
            availability: AvailabilityTable::new(&catalog),
            selection: Selection::default(),
            progress: None,
            progress_source: None,
            error: None,
        };

        Self {
            catalog,
            base_url,
            reconciler,
            resolver,
            orchestrator,
            stats,
            object_urls: None,
            reconcile_started: AtomicBool::new(false),
            state: Mutex::new(state),
        }
    }

    /// Session over the default catalog with HTTP probing, the Gemini
    /// generator and the store selected by `config.cache_dir`.
    pub fn from_config(config: &EngineConfig) -> Self {
        let store = open_store(config.cache_dir.as_deref());
        info!(
            "podcast session base_url={} store_available={}",
            config.base_url,
            store.is_available()
        );
        Self::new(
            Catalog::default(),
            config.base_url.clone(),
            store,
            Arc::new(HttpSource::new()),
            Arc::new(GeminiGenerator::from_config(config)),
        )
    }

    /// Attach a server that turns in-memory sources into playable URLs.
    pub fn with_object_urls(mut self, server: Arc<ObjectUrlServer>) -> Self {
        self.object_urls = Some(server);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn artifact_key(&self, id: &CommodityId) -> ArtifactKey {
        ArtifactKey::for_commodity(&self.base_url, id)
    }

    /// Startup availability pass. Runs at most once per session.
    pub async fn reconcile(&self) -> EngineResult<ReconciliationReport> {
        if self.reconcile_started.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyReconciled);
        }

        let report = self
            .reconciler
            .run(&self.catalog, |id, availability, progress| {
                let mut state = self.state.lock();
                state.availability.transition(id, availability);
                // A generation run owns the indicator once it has started.
                if state.progress_source != Some(ProgressSource::Generation) {
                    state.progress = Some(progress);
                    state.progress_source = Some(ProgressSource::Reconciliation);
                }
            })
            .await;
        Ok(report)
    }

    /// Select `id` for playback.
    ///
    /// Returns `None` when `id` is already selected: nothing is fetched,
    /// stored or restarted. Otherwise clears the error, rewinds to zero and
    /// resolves the new source.
    pub async fn select(&self, id: &CommodityId) -> EngineResult<Option<Resolution>> {
        let commodity = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownCommodity(id.clone()))?;

        {
            let mut state = self.state.lock();
            if state.selection.is_selected(id) {
                debug!("select id={} ignored: already selected", id);
                return Ok(None);
            }
            state.selection = Selection::for_commodity(commodity);
            state.error = None;
        }

        let session_audio = self.orchestrator.session_audio(id);
        let resolution = self.resolver.resolve(id, session_audio).await;

        {
            let mut state = self.state.lock();
            // Another selection may have landed while resolving.
            if state.selection.is_selected(id) {
                state.selection.source = Some(resolution.source.clone());
            }
        }
        Ok(Some(resolution))
    }

    /// The player failed to load the current source. Clears the selection and
    /// surfaces a message naming the commodity.
    pub fn report_playback_error(&self) -> Option<EngineError> {
        let mut state = self.state.lock();
        let commodity = state.selection.commodity.take()?;
        state.selection = Selection::default();

        let message = playback_error_message(&commodity.name);
        error!("playback failed id={}", commodity.id);
        state.error = Some(message.clone());
        Some(EngineError::Playback(message))
    }

    /// Record the player's position. Ignored when nothing is selected.
    pub fn seek(&self, position: Duration) -> bool {
        let mut state = self.state.lock();
        if state.selection.commodity.is_none() {
            return false;
        }
        state.selection.position = position;
        true
    }

    /// Generate the whole catalog on explicit request.
    ///
    /// Rejected while a run is active. A generator failure halts the run and
    /// becomes the session's error message.
    pub async fn force_generation(&self) -> EngineResult<usize> {
        let result = self
            .orchestrator
            .run(
                &self.catalog,
                || {
                    let mut state = self.state.lock();
                    state.error = None;
                    state.progress = Some(0);
                    state.progress_source = Some(ProgressSource::Generation);
                },
                |id, progress| {
                    let mut state = self.state.lock();
                    state
                        .availability
                        .transition(id, AvailabilityState::SessionGenerated);
                    state.progress = Some(progress);
                },
            )
            .await;

        if let Err(EngineError::Generation(e)) = &result {
            self.state.lock().error = Some(e.user_message());
        }
        result
    }

    /// URL the player should open for `source`.
    ///
    /// Remote streams use the artifact URL. In-memory sources need an
    /// attached object URL server; without one this returns `None`.
    pub fn playback_url(&self, source: &PlaybackSource) -> Option<String> {
        match source.artifact() {
            None => Some(source.key().to_string()),
            Some(artifact) => self
                .object_urls
                .as_ref()
                .map(|server| server.publish(source.key(), artifact.clone())),
        }
    }

    pub fn availability(&self, id: &CommodityId) -> AvailabilityState {
        self.state.lock().availability.get(id)
    }

    pub fn selection(&self) -> Selection {
        self.state.lock().selection.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn is_generating(&self) -> bool {
        self.orchestrator.is_running()
    }

    pub fn last_generation(&self) -> Option<RunOutcome> {
        self.orchestrator.last_outcome()
    }

    pub fn status(&self) -> SessionStatus {
        let generating = self.orchestrator.is_running();
        let state = self.state.lock();
        SessionStatus {
            progress: state.progress,
            progress_source: state.progress_source,
            generating,
            error: state.error.clone(),
            selected: state.selection.commodity.as_ref().map(|c| c.id.clone()),
            availability: state.availability.entries(),
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(progress: Option<u8>, generating: bool) -> SessionStatus {
        SessionStatus {
            progress,
            progress_source: None,
            generating,
            error: None,
            selected: None,
            availability: Vec::new(),
        }
    }

    #[test]
    fn test_banner() {
        assert_eq!(status(None, false).banner(), StatusBanner::Checking);
        assert_eq!(status(Some(40), false).banner(), StatusBanner::Updating);
        assert_eq!(status(Some(100), false).banner(), StatusBanner::UpToDate);
        assert_eq!(status(Some(100), true).banner(), StatusBanner::Generating);
    }

    #[test]
    fn test_playback_error_message_names_commodity() {
        let message = playback_error_message("Sucre");
        assert!(message.starts_with("The podcast for \"Sucre\" could not be loaded."));
    }
}
