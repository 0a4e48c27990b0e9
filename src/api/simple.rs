use std::sync::{Arc, Once};

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;
use crate::engine::session::PodcastSession;
use crate::server::ObjectUrlServer;

static INIT_TRACING: Once = Once::new();

/// Install the global tracing subscriber. Safe to call more than once.
pub fn init_logging() {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();

        info!("podcast engine tracing initialized");
    });
}

/// Build a session from `config`, attach an object URL server and kick off
/// the one-time availability reconciliation in the background.
pub async fn start_session(config: &EngineConfig) -> Result<Arc<PodcastSession>> {
    init_logging();

    let server = Arc::new(ObjectUrlServer::start().await?);
    let session = Arc::new(PodcastSession::from_config(config).with_object_urls(server));

    let background = Arc::clone(&session);
    tokio::spawn(async move {
        if let Err(e) = background.reconcile().await {
            warn!("startup reconciliation skipped: {}", e);
        }
    });

    Ok(session)
}
