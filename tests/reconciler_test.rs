// Integration tests for the startup availability pass.

mod common;

use std::sync::Arc;

use flash_podcast_engine::catalog::{ArtifactKey, Catalog, CommodityId};
use flash_podcast_engine::engine::availability::AvailabilityState;
use flash_podcast_engine::engine::session::{PodcastSession, ProgressSource, StatusBanner};
use flash_podcast_engine::error::EngineError;
use flash_podcast_engine::source::http_source::HttpSource;
use flash_podcast_engine::store::{ArtifactBytes, ArtifactStore, MemoryStore, SharedStore};

use common::{four_commodities, start_bucket, wheat_and_sugar, ScriptedGenerator};

fn session_with(catalog: Catalog, base_url: &str, store: SharedStore) -> PodcastSession {
    PodcastSession::new(
        catalog,
        base_url,
        store,
        Arc::new(HttpSource::new()),
        Arc::new(ScriptedGenerator::default()),
    )
}

#[tokio::test]
async fn test_wheat_cached_sugar_absent() {
    let server = start_bucket(&[]).await;
    let mem = Arc::new(MemoryStore::new());
    let wheat = CommodityId::new("ble-tendre");
    mem.put(
        &ArtifactKey::for_commodity(&server.base_url, &wheat),
        ArtifactBytes::audio(b"wheat".to_vec()),
    )
    .await
    .unwrap();

    let session = session_with(wheat_and_sugar(), &server.base_url, SharedStore::new(mem));
    assert_eq!(session.status().banner(), StatusBanner::Checking);

    let report = session.reconcile().await.unwrap();

    assert_eq!(report.progress_steps, vec![50, 50]);
    assert_eq!(report.progress, 50);
    assert_eq!(session.availability(&wheat), AvailabilityState::Cached);
    assert_eq!(
        session.availability(&CommodityId::new("sucre")),
        AvailabilityState::Absent
    );

    // Wheat came from the store, only Sugar needed a probe.
    assert_eq!(server.bucket.heads(), 1);
    assert_eq!(server.bucket.gets(), 0);

    let status = session.status();
    assert_eq!(status.progress, Some(50));
    assert_eq!(status.progress_source, Some(ProgressSource::Reconciliation));
    assert_eq!(status.banner(), StatusBanner::Updating);
}

#[tokio::test]
async fn test_every_entry_classified() {
    let server = start_bucket(&[("sucre", b"sugar"), ("beurre", b"butter")]).await;
    let mem = Arc::new(MemoryStore::new());
    mem.put(
        &ArtifactKey::for_commodity(&server.base_url, &CommodityId::new("ble-tendre")),
        ArtifactBytes::audio(b"wheat".to_vec()),
    )
    .await
    .unwrap();

    let session = session_with(four_commodities(), &server.base_url, SharedStore::new(mem));
    let report = session.reconcile().await.unwrap();

    let states: Vec<AvailabilityState> = report.outcomes.iter().map(|(_, s)| *s).collect();
    assert_eq!(
        states,
        vec![
            AvailabilityState::Cached,
            AvailabilityState::RemoteAvailable,
            AvailabilityState::Absent,
            AvailabilityState::RemoteAvailable,
        ]
    );
    assert_eq!(report.available_count(), 3);
    assert_eq!(report.progress_steps, vec![25, 50, 50, 75]);
    assert_eq!(report.progress, 75);

    // Non-decreasing within the pass.
    assert!(report.progress_steps.windows(2).all(|w| w[0] <= w[1]));

    // Probing never downloads bodies and never writes the store.
    assert_eq!(server.bucket.gets(), 0);
    assert_eq!(session.stats().probes, 3);
    assert_eq!(session.stats().store_hits, 1);
}

#[tokio::test]
async fn test_probe_errors_are_absent() {
    // Nothing listens on port 1: every probe fails at the transport level.
    let session = session_with(
        wheat_and_sugar(),
        "http://127.0.0.1:1/bucket",
        SharedStore::new(Arc::new(MemoryStore::new())),
    );

    let report = session.reconcile().await.unwrap();

    assert_eq!(report.progress_steps, vec![0, 0]);
    assert!(report
        .outcomes
        .iter()
        .all(|(_, s)| *s == AvailabilityState::Absent));
}

#[tokio::test]
async fn test_unavailable_store_falls_back_to_network() {
    let server = start_bucket(&[("ble-tendre", b"wheat"), ("sucre", b"sugar")]).await;
    let session = session_with(wheat_and_sugar(), &server.base_url, SharedStore::unavailable());

    let report = session.reconcile().await.unwrap();

    assert_eq!(report.progress, 100);
    assert_eq!(server.bucket.heads(), 2);
    assert_eq!(session.status().banner(), StatusBanner::UpToDate);
}

#[tokio::test]
async fn test_reconcile_runs_once() {
    let server = start_bucket(&[]).await;
    let session = session_with(
        wheat_and_sugar(),
        &server.base_url,
        SharedStore::new(Arc::new(MemoryStore::new())),
    );

    session.reconcile().await.unwrap();
    let again = session.reconcile().await;

    assert!(matches!(again, Err(EngineError::AlreadyReconciled)));
    assert_eq!(server.bucket.heads(), 2);
}

#[tokio::test]
async fn test_empty_catalog() {
    let session = session_with(
        Catalog::new(Vec::new()),
        "http://127.0.0.1:1/bucket",
        SharedStore::unavailable(),
    );
    let report = session.reconcile().await.unwrap();
    assert!(report.progress_steps.is_empty());
    assert_eq!(report.progress, 0);
}
