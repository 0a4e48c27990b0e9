// Shared fixtures: a fake artifact bucket and scripted generators.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use parking_lot::RwLock;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use flash_podcast_engine::catalog::{Catalog, Commodity, CommodityId};
use flash_podcast_engine::generator::{GenerationError, PodcastGenerator};

/// Fake storage bucket serving `podcast_<id>.mp3` files, counting requests.
#[derive(Default)]
pub struct Bucket {
    files: RwLock<HashMap<String, Vec<u8>>>,
    pub heads: AtomicUsize,
    pub gets: AtomicUsize,
}

impl Bucket {
    pub fn insert(&self, id: &str, data: &[u8]) {
        self.files
            .write()
            .insert(format!("podcast_{}.mp3", id), data.to_vec());
    }

    pub fn heads(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

pub struct BucketServer {
    pub base_url: String,
    pub bucket: Arc<Bucket>,
}

async fn head_file(State(bucket): State<Arc<Bucket>>, Path(file): Path<String>) -> StatusCode {
    bucket.heads.fetch_add(1, Ordering::SeqCst);
    if bucket.files.read().contains_key(&file) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn get_file(State(bucket): State<Arc<Bucket>>, Path(file): Path<String>) -> Response {
    bucket.gets.fetch_add(1, Ordering::SeqCst);
    let body = bucket.files.read().get(&file).cloned();
    match body {
        Some(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "audio/mpeg")],
            body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "no such object").into_response(),
    }
}

/// Start a bucket on a random port holding `(id, bytes)` files.
pub async fn start_bucket(files: &[(&str, &[u8])]) -> BucketServer {
    let bucket = Arc::new(Bucket::default());
    for (id, data) in files {
        bucket.insert(id, data);
    }

    let app = Router::new()
        .route("/bucket/{file}", get(get_file).head(head_file))
        .with_state(bucket.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    BucketServer {
        base_url: format!("http://{}/bucket", addr),
        bucket,
    }
}

pub fn wheat_and_sugar() -> Catalog {
    Catalog::new(vec![
        Commodity::new("ble-tendre", "Blé Tendre", "🌾"),
        Commodity::new("sucre", "Sucre", "🍭"),
    ])
}

pub fn four_commodities() -> Catalog {
    Catalog::new(vec![
        Commodity::new("ble-tendre", "Blé Tendre", "🌾"),
        Commodity::new("sucre", "Sucre", "🍭"),
        Commodity::new("cacao", "Cacao", "🍫"),
        Commodity::new("beurre", "Beurre", "🧈"),
    ])
}

/// Audio bytes the scripted generator produces for `id`.
pub fn generated_audio(id: &str) -> Vec<u8> {
    format!("ID3 audio for {}", id).into_bytes()
}

/// Generator that succeeds for every commodity except `fail_on`, and
/// returns an empty audio payload for `mute_on`.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub fail_on: Option<CommodityId>,
    pub mute_on: Option<CommodityId>,
    pub script_calls: AtomicUsize,
    pub audio_calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn failing_on(id: &str) -> Self {
        Self {
            fail_on: Some(CommodityId::new(id)),
            ..Self::default()
        }
    }

    pub fn muted_on(id: &str) -> Self {
        Self {
            mute_on: Some(CommodityId::new(id)),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PodcastGenerator for ScriptedGenerator {
    async fn generate_script(&self, commodity: &Commodity) -> Result<String, GenerationError> {
        self.script_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.as_ref() == Some(&commodity.id) {
            return Err(GenerationError::Script {
                commodity: commodity.name.clone(),
                reason: "service unreachable".to_string(),
            });
        }
        Ok(commodity.id.to_string())
    }

    async fn generate_audio(&self, script: &str) -> Result<String, GenerationError> {
        self.audio_calls.fetch_add(1, Ordering::SeqCst);
        // Scripts are the commodity id.
        if self.mute_on.as_ref().map(|id| id.as_str()) == Some(script) {
            return Ok(String::new());
        }
        Ok(STANDARD.encode(generated_audio(script)))
    }
}

/// Generator that parks inside `generate_script` until released.
#[derive(Default)]
pub struct GatedGenerator {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl PodcastGenerator for GatedGenerator {
    async fn generate_script(&self, commodity: &Commodity) -> Result<String, GenerationError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(commodity.id.to_string())
    }

    async fn generate_audio(&self, script: &str) -> Result<String, GenerationError> {
        Ok(STANDARD.encode(generated_audio(script)))
    }
}
