// Axum object-URL server: publishes in-memory audio blobs at loopback URLs with Range support.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use parking_lot::{Mutex, RwLock};
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::catalog::ArtifactKey;
use crate::store::ArtifactBytes;

pub type BlobMap = Arc<RwLock<HashMap<String, ArtifactBytes>>>;

pub struct ObjectUrlServer {
    port: u16,
    blobs: BlobMap,
    shutdown_tx: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
}

impl ObjectUrlServer {
    /// Start the server on a random loopback port.
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let blobs: BlobMap = Arc::new(RwLock::new(HashMap::new()));

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let app = Router::new()
            .route("/blob/{token}", get(blob_handler).head(head_handler))
            .with_state(blobs.clone());

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        info!("object url server listening on 127.0.0.1:{}", port);
        Ok(Self {
            port,
            blobs,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve `artifact` under a URL derived from `key`. Publishing the same
    /// key again replaces the blob behind the same URL.
    pub fn publish(&self, key: &ArtifactKey, artifact: ArtifactBytes) -> String {
        let token = blob_token(key);
        debug!("publish blob key={} token={} bytes={}", key, token, artifact.len());
        self.blobs.write().insert(token.clone(), artifact);
        self.url_for_token(&token)
    }

    /// Stop serving the blob for `key`. Returns whether one was published.
    pub fn revoke(&self, key: &ArtifactKey) -> bool {
        self.blobs.write().remove(&blob_token(key)).is_some()
    }

    pub fn url_for(&self, key: &ArtifactKey) -> String {
        self.url_for_token(&blob_token(key))
    }

    fn url_for_token(&self, token: &str) -> String {
        format!("http://127.0.0.1:{}/blob/{}", self.port, token)
    }

    /// Shutdown the server gracefully. Later calls are no-ops.
    pub fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for ObjectUrlServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn blob_token(key: &ArtifactKey) -> String {
    let digest = hex::encode(Sha256::digest(key.as_str().as_bytes()));
    digest[..32].to_string()
}

#[derive(Debug, PartialEq, Eq)]
enum ParsedRange {
    StartEnd {
        start: u64,
        end_inclusive: Option<u64>,
    },
    Suffix {
        len: u64,
    },
}

/// Parse a Range header value.
/// Supports:
/// - bytes=start-end
/// - bytes=start-
/// - bytes=-suffix_len
fn parse_range_header(value: &str) -> Option<ParsedRange> {
    let value = value.trim();
    let rest = value.strip_prefix("bytes=")?;
    let mut parts = rest.splitn(2, '-');
    let start_str = parts.next()?.trim();
    let end_str = parts.next()?.trim();

    if start_str.is_empty() {
        let len: u64 = end_str.parse().ok()?;
        if len == 0 {
            return None;
        }
        Some(ParsedRange::Suffix { len })
    } else {
        let start: u64 = start_str.parse().ok()?;
        let end_inclusive = if end_str.is_empty() {
            None
        } else {
            Some(end_str.parse::<u64>().ok()?)
        };
        Some(ParsedRange::StartEnd {
            start,
            end_inclusive,
        })
    }
}

/// Resolve a parsed range against `total` into `[start, end)`, or `None`
/// when it cannot be satisfied.
fn resolve_range(range: ParsedRange, total: u64) -> Option<(u64, u64)> {
    let (start, end) = match range {
        ParsedRange::StartEnd {
            start,
            end_inclusive,
        } => {
            let end = end_inclusive.map_or(total, |e| e.saturating_add(1).min(total));
            (start, end)
        }
        ParsedRange::Suffix { len } => (total.saturating_sub(len), total),
    };
    if start >= total || end <= start {
        None
    } else {
        Some((start, end))
    }
}

fn lookup(blobs: &BlobMap, token: &str) -> Option<ArtifactBytes> {
    blobs.read().get(token).cloned()
}

fn base_headers(artifact: &ArtifactBytes, body_len: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let content_type = HeaderValue::from_str(&artifact.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body_len));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers
}

fn content_range(start: u64, end: u64, total: u64) -> HeaderValue {
    // Content-Range: bytes start-end/total (end is inclusive in HTTP).
    HeaderValue::from_str(&format!("bytes {}-{}/{}", start, end - 1, total))
        .unwrap_or_else(|_| HeaderValue::from_static("bytes */0"))
}

fn not_satisfiable(total: u64) -> Response {
    (
        StatusCode::RANGE_NOT_SATISFIABLE,
        [(header::CONTENT_RANGE, format!("bytes */{}", total))],
        "range not satisfiable",
    )
        .into_response()
}

/// GET /blob/{token}: serve the blob, honoring Range.
async fn blob_handler(
    State(blobs): State<BlobMap>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(artifact) = lookup(&blobs, &token) else {
        return (StatusCode::NOT_FOUND, "blob not found").into_response();
    };
    let total = artifact.len() as u64;

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_range_header);

    match range {
        Some(range) => {
            let Some((start, end)) = resolve_range(range, total) else {
                return not_satisfiable(total);
            };
            debug!("blob request token={} range=[{}, {})", token, start, end);
            let body = artifact.data.slice(start as usize..end as usize);
            let mut resp_headers = base_headers(&artifact, end - start);
            resp_headers.insert(header::CONTENT_RANGE, content_range(start, end, total));
            (StatusCode::PARTIAL_CONTENT, resp_headers, body).into_response()
        }
        None => {
            let resp_headers = base_headers(&artifact, total);
            (StatusCode::OK, resp_headers, artifact.data.clone()).into_response()
        }
    }
}

/// HEAD /blob/{token}: return headers only.
async fn head_handler(
    State(blobs): State<BlobMap>,
    Path(token): Path<String>,
) -> Response {
    let Some(artifact) = lookup(&blobs, &token) else {
        return (StatusCode::NOT_FOUND, "blob not found").into_response();
    };
    let resp_headers = base_headers(&artifact, artifact.len() as u64);
    (StatusCode::OK, resp_headers).into_response()
}
