use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use tracing::{debug, warn};

use super::traits::RemoteSource;
use crate::catalog::ArtifactKey;
use crate::config::AUDIO_CONTENT_TYPE;
use crate::store::ArtifactBytes;

pub struct HttpSource {
    client: Client,
    headers: HashMap<String, String>,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            headers: HashMap::new(),
        }
    }

    /// Extra headers sent with every request.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    fn build_request(&self, method: Method, key: &ArtifactKey) -> RequestBuilder {
        let mut req = self.client.request(method, key.as_str());
        for (k, v) in &self.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        req
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn probe(&self, key: &ArtifactKey) -> Result<bool> {
        // Bypass intermediary caches: the nightly job may have published since.
        let resp = self
            .build_request(Method::HEAD, key)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;

        let status = resp.status();
        debug!("http probe key={} status={}", key, status.as_u16());
        Ok(status.is_success())
    }

    async fn fetch(&self, key: &ArtifactKey) -> Result<ArtifactBytes> {
        let resp = self.build_request(Method::GET, key).send().await?;

        let status = resp.status();
        if !status.is_success() {
            warn!("http fetch failed key={} status={}", key, status.as_u16());
            return Err(anyhow!("fetch failed: HTTP {}", status.as_u16()));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(AUDIO_CONTENT_TYPE)
            .to_string();

        let data = resp.bytes().await?;
        debug!("http fetch key={} bytes={}", key, data.len());
        Ok(ArtifactBytes::new(data, content_type))
    }
}
