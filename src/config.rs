use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

/// Public bucket where the nightly job publishes one MP3 per commodity.
pub const PODCAST_STORAGE_BASE_URL: &str =
    "https://storage.googleapis.com/flash-matiere-premieres-podcasts";

/// Name of the local artifact cache. Bump the suffix to invalidate old entries.
pub const CACHE_NAME: &str = "podcast-audio-cache-v1";

/// Content type of every podcast artifact.
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Model used to research and write the dialogue script.
pub const SCRIPT_MODEL: &str = "gemini-2.5-flash";

/// Multi-speaker text-to-speech model.
pub const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Root of the Gemini REST API.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_BASE_URL: &str = "PODCAST_BASE_URL";
pub const ENV_CACHE_DIR: &str = "PODCAST_CACHE_DIR";
pub const ENV_API_BASE: &str = "GEMINI_API_BASE";
/// Optional JSON file loaded before the variables above are applied.
pub const ENV_CONFIG_FILE: &str = "PODCAST_CONFIG";

/// Top-level configuration for a podcast session.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL artifact keys are derived from.
    pub base_url: String,
    /// Directory holding the on-disk artifact cache. `None` keeps the cache in memory.
    pub cache_dir: Option<String>,
    /// Credential for the external generator. Only checked when generation runs.
    pub api_key: Option<String>,
    pub generator_api_base: String,
    pub script_model: String,
    pub tts_model: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: PODCAST_STORAGE_BASE_URL.to_string(),
            cache_dir: None,
            api_key: None,
            generator_api_base: GEMINI_API_BASE.to_string(),
            script_model: SCRIPT_MODEL.to_string(),
            tts_model: TTS_MODEL.to_string(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_slice(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    /// Build the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// `PODCAST_CONFIG`, when set, names a JSON file used as the base; an
    /// unreadable file is logged and the defaults are used instead. Variables
    /// override the file. Empty values are treated as unset. A missing API
    /// key only warns: browsing and playback work without it, generation
    /// fails when invoked.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut config = match get(ENV_CONFIG_FILE) {
            Some(path) => Self::load(Path::new(&path)).unwrap_or_else(|e| {
                warn!("ignoring config file: {:#}", e);
                Self::default()
            }),
            None => Self::default(),
        };
        if let Some(base_url) = get(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(api_base) = get(ENV_API_BASE) {
            config.generator_api_base = api_base;
        }
        if let Some(cache_dir) = get(ENV_CACHE_DIR) {
            config.cache_dir = Some(cache_dir);
        }
        if let Some(api_key) = get(ENV_API_KEY) {
            config.api_key = Some(api_key);
        }

        if config.api_key.is_none() {
            warn!(
                "{} environment variable not set, podcast generation will fail until it is provided",
                ENV_API_KEY
            );
        }
        config
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("base_url", &self.base_url)
            .field("cache_dir", &self.cache_dir)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("generator_api_base", &self.generator_api_base)
            .field("script_model", &self.script_model)
            .field("tts_model", &self.tts_model)
            .finish()
    }
}
