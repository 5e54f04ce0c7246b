//! Pipeline configuration.

use std::path::PathBuf;

use crate::models::{RetainPolicy, ARTIFACT_VERSION};

/// Default remote model repository.
const DEFAULT_MODEL_URL: &str = "https://artifacts.textlayer.dev";

/// Configuration for a [`crate::pipeline::Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory where fetched model artifacts are cached on disk.
    pub model_dir: PathBuf,
    /// Base URL of the remote artifact store.
    pub model_url: String,
    /// Artifact layout version to fetch.
    pub model_version: String,
    /// Whether loaded models stay in memory between runs.
    pub retain: RetainPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let model_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("textlayer");
        Self {
            model_dir,
            model_url: DEFAULT_MODEL_URL.to_string(),
            model_version: ARTIFACT_VERSION.to_string(),
            retain: RetainPolicy::Keep,
        }
    }
}

impl PipelineConfig {
    /// Default configuration with environment overrides applied.
    ///
    /// - `TEXTLAYER_MODEL_DIR` - On-disk artifact cache directory
    /// - `TEXTLAYER_MODEL_URL` - Remote model repository base URL
    /// - `TEXTLAYER_RETAIN_MODELS` - Set to `0`/`false`/`no` to evict
    ///   models after each run
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("TEXTLAYER_MODEL_DIR") {
            if !dir.is_empty() {
                config.model_dir = PathBuf::from(dir);
            }
        }
        if let Ok(url) = std::env::var("TEXTLAYER_MODEL_URL") {
            if !url.is_empty() {
                config.model_url = url;
            }
        }
        if let Ok(retain) = std::env::var("TEXTLAYER_RETAIN_MODELS") {
            config.retain = match retain.trim().to_lowercase().as_str() {
                "0" | "false" | "no" => RetainPolicy::Evict,
                _ => RetainPolicy::Keep,
            };
        }
        config
    }
}
