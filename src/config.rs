//! Configuration management for brewlens using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::LlmConfig;

/// Production text detection endpoint.
pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Default request body limit (10 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Recognition engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionConfig {
    /// `images:annotate` URL
    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,
    /// Requested feature type
    #[serde(default = "default_vision_feature")]
    pub feature: String,
    /// API key used when the caller does not supply one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_vision_endpoint() -> String {
    DEFAULT_VISION_ENDPOINT.to_string()
}

fn default_vision_feature() -> String {
    "TEXT_DETECTION".to_string()
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_vision_endpoint(),
            feature: default_vision_feature(),
            api_key: None,
        }
    }
}

impl VisionConfig {
    /// Config pointing at a custom endpoint (local fakes, proxies).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Configured key, if non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// - `VISION_API_KEY` (falls back to `GOOGLE_VISION_API_KEY`)
    /// - `VISION_ENDPOINT`
    pub fn with_env_from<F>(mut self, var: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = var("VISION_API_KEY").or_else(|| var("GOOGLE_VISION_API_KEY")) {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Some(endpoint) = var("VISION_ENDPOINT") {
            self.endpoint = endpoint;
        }
        self
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind: PORT, HOST or HOST:PORT
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Upper bound for one OCR request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Include engine diagnostics in error responses
    #[serde(default)]
    pub expose_error_details: bool,
}

fn default_bind() -> String {
    "127.0.0.1:3030".to_string()
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
            expose_error_details: false,
        }
    }
}

impl ServerConfig {
    /// Apply overrides from a variable lookup.
    ///
    /// - `BREWLENS_BIND`
    /// - `BREWLENS_MAX_BODY_BYTES`
    /// - `BREWLENS_REQUEST_TIMEOUT_SECS`
    pub fn with_env_from<F>(mut self, var: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = var("BREWLENS_BIND").filter(|s| !s.is_empty()) {
            self.bind = bind;
        }
        if let Some(n) = var("BREWLENS_MAX_BODY_BYTES").and_then(|v| v.parse().ok()) {
            self.max_body_bytes = n;
        }
        if let Some(n) = var("BREWLENS_REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.request_timeout_secs = n;
        }
        self
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub vision: VisionConfig,
    /// Optional correction step.
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers brewlens config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("brewlens").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            warn!("Ignoring config file: {}", e);
                            Self::default_with_env()
                        }
                    }
                } else {
                    Self::default_with_env()
                }
            }
            Err(_) => {
                // No config file found, use defaults with env overrides
                Self::default_with_env()
            }
        }
    }

    /// Load from an explicit path when given, otherwise discover.
    pub async fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path).await,
            None => Ok(Self::load().await),
        }
    }

    /// Create a default config with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)?,
            _ => serde_json::from_str(&contents)?,
        };

        debug!("Loaded config from {}", path.display());
        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    /// Apply process environment overrides to every section.
    pub fn with_env_overrides(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_env_from<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        self.vision = self.vision.with_env_from(&var);
        self.server = self.server.with_env_from(&var);
        self.llm = self.llm.with_env_from(&var);
        self
    }
}
