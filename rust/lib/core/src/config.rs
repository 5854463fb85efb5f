use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5001";

/// Client runtime configuration.
///
/// Built from defaults, then a TOML file, then environment variables or
/// command-line flags, whichever the embedding shell uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the REST backend.
    pub api_url: String,

    /// Directory for persisted client state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Path to the redb session file.
    /// Defaults to `{data_dir}/session.redb` if not specified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,

    /// Per-request timeout.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: None,
            db_path: None,
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Parse configuration from command-line arguments.
    ///
    /// Supported flags:
    /// - `--api-url=URL`
    /// - `--data-dir=PATH`
    /// - `--db=PATH`
    /// - `--timeout=SECS`
    pub fn from_args(args: &[String]) -> Self {
        let mut config = ClientConfig::default();

        for arg in args {
            if let Some(val) = arg.strip_prefix("--api-url=") {
                config.api_url = val.to_string();
            } else if let Some(val) = arg.strip_prefix("--data-dir=") {
                config.data_dir = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--db=") {
                config.db_path = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--timeout=") {
                if let Ok(secs) = val.parse() {
                    config.request_timeout_secs = secs;
                }
            }
        }

        config
    }

    /// Apply `COMPTA_*` environment variables on top of the defaults.
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Override fields from a variable lookup (`COMPTA_API_URL`,
    /// `COMPTA_DATA_DIR`, `COMPTA_DB`, `COMPTA_TIMEOUT_SECS`).
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("COMPTA_API_URL").filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        if let Some(dir) = lookup("COMPTA_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(db) = lookup("COMPTA_DB") {
            self.db_path = Some(PathBuf::from(db));
        }
        if let Some(secs) = lookup("COMPTA_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.request_timeout_secs = secs;
        }
        self
    }

    /// Load config from disk, or return the default if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save config to disk.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Resolve the session database path, falling back to `{data_dir}/session.redb`.
    pub fn resolve_db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(|| {
            self.data_dir
                .as_ref()
                .map(|d| d.join("session.redb"))
                .unwrap_or_else(|| PathBuf::from("session.redb"))
        })
    }

    /// Base URL without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}
