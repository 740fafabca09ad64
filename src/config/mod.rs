//! Configuration management.
//!
//! Settings come from, in increasing priority: built-in defaults, a TOML
//! file, `DOI_SEARCH_*` environment variables and command-line flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [openalex]
//! base_url = "https://api.openalex.org"
//! mailto = "you@example.org"
//!
//! [fetch]
//! batch_size = 20
//! max_concurrent = 8
//! timeout_secs = 30
//! max_dois = 500
//! large_request_warning = 100
//!
//! [flatten]
//! max_depth = 6
//! ```
//!
//! Environment variables use `__` between section and key, e.g.
//! `DOI_SEARCH_FETCH__BATCH_SIZE=10`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pipeline::{FetchOptions, DEFAULT_MAX_CONCURRENT};
use crate::sources::OPENALEX_API_BASE;
use crate::utils::{
    BatchSize, DEFAULT_BATCH_SIZE, DEFAULT_MAX_DEPTH, DEFAULT_MAX_DOIS, DEFAULT_TIMEOUT_SECS,
};

/// Name of the config file looked up in the working and config directories
pub const CONFIG_FILE_NAME: &str = "doi-search.toml";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "DOI_SEARCH";

/// Smallest usable flattening depth; the journal name
/// (`primary_location.source.display_name`) sits three levels down
pub const MIN_FLATTEN_DEPTH: usize = 3;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API settings
    #[serde(default)]
    pub openalex: OpenAlexConfig,

    /// Batching and concurrency settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// JSON flattening settings
    #[serde(default)]
    pub flatten: FlattenConfig,
}

/// OpenAlex settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAlexConfig {
    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Contact address for the polite pool (falls back to `OPENALEX_EMAIL`)
    #[serde(default)]
    pub mailto: Option<String>,
}

impl Default for OpenAlexConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mailto: None,
        }
    }
}

fn default_base_url() -> String {
    OPENALEX_API_BASE.to_string()
}

/// Fetch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// DOIs per request (1-100)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum concurrent requests
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum unique DOIs per run
    #[serde(default = "default_max_dois")]
    pub max_dois: usize,

    /// Warn that retrieval may be slow above this many DOIs
    #[serde(default = "default_large_request")]
    pub large_request_warning: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent: default_max_concurrent(),
            timeout_secs: default_timeout(),
            max_dois: default_max_dois(),
            large_request_warning: default_large_request(),
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_dois() -> usize {
    DEFAULT_MAX_DOIS
}

fn default_large_request() -> usize {
    100
}

/// Flattening settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Config {
    /// Pipeline options derived from this configuration
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            batch_size: BatchSize::new(self.fetch.batch_size),
            max_concurrent: self.fetch.max_concurrent.max(1),
            max_dois: self.fetch.max_dois,
            max_depth: self.flatten.max_depth.max(MIN_FLATTEN_DEPTH),
        }
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs.max(1))
    }

    /// Contact address, falling back to `OPENALEX_EMAIL`
    pub fn mailto(&self) -> Option<String> {
        self.openalex
            .mailto
            .clone()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| std::env::var("OPENALEX_EMAIL").ok())
    }

    /// Write this configuration as TOML
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Config error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Load configuration from an optional file plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Look for a config file in the working directory, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    default_config_path().filter(|p| p.is_file())
}

/// Where `config --init` writes by default
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("doi-search").join(CONFIG_FILE_NAME))
}
