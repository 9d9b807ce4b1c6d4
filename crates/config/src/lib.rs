//! Configuration loading, validation, and management for Loadstone.
//!
//! Loads configuration from `~/.loadstone/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use loadstone_core::cache::CachePolicy;
use loadstone_core::content::ContentCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.loadstone/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Asset cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Worker pool sizing
    #[serde(default)]
    pub pools: PoolConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Candidate locations for relative URIs
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Extra MIME classifications
    #[serde(default)]
    pub content: ContentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// "memory" or "file"
    #[serde(default = "default_cache_backend")]
    pub backend: String,

    /// Directory for the file backend (default: ~/.loadstone/cache)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Validate cached assets against the remote before serving them
    #[serde(default)]
    pub freshness_check: bool,

    /// Schemes whose resources are never cached
    #[serde(default = "default_uncachable_schemes")]
    pub uncachable_schemes: Vec<String>,

    /// URI prefixes whose resources are never cached
    #[serde(default)]
    pub uncachable_prefixes: Vec<String>,
}

fn default_cache_backend() -> String {
    "file".into()
}
fn default_uncachable_schemes() -> Vec<String> {
    vec!["file".into()]
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            dir: None,
            freshness_check: false,
            uncachable_schemes: default_uncachable_schemes(),
            uncachable_prefixes: vec![],
        }
    }
}

impl CacheConfig {
    /// The cache directory, falling back to `~/.loadstone/cache`.
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| LoaderConfig::config_dir().join("cache"))
    }

    /// Build the shared cache policy described by this section.
    pub fn policy(&self) -> CachePolicy {
        let policy = self
            .uncachable_schemes
            .iter()
            .fold(CachePolicy::new(self.freshness_check), |p, s| {
                p.with_uncachable_scheme(s.clone())
            });
        self.uncachable_prefixes
            .iter()
            .fold(policy, |p, prefix| p.with_uncachable_prefix(prefix.clone()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Threads for small/metadata loads
    #[serde(default = "default_file_pool_size")]
    pub file_pool_size: usize,

    /// Threads for bulk data loads
    #[serde(default = "default_data_pool_size")]
    pub data_pool_size: usize,
}

fn default_file_pool_size() -> usize {
    4
}
fn default_data_pool_size() -> usize {
    2
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            file_pool_size: default_file_pool_size(),
            data_pool_size: default_data_pool_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    concat!("loadstone/", env!("CARGO_PKG_VERSION")).into()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Base URIs tried, in order, for requests that are not absolute
    #[serde(default)]
    pub search_roots: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentConfig {
    /// MIME type → category, added on top of the built-in table
    #[serde(default)]
    pub mime_types: HashMap<String, ContentCategory>,
}

impl LoaderConfig {
    /// Load configuration from the default path (~/.loadstone/config.toml).
    ///
    /// Environment variables override file settings:
    /// - `LOADSTONE_CACHE_DIR`
    /// - `LOADSTONE_FRESHNESS_CHECK` (`true`/`false`/`1`/`0`)
    /// - `LOADSTONE_FILE_POOL_SIZE`, `LOADSTONE_DATA_POOL_SIZE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("LOADSTONE_CACHE_DIR") {
            self.cache.dir = Some(PathBuf::from(dir));
        }

        if let Some(raw) = lookup("LOADSTONE_FRESHNESS_CHECK") {
            self.cache.freshness_check = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(ConfigError::ValidationError(format!(
                        "LOADSTONE_FRESHNESS_CHECK must be a boolean, got '{other}'"
                    )));
                }
            };
        }

        if let Some(raw) = lookup("LOADSTONE_FILE_POOL_SIZE") {
            self.pools.file_pool_size = parse_size("LOADSTONE_FILE_POOL_SIZE", &raw)?;
        }

        if let Some(raw) = lookup("LOADSTONE_DATA_POOL_SIZE") {
            self.pools.data_pool_size = parse_size("LOADSTONE_DATA_POOL_SIZE", &raw)?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".loadstone")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.cache.backend.as_str(), "memory" | "file") {
            return Err(ConfigError::ValidationError(format!(
                "cache.backend must be \"memory\" or \"file\", got \"{}\"",
                self.cache.backend
            )));
        }

        if self.pools.file_pool_size == 0 || self.pools.data_pool_size == 0 {
            return Err(ConfigError::ValidationError(
                "pool sizes must be at least 1".into(),
            ));
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "http.timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn parse_size(key: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|e| ConfigError::ValidationError(format!("{key} must be a number: {e}")))
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
