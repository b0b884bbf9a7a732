use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

const DEFAULT_CONFIG_TOML: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub timeout: Duration,
    pub cache_path: String,
    pub max_results: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    gateway: RawGateway,
    #[serde(default)]
    cache: RawCache,
    #[serde(default)]
    search: RawSearch,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGateway {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCache {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSearch {
    max_results: Option<usize>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config '{}': {}", path.display(), source)
            }
            ConfigError::Toml(err) => write!(f, "invalid config TOML: {}", err),
            ConfigError::Invalid(message) => write!(f, "invalid config: {}", message),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        ConfigError::Toml(value)
    }
}

/// Command-line values that win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub cache_path: Option<String>,
}

impl Config {
    /// Built-in defaults, then the file at `path` if given, then `overrides`.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let user = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Some(raw)
            }
            None => None,
        };
        Self::from_sources(user.as_deref(), overrides)
    }

    pub(crate) fn from_sources(user: Option<&str>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let defaults: RawConfig = toml::from_str(DEFAULT_CONFIG_TOML)?;
        let user: RawConfig = match user {
            Some(raw) => toml::from_str(raw)?,
            None => RawConfig::default(),
        };

        let base_url = overrides
            .base_url
            .clone()
            .or(user.gateway.base_url)
            .or(defaults.gateway.base_url)
            .ok_or_else(|| ConfigError::Invalid("gateway.base_url is required".to_string()))?;
        let timeout_secs = user
            .gateway
            .timeout_secs
            .or(defaults.gateway.timeout_secs)
            .unwrap_or(20);
        let cache_path = overrides
            .cache_path
            .clone()
            .or(user.cache.path)
            .or(defaults.cache.path)
            .ok_or_else(|| ConfigError::Invalid("cache.path is required".to_string()))?;
        let max_results = user
            .search
            .max_results
            .or(defaults.search.max_results)
            .unwrap_or(crate::search::DEFAULT_MAX_RESULTS);

        let config = Config {
            base_url: base_url.trim().to_string(),
            timeout: Duration::from_secs(timeout_secs),
            cache_path: cache_path.trim().to_string(),
            max_results,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(_) | Err(_) => {
                return Err(ConfigError::Invalid(format!(
                    "gateway.base_url '{}' must be an http(s) URL",
                    self.base_url
                )))
            }
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "gateway.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.cache_path.is_empty() {
            return Err(ConfigError::Invalid("cache.path cannot be empty".to_string()));
        }
        if self.max_results == 0 {
            return Err(ConfigError::Invalid(
                "search.max_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
