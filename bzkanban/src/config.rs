//! Board configuration loaded with Figment.
//!
//! Sources are merged in precedence order, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. Global file: `~/.bzkanban/config.{toml,yaml,yml,json}`
//! 3. Project file: `./bzkanban.{toml,yaml,yml,json}`
//! 4. Environment variables prefixed with `BZKANBAN_` (e.g. `BZKANBAN_BASE_URL`)
//!
//! Missing files are skipped.

use crate::remote::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "BZKANBAN_";

const FILE_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration parsing failed
    #[error("Failed to parse configuration: {source}")]
    ParseError {
        #[from]
        source: figment::Error,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    ValidationError { message: String },
}

impl ConfigError {
    fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

/// Settings for talking to the tracker and scoping the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Tracker URL
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Default product filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// Default component filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// API key; usually supplied through `BZKANBAN_API_KEY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            product: None,
            component: None,
            api_key: None,
        }
    }
}

impl BoardConfig {
    /// Load configuration from all standard sources
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// The request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::validation("timeout_secs must be greater than 0"));
        }
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::validation(format!("base_url: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::validation(format!(
                "base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(())
    }
}

/// Builds a [`BoardConfig`] from files and the environment
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    files: Vec<PathBuf>,
    use_env: bool,
}

impl ConfigLoader {
    /// Loader over the standard global and project file locations plus the environment
    pub fn new() -> Self {
        let mut files = Vec::new();
        if let Some(home) = dirs::home_dir() {
            files.extend(candidates(&home.join(".bzkanban"), "config"));
        }
        files.extend(candidates(Path::new("."), "bzkanban"));

        Self {
            files,
            use_env: true,
        }
    }

    /// Loader with no sources besides the defaults
    pub fn empty() -> Self {
        Self {
            files: Vec::new(),
            use_env: false,
        }
    }

    /// Add a file; later files override earlier ones
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Include `BZKANBAN_*` environment variables
    pub fn with_env(mut self) -> Self {
        self.use_env = true;
        self
    }

    fn figment(&self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(BoardConfig::default()));

        for path in &self.files {
            trace!("Loading config file: {}", path.display());
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => {
                    debug!("Skipping config file with unknown format: {}", path.display());
                    figment
                }
            };
        }

        if self.use_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX));
        }

        figment
    }

    /// Merge all sources and validate the result
    pub fn load(&self) -> Result<BoardConfig, ConfigError> {
        let config: BoardConfig = self.figment().extract()?;
        config.validate()?;
        debug!(
            base_url = %config.base_url,
            timeout_secs = config.timeout_secs,
            "loaded configuration"
        );
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn candidates(dir: &Path, stem: &str) -> Vec<PathBuf> {
    FILE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .collect()
}
