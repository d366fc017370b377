//! Configuration for executors and the oracle

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::executor::OutputFormat;
use crate::{Error, Result};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "CHAINQUERY_CONFIG";
pub const DATABASE_URL_ENV: &str = "CHAINQUERY_DATABASE_URL";
pub const OUTPUT_FORMAT_ENV: &str = "CHAINQUERY_OUTPUT_FORMAT";
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub executor: ExecutorConfig,
    pub oracle: OracleConfig,
}

/// SQL executor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Connection string of the embedded engine
    /// Default: sqlite::memory:
    pub database_url: String,

    /// Output format used when none is given
    /// Default: PrettyCompact
    pub output_format: String,

    /// Rows pulled from a reader per page
    /// Default: 8192
    pub batch_size: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            output_format: OutputFormat::PrettyCompact.to_string(),
            batch_size: 8192,
        }
    }
}

impl ExecutorConfig {
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from(self.output_format.as_str())
    }
}

/// Text-to-SQL oracle settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,

    /// Usually supplied through ANTHROPIC_API_KEY
    pub api_key: Option<String>,

    /// Request timeout
    /// Default: 120
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            model: "claude-3-7-sonnet-latest".to_string(),
            max_tokens: 64000,
            api_key: None,
            timeout_secs: 120,
        }
    }
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    /// Load and validate a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Configuration from `CHAINQUERY_CONFIG` (defaults if unset or missing)
    /// with environment overrides applied
    pub fn resolve() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let mut config = match path {
            Some(path) if path.exists() => Self::load(&path)?,
            Some(path) => {
                info!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env_overrides_from(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, usually the process environment
    pub fn apply_env_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(DATABASE_URL_ENV) {
            self.executor.database_url = url;
        }
        if let Some(format) = lookup(OUTPUT_FORMAT_ENV) {
            self.executor.output_format = format;
        }
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.is_empty()) {
            self.oracle.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.executor.batch_size == 0 {
            return Err(Error::config("executor.batch_size must be > 0"));
        }
        if self.executor.database_url.trim().is_empty() {
            return Err(Error::config("executor.database_url must not be empty"));
        }
        if self.oracle.timeout_secs == 0 {
            return Err(Error::config("oracle.timeout_secs must be > 0"));
        }
        Ok(())
    }
}
