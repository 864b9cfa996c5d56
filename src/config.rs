//! # Configuration
//!
//! Hierarchical configuration loading from:
//! - groundlog.toml (base configuration)
//! - groundlog.local.toml (git-ignored local overrides)
//! - Environment variables (GROUNDLOG_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # groundlog.toml
//! [logging]
//! level = "debug"
//! format = "text"
//!
//! [evaluation]
//! optimize = true
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! GROUNDLOG_LOGGING__LEVEL=trace
//! GROUNDLOG_EVALUATION__OPTIMIZE=false
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Evaluation strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Evaluate rules component by component instead of iterating the
    /// whole rule list
    #[serde(default = "default_true")]
    pub optimize: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}
fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. groundlog.toml (base configuration)
    /// 2. groundlog.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (GROUNDLOG_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("groundlog.toml"))
            .merge(Toml::file("groundlog.local.toml"))
            .merge(Env::prefixed("GROUNDLOG_").split("__"))
            .extract()
    }

    /// Load configuration from a specific file path
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("GROUNDLOG_").split("__"))
            .extract()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig { optimize: true }
    }
}
