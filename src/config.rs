//! Configuration file parsing
//!
//! Reads migration-guard.toml configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::{Engine, EngineKind, Version};
use crate::rules::Safety;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub cli: CliConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Engine family: "postgres", "mysql", "mariadb"
    #[serde(default = "default_engine_kind")]
    pub kind: String,

    /// Engine version, `MAJOR[.MINOR[.PATCH]]`
    #[serde(default = "default_engine_version")]
    pub version: String,

    /// Session time zone migrations run under
    pub time_zone: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: default_engine_kind(),
            version: default_engine_version(),
            time_zone: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Output formats: "text", "json"
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,

    /// Output directory for report files. Reports go to stdout when unset.
    pub dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    /// Exit non-zero if the report reaches this status
    #[serde(default = "default_fail_on")]
    pub fail_on: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            fail_on: default_fail_on(),
        }
    }
}

fn default_engine_kind() -> String {
    "postgres".to_string()
}

fn default_engine_version() -> String {
    "16".to_string()
}

fn default_formats() -> Vec<String> {
    vec!["text".to_string()]
}

fn default_fail_on() -> String {
    "unsafe".to_string()
}

const KNOWN_FORMATS: &[&str] = &["text", "json"];

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fail_on()?;
        self.engine.build()?;
        if let Some(format) = self
            .output
            .formats
            .iter()
            .find(|f| !KNOWN_FORMATS.contains(&f.to_lowercase().as_str()))
        {
            return Err(ConfigError::Validation(format!(
                "unknown output format '{}'. Valid formats: text, json",
                format
            )));
        }
        Ok(())
    }

    /// The `fail_on` gate. `None` disables it.
    pub fn fail_on(&self) -> Result<Option<Safety>, ConfigError> {
        let fail_on = &self.cli.fail_on;
        if fail_on.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        Safety::parse(fail_on).map(Some).ok_or_else(|| {
            ConfigError::Validation(format!(
                "invalid fail_on value '{}'. Valid values: safe, conditionally_safe, unsafe, none",
                fail_on
            ))
        })
    }
}

impl EngineConfig {
    /// Build the engine context for an analysis run.
    pub fn build(&self) -> Result<Engine, ConfigError> {
        // EngineKind parsing never fails; unknown names become `Other`.
        let kind: EngineKind = self
            .kind
            .parse()
            .unwrap_or_else(|_| EngineKind::Other(self.kind.clone()));
        if matches!(&kind, EngineKind::Other(name) if name.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "engine kind must not be empty".to_string(),
            ));
        }
        let version = self
            .version
            .parse::<Version>()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        let engine = Engine::new(kind, version);
        Ok(match &self.time_zone {
            Some(tz) => engine.with_time_zone(tz.clone()),
            None => engine,
        })
    }
}
