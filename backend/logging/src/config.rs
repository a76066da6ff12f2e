//! Logger configuration.
//!
//! A [`LoggerConfig`] is read from YAML (or JSON, which YAML accepts),
//! optionally overridden from the environment, and turned into a [`Logger`]
//! with [`LoggerConfig::build`].

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LogError;
use crate::level::Level;
use crate::logger::Logger;

/// Overrides the configured level.
pub const LEVEL_ENV: &str = "FACADE_LOG_LEVEL";

/// Overrides development mode (`1`/`true`/`yes` enable it).
pub const DEVELOPMENT_ENV: &str = "FACADE_LOG_DEVELOPMENT";

pub const DEFAULT_LEVEL: Level = Level::Info;
pub const DEFAULT_OUTPUT: &str = "stderr";

/// Where records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stderr,
    Stdout,
    /// Appended to; created if missing.
    File(PathBuf),
}

impl Output {
    pub fn parse(raw: &str) -> Result<Self, LogError> {
        match raw.trim() {
            "" => Err(LogError::Config("output cannot be empty".into())),
            "stderr" => Ok(Output::Stderr),
            "stdout" => Ok(Output::Stdout),
            path => Ok(Output::File(PathBuf::from(path))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerConfig {
    /// Minimum level, e.g. "info"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,

    /// DPanic records panic when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development: Option<bool>,

    /// "stderr" | "stdout" | file path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Value of the `logger` key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_caller: Option<bool>,
}

impl LoggerConfig {
    /// Info level to standard error, DPanic only logs.
    pub fn production() -> Self {
        Self {
            level: Some(DEFAULT_LEVEL),
            development: Some(false),
            output: Some(DEFAULT_OUTPUT.to_string()),
            ..Default::default()
        }
    }

    /// Debug level to standard error, DPanic panics.
    pub fn development() -> Self {
        Self {
            level: Some(Level::Debug),
            development: Some(true),
            output: Some(DEFAULT_OUTPUT.to_string()),
            ..Default::default()
        }
    }

    pub fn level(&self) -> Level {
        self.level.unwrap_or(DEFAULT_LEVEL)
    }

    pub fn output(&self) -> Result<Output, LogError> {
        Output::parse(self.output.as_deref().unwrap_or(DEFAULT_OUTPUT))
    }

    /// Apply `FACADE_LOG_*` overrides from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (useful for testing).
    pub fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(LEVEL_ENV).filter(|v| !v.trim().is_empty()) {
            match raw.parse::<Level>() {
                Ok(level) => self.level = Some(level),
                Err(_) => {
                    warn!(var = LEVEL_ENV, value = %raw, "Ignoring unrecognized log level override")
                }
            }
        }
        if let Some(dev) = lookup(DEVELOPMENT_ENV) {
            self.development = Some(matches!(
                dev.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ));
        }
        self
    }

    /// Validate and construct the logger.
    pub fn build(&self) -> Result<Logger, LogError> {
        let level = self.level();
        let logger = match self.output()? {
            Output::Stderr => Logger::new(std::io::stderr(), level),
            Output::Stdout => Logger::new(std::io::stdout(), level),
            Output::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .map_err(|source| LogError::OpenSink { path, source })?;
                Logger::new(file, level)
            }
        };
        let logger = logger
            .development(self.development.unwrap_or(false))
            .with_caller(!self.disable_caller.unwrap_or(false));
        Ok(match self.name.as_deref() {
            Some(name) if !name.is_empty() => logger.named(name),
            _ => logger,
        })
    }
}

/// Load a config file.
///
/// Returns `Ok(Default::default())` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<LoggerConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Logger config does not exist; using defaults");
        return Ok(LoggerConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read logger config: {}", path.display()))?;

    let config = parse_config(&raw)
        .with_context(|| format!("Failed to parse logger config at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded logger config");
    Ok(config)
}

pub fn parse_config(raw: &str) -> Result<LoggerConfig> {
    if raw.trim().is_empty() {
        return Ok(LoggerConfig::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}

/// Load, apply environment overrides and build in one step.
pub fn logger_from_file(path: &Path) -> Result<Logger> {
    let config = load_config(path)?.apply_env();
    Ok(config.build()?)
}
