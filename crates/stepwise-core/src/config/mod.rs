//! Configuration loading
//!
//! Configuration is layered: defaults, then an optional file (TOML, YAML or
//! JSON by extension), then `STEPWISE_*` environment variables.

pub mod defaults;
mod engine;
mod logging;

pub use engine::EngineConfig;
pub use logging::LoggingConfig;

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{FlowError, FlowResult};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepwiseConfig {
    /// Engine tunables
    pub engine: EngineConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl StepwiseConfig {
    /// Load defaults, then `path` if given, then the environment
    pub fn load(path: Option<&Path>) -> FlowResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load_from_file(path: &Path) -> FlowResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            FlowError::io(
                format!("Failed to read config file: {}", e),
                path.display().to_string(),
            )
        })?;

        let config: StepwiseConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| FlowError::parse("toml", e.to_string()))?
            }
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| FlowError::parse("yaml", e.to_string()))?,
            _ => serde_json::from_str(&content)
                .map_err(|e| FlowError::parse("json", e.to_string()))?,
        };

        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Apply `STEPWISE_*` overrides from the process environment
    pub fn apply_env(&mut self) -> FlowResult<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> FlowResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(defaults::ENV_MIN_BUSY_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                FlowError::config_with_context(
                    format!("Invalid minimum busy duration '{}'", raw),
                    defaults::ENV_MIN_BUSY_MS,
                )
            })?;
            self.engine.min_busy_duration = Duration::from_millis(ms);
        }

        if let Some(raw) = lookup(defaults::ENV_EVENT_CAPACITY) {
            let capacity: usize = raw.trim().parse().map_err(|_| {
                FlowError::config_with_context(
                    format!("Invalid event capacity '{}'", raw),
                    defaults::ENV_EVENT_CAPACITY,
                )
            })?;
            self.engine.event_capacity = capacity;
        }

        let mut logging = LoggingConfig {
            level: String::new(),
            format: String::new(),
        };
        if let Some(level) = lookup(defaults::ENV_LOG_LEVEL) {
            logging.level = level;
        }
        if let Some(format) = lookup(defaults::ENV_LOG_FORMAT) {
            logging.format = format;
        }
        self.logging.merge(logging);

        Ok(())
    }
}
