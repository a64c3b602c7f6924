//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::defaults;
use crate::error::{FlowError, FlowResult};

/// Tunables for a [`QuestionEngine`](crate::engine::QuestionEngine)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum time the busy flag stays raised around each decision
    #[serde(with = "humantime_serde")]
    pub min_busy_duration: Duration,
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_busy_duration: defaults::MIN_BUSY_DURATION,
            event_capacity: defaults::EVENT_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Set the minimum busy duration
    pub fn with_min_busy_duration(mut self, duration: Duration) -> Self {
        self.min_busy_duration = duration;
        self
    }

    /// Set the event channel capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> FlowResult<()> {
        if self.event_capacity == 0 {
            return Err(FlowError::config_with_context(
                "event_capacity must be greater than zero",
                "engine",
            ));
        }
        Ok(())
    }
}
