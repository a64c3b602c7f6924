//! Default configuration values

use std::time::Duration;

/// Minimum time the busy flag stays raised around a decision (500 ms)
pub const MIN_BUSY_MS: u64 = 500;

/// Minimum busy duration as Duration
pub const MIN_BUSY_DURATION: Duration = Duration::from_millis(MIN_BUSY_MS);

/// Capacity of the engine event broadcast channel
pub const EVENT_CAPACITY: usize = 64;

/// Default log level
pub const LOG_LEVEL: &str = "info";

/// Default log format
pub const LOG_FORMAT: &str = "pretty";

/// Environment variable overriding the minimum busy duration (milliseconds)
pub const ENV_MIN_BUSY_MS: &str = "STEPWISE_MIN_BUSY_MS";

/// Environment variable overriding the event channel capacity
pub const ENV_EVENT_CAPACITY: &str = "STEPWISE_EVENT_CAPACITY";

/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "STEPWISE_LOG_LEVEL";

/// Environment variable overriding the log format
pub const ENV_LOG_FORMAT: &str = "STEPWISE_LOG_FORMAT";
