//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use stepwise_core::config::LoggingConfig;
use stepwise_core::error::{FlowError, FlowResult};

const FORMATS: [&str; 3] = ["pretty", "compact", "json"];

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `config.level`. Calling this twice is an
/// error rather than a panic.
pub fn init(config: &LoggingConfig) -> FlowResult<()> {
    let format = config.format.as_str();
    if !FORMATS.contains(&format) {
        return Err(unknown_format(format));
    }

    let filter = filter(&config.level, std::env::var("RUST_LOG").ok())?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match format {
        "json" => builder.json().try_init(),
        "compact" => builder.compact().try_init(),
        _ => builder.pretty().try_init(),
    };

    installed.map_err(|e| {
        FlowError::config_with_context(format!("Failed to install subscriber: {}", e), "logging")
    })
}

/// Build the filter from `RUST_LOG` (if set) or the configured level
pub fn filter(level: &str, rust_log: Option<String>) -> FlowResult<EnvFilter> {
    let directives = rust_log
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| level.to_string());

    EnvFilter::try_new(&directives).map_err(|e| {
        FlowError::config_with_context(
            format!("Invalid log filter '{}': {}", directives, e),
            "logging",
        )
    })
}

fn unknown_format(format: &str) -> FlowError {
    FlowError::config_with_context(
        format!(
            "Unknown log format '{}', expected pretty, compact or json",
            format
        ),
        "logging",
    )
}
