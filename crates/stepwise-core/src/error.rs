//! Error types for construction, configuration and tree loading
//!
//! Runtime navigation problems are not errors in this sense: they are
//! reported as [`EngineFault`](crate::fault::EngineFault) values through the
//! engine's fault hook. `FlowError` covers everything that can go wrong
//! before a flow is running.

use thiserror::Error;

/// Result type alias for stepwise setup operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Main error type for building engines, loading config and decision trees
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// A question failed structural validation
    #[error("Invalid question '{question_id}': {reason}")]
    InvalidQuestion { question_id: String, reason: String },

    /// A decision tree definition is not usable
    #[error("Invalid decision tree: {message}")]
    InvalidTree { message: String },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// Deserialization errors (TOML, YAML, JSON)
    #[error("Parse error ({format}): {message}")]
    Parse { format: String, message: String },
}

impl FlowError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a question validation error
    pub fn invalid_question(question_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQuestion {
            question_id: question_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a decision tree error
    pub fn invalid_tree(message: impl Into<String>) -> Self {
        Self::InvalidTree {
            message: message.into(),
        }
    }

    /// Create an IO error for a path
    pub fn io(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a parse error for the given format
    pub fn parse(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Stable error code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "STEPWISE_CONFIG",
            Self::InvalidQuestion { .. } => "STEPWISE_INVALID_QUESTION",
            Self::InvalidTree { .. } => "STEPWISE_INVALID_TREE",
            Self::Io { .. } => "STEPWISE_IO",
            Self::Parse { .. } => "STEPWISE_PARSE",
        }
    }
}
