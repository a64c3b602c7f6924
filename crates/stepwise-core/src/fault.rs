//! Navigation faults
//!
//! Every fault is recoverable: the engine leaves its state consistent and
//! delivers the fault through the `on_fault` hook and the event stream.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::StateKind;

/// A problem observed while navigating the flow
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineFault {
    /// The selected option is not one of the current question's options
    #[error("option '{value}' does not belong to question '{question_id}'")]
    InvalidOption { question_id: String, value: String },

    /// A navigation was requested while a decision is outstanding
    #[error("a decision is already in progress")]
    Busy,

    /// The decision provider failed; the step was rolled back
    #[error("decision provider failed: {message}")]
    ProviderFailure { message: String },

    /// Back navigation recomputed something other than what was shown
    #[error("decision provider is inconsistent at depth {depth}: expected question '{expected}', got {found}")]
    ProviderInconsistency {
        depth: usize,
        expected: String,
        found: String,
    },

    /// The operation is not legal in the current state
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: String,
        state: StateKind,
    },

    /// Back navigation was requested at the first question
    #[error("there is no previous question")]
    HistoryEmpty,

    /// A question handed to `start` failed validation
    #[error("invalid question '{question_id}': {reason}")]
    InvalidQuestion { question_id: String, reason: String },
}

impl EngineFault {
    pub(crate) fn invalid_state(operation: &str, state: StateKind) -> Self {
        Self::InvalidState {
            operation: operation.to_string(),
            state,
        }
    }

    /// Stable code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidOption { .. } => "INVALID_OPTION",
            Self::Busy => "BUSY",
            Self::ProviderFailure { .. } => "PROVIDER_FAILURE",
            Self::ProviderInconsistency { .. } => "PROVIDER_INCONSISTENCY",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::HistoryEmpty => "HISTORY_EMPTY",
            Self::InvalidQuestion { .. } => "INVALID_QUESTION",
        }
    }

    /// Whether repeating the same call later can succeed
    ///
    /// Busy clears once the decision resolves; provider failures roll back
    /// so the same selection can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy | Self::ProviderFailure { .. })
    }

    /// Whether the fault points at the caller-supplied provider
    pub fn is_provider_fault(&self) -> bool {
        matches!(
            self,
            Self::ProviderFailure { .. } | Self::ProviderInconsistency { .. }
        )
    }
}
