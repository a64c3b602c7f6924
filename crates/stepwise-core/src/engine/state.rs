//! Engine state machine states

use serde::{Deserialize, Serialize};

use crate::model::{History, Question};

/// Direction of the decision being awaited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Triggered by selecting an option
    Forward,
    /// Triggered by going back (or retrying a stalled back step)
    Backward,
}

/// Navigation kinds published to observers
///
/// Only *which* transition happened is published. Animation direction and
/// similar presentation concerns are derived from this by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Forward,
    Backward,
    Reset,
}

impl From<Direction> for Transition {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => Transition::Forward,
            Direction::Backward => Transition::Backward,
        }
    }
}

/// Observable engine state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EngineState {
    /// A question is shown and awaits a selection
    Presenting { question: Question, history: History },
    /// The provider is computing what follows `history`
    AwaitingDecision {
        history: History,
        direction: Direction,
    },
    /// Back navigation produced an inconsistent result; no question is shown
    Stalled {
        history: History,
        expected_question_id: String,
    },
    /// The flow ended; terminal until reset
    Complete { history: History },
}

impl EngineState {
    /// Initial state for a run
    pub fn initial(question: Question) -> Self {
        Self::Presenting {
            question,
            history: History::new(),
        }
    }

    /// Discriminant without payload
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Presenting { .. } => StateKind::Presenting,
            Self::AwaitingDecision { .. } => StateKind::AwaitingDecision,
            Self::Stalled { .. } => StateKind::Stalled,
            Self::Complete { .. } => StateKind::Complete,
        }
    }

    /// History of the state
    pub fn history(&self) -> &History {
        match self {
            Self::Presenting { history, .. }
            | Self::AwaitingDecision { history, .. }
            | Self::Stalled { history, .. }
            | Self::Complete { history } => history,
        }
    }

    /// Question on screen, only while presenting
    pub fn question(&self) -> Option<&Question> {
        match self {
            Self::Presenting { question, .. } => Some(question),
            _ => None,
        }
    }
}

/// State discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Presenting,
    AwaitingDecision,
    Stalled,
    Complete,
}

impl std::fmt::Display for StateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateKind::Presenting => write!(f, "presenting"),
            StateKind::AwaitingDecision => write!(f, "awaiting a decision"),
            StateKind::Stalled => write!(f, "stalled"),
            StateKind::Complete => write!(f, "complete"),
        }
    }
}

impl StateKind {
    /// Check if the state ends the run (until reset)
    pub fn is_terminal(&self) -> bool {
        matches!(self, StateKind::Complete)
    }

    /// Check if a decision is outstanding
    pub fn is_busy(&self) -> bool {
        matches!(self, StateKind::AwaitingDecision)
    }

    /// Check if a transition to another state is valid
    ///
    /// Reset (back to `Presenting`) is legal from every state.
    pub fn can_transition_to(&self, target: &StateKind) -> bool {
        match (self, target) {
            (_, StateKind::Presenting) => true,
            (StateKind::Presenting, StateKind::AwaitingDecision) => true,
            (StateKind::Stalled, StateKind::AwaitingDecision) => true,
            (StateKind::AwaitingDecision, StateKind::Stalled) => true,
            (StateKind::AwaitingDecision, StateKind::Complete) => true,
            _ => false,
        }
    }
}
