//! Stepwise Core Library
//!
//! Sequencing engine for guided multiple-choice flows: the caller supplies
//! question content through a [`DecisionProvider`], the engine keeps the
//! answer history, enforces one outstanding decision at a time, holds a
//! minimum busy duration around each decision, and recomputes earlier
//! questions when the user navigates back.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod fault;
pub mod gate;
pub mod model;
pub mod provider;
pub mod tree;

// Re-export commonly used types
pub use config::{EngineConfig, LoggingConfig, StepwiseConfig};
pub use engine::{
    Direction, EngineBuilder, EngineState, QuestionEngine, StateKind, Step, Transition,
};
pub use error::{FlowError, FlowResult};
pub use events::{EngineEvent, EngineEventKind};
pub use fault::EngineFault;
pub use gate::{BusySignal, LoadingGate};
pub use model::{Answer, History, Outcome, Question, QuestionOption};
pub use provider::{DecisionProvider, ProviderError, provider_fn, sync_provider_fn};
pub use tree::{DecisionTree, TreeDocument, TreeNode, TreeOption};
