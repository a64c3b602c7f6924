//! Builder for question engines

use std::sync::Arc;

use super::QuestionEngine;
use crate::config::EngineConfig;
use crate::error::FlowResult;
use crate::fault::EngineFault;
use crate::model::{History, Question};
use crate::provider::DecisionProvider;

pub(crate) type CompleteHook = Arc<dyn Fn(&History) + Send + Sync>;
pub(crate) type FaultHook = Arc<dyn Fn(&EngineFault) + Send + Sync>;

/// Caller callbacks
#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub on_complete: Option<CompleteHook>,
    pub on_fault: Option<FaultHook>,
}

/// Builder for [`QuestionEngine`] with fluent API
pub struct EngineBuilder {
    initial: Question,
    provider: Arc<dyn DecisionProvider>,
    config: EngineConfig,
    hooks: Hooks,
}

impl EngineBuilder {
    pub(crate) fn new(initial: Question, provider: Arc<dyn DecisionProvider>) -> Self {
        Self {
            initial,
            provider,
            config: EngineConfig::default(),
            hooks: Hooks::default(),
        }
    }

    /// Set engine configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Called with the full history each time a run completes
    pub fn on_complete<F>(mut self, hook: F) -> Self
    where
        F: Fn(&History) + Send + Sync + 'static,
    {
        self.hooks.on_complete = Some(Arc::new(hook));
        self
    }

    /// Called for every fault the engine reports
    pub fn on_fault<F>(mut self, hook: F) -> Self
    where
        F: Fn(&EngineFault) + Send + Sync + 'static,
    {
        self.hooks.on_fault = Some(Arc::new(hook));
        self
    }

    /// Build the engine, presenting the initial question
    pub fn build(self) -> FlowResult<QuestionEngine> {
        self.config.validate()?;
        self.initial.validate()?;
        Ok(QuestionEngine::assemble(
            self.initial,
            self.provider,
            self.config,
            self.hooks,
        ))
    }
}
