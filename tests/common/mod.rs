//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use stepwise::{
    DecisionProvider, EngineConfig, EngineFault, History, Outcome, ProviderError, Question,
    QuestionEngine, QuestionOption,
};

pub fn question(id: &str, options: &[(&str, &str)]) -> Question {
    Question::new(
        id,
        format!("Question {}", id),
        options
            .iter()
            .map(|(value, label)| QuestionOption::new(*value, *label))
            .collect(),
    )
}

/// Linear flow over `questions`; each question is followed by the next one,
/// the last one by Terminal
///
/// Answers must name the question shown at their position; anything else
/// panics, so an engine that builds an impossible history fails the test
/// immediately.
pub struct LinearFlow {
    questions: Vec<Question>,
    calls: AtomicUsize,
}

impl LinearFlow {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecisionProvider for LinearFlow {
    async fn decide(&self, history: &History) -> Result<Outcome, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for (depth, answer) in history.iter().enumerate() {
            let shown = self
                .questions
                .get(depth)
                .unwrap_or_else(|| panic!("history longer than the flow: {history:?}"));
            assert_eq!(
                answer.question_id, shown.id,
                "answer {depth} does not belong to the question shown there"
            );
            assert!(
                shown.option(&answer.value).is_some(),
                "answer {depth} is not an option of '{}'",
                shown.id
            );
        }
        Ok(match self.questions.get(history.len()) {
            Some(next) => Outcome::next(next.clone()),
            None => Outcome::Terminal,
        })
    }
}

/// Collects hook invocations
#[derive(Clone, Default)]
pub struct Hooks {
    pub completions: Arc<Mutex<Vec<History>>>,
    pub faults: Arc<Mutex<Vec<EngineFault>>>,
}

impl Hooks {
    pub fn build<P>(&self, initial: Question, provider: P, config: EngineConfig) -> QuestionEngine
    where
        P: DecisionProvider + 'static,
    {
        let completions = self.completions.clone();
        let faults = self.faults.clone();
        QuestionEngine::builder(initial, provider)
            .with_config(config)
            .on_complete(move |history| completions.lock().push(history.clone()))
            .on_fault(move |fault| faults.lock().push(fault.clone()))
            .build()
            .expect("valid engine")
    }

    pub fn completions(&self) -> Vec<History> {
        self.completions.lock().clone()
    }

    pub fn faults(&self) -> Vec<EngineFault> {
        self.faults.lock().clone()
    }
}
