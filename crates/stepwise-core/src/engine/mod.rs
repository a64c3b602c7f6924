//! Question engine
//!
//! Drives one guided flow: presents a question, records the user's pick,
//! asks the [`DecisionProvider`] what comes next, and walks back by
//! recomputing earlier questions from a truncated history.
//!
//! # Concurrency
//!
//! At most one decision is outstanding at a time; navigation requested while
//! one is pending fails with [`EngineFault::Busy`]. Every decision runs
//! through the engine's [`LoadingGate`], so the busy flag stays up for at
//! least the configured minimum.
//!
//! A decision that resolves after [`reset`](QuestionEngine::reset) (or
//! after the history it was issued for changed) is dropped and reported as
//! [`Step::Discarded`]. Dropping a navigation future before it resolves
//! rolls the engine back to the state it had before the navigation.

mod builder;
mod machine;
mod state;


pub use builder::EngineBuilder;
pub use state::{Direction, EngineState, StateKind, Transition};

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use builder::Hooks;
use machine::{Machine, Settled, Ticket};

use crate::config::EngineConfig;
use crate::error::{FlowError, FlowResult};
use crate::events::{EngineEvent, EngineEventKind, EventBus};
use crate::fault::EngineFault;
use crate::gate::LoadingGate;
use crate::model::{Answer, History, Outcome, Question, QuestionOption};
use crate::provider::{DecisionProvider, ProviderError};

/// Result of a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A new question is on screen
    Presented(Question),
    /// The flow ended with this history
    Completed(History),
    /// The decision was superseded before it resolved
    Discarded,
}

struct Inner {
    machine: Mutex<Machine>,
    provider: RwLock<Arc<dyn DecisionProvider>>,
    gate: LoadingGate,
    events: EventBus,
    hooks: Hooks,
    config: EngineConfig,
}

/// Handle to a question engine
///
/// Cloning is cheap; all clones drive the same flow.
#[derive(Clone)]
pub struct QuestionEngine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for QuestionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let machine = self.inner.machine.lock();
        f.debug_struct("QuestionEngine")
            .field("run_id", &machine.run_id)
            .field("state", &machine.state.kind())
            .field("depth", &machine.state.history().len())
            .finish()
    }
}

impl QuestionEngine {
    /// Start building an engine for `initial` backed by `provider`
    pub fn builder<P>(initial: Question, provider: P) -> EngineBuilder
    where
        P: DecisionProvider + 'static,
    {
        EngineBuilder::new(initial, Arc::new(provider))
    }

    /// Build an engine with default configuration and no hooks
    pub fn new<P>(initial: Question, provider: P) -> FlowResult<Self>
    where
        P: DecisionProvider + 'static,
    {
        Self::builder(initial, provider).build()
    }

    pub(crate) fn assemble(
        initial: Question,
        provider: Arc<dyn DecisionProvider>,
        config: EngineConfig,
        hooks: Hooks,
    ) -> Self {
        let machine = Machine::new(initial);
        debug!(
            run_id = %machine.run_id,
            question_id = %machine.initial.id,
            "question engine created"
        );
        Self {
            inner: Arc::new(Inner {
                machine: Mutex::new(machine),
                provider: RwLock::new(provider),
                gate: LoadingGate::new(config.min_busy_duration),
                events: EventBus::new(config.event_capacity),
                hooks,
                config,
            }),
        }
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Record `option` as the answer to the current question and move on
    pub async fn select_option(&self, option: &QuestionOption) -> Result<Step, EngineFault> {
        let ticket = self.begin(|machine, provider| {
            let question = match &machine.state {
                EngineState::Presenting { question, .. } => question.clone(),
                _ => return Err(machine.reject("select an option")),
            };
            if !question.offers(option) {
                return Err(EngineFault::InvalidOption {
                    question_id: question.id,
                    value: option.value.clone(),
                });
            }
            let answer = Answer::from_option(&question, option);
            let history = machine.state.history().append(answer);
            Ok(machine.issue(history, Direction::Forward, None, provider))
        })?;
        self.resolve(ticket).await
    }

    /// Like [`select_option`](Self::select_option), looking the option up by value
    pub async fn select_value(&self, value: &str) -> Result<Step, EngineFault> {
        let lookup = {
            let machine = self.inner.machine.lock();
            let found = match machine.state.question() {
                Some(question) => question.option(value).cloned().ok_or_else(|| {
                    EngineFault::InvalidOption {
                        question_id: question.id.clone(),
                        value: value.to_string(),
                    }
                }),
                None => Err(machine.reject("select an option")),
            };
            found.map_err(|fault| (machine.run_id, fault))
        };
        match lookup {
            Ok(option) => self.select_option(&option).await,
            Err((run_id, fault)) => Err(self.report(run_id, fault)),
        }
    }

    /// Return to the previous question
    ///
    /// The previous question is recomputed from the truncated history and
    /// must match the one that was answered there; otherwise the engine
    /// stalls with [`EngineFault::ProviderInconsistency`].
    pub async fn go_back(&self) -> Result<Step, EngineFault> {
        let ticket = self.begin(|machine, provider| {
            let history = match &machine.state {
                EngineState::Presenting { history, .. } | EngineState::Stalled { history, .. } => {
                    history.clone()
                }
                _ => return Err(machine.reject("go back")),
            };
            let (truncated, removed) = history.pop().ok_or(EngineFault::HistoryEmpty)?;
            Ok(machine.issue(
                truncated,
                Direction::Backward,
                Some(removed.question_id),
                provider,
            ))
        })?;
        self.resolve(ticket).await
    }

    /// Re-run the back navigation that stalled
    ///
    /// Usually preceded by [`replace_provider`](Self::replace_provider).
    pub async fn retry(&self) -> Result<Step, EngineFault> {
        let ticket = self.begin(|machine, provider| {
            let (history, expected) = match &machine.state {
                EngineState::Stalled {
                    history,
                    expected_question_id,
                } => (history.clone(), expected_question_id.clone()),
                _ => return Err(machine.reject("retry")),
            };
            Ok(machine.issue(history, Direction::Backward, Some(expected), provider))
        })?;
        self.resolve(ticket).await
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start a new run at `initial`, dropping any outstanding decision
    pub fn start(&self, initial: Question) -> Result<(), EngineFault> {
        if let Err(e) = initial.validate() {
            let run_id = self.run_id();
            return Err(self.report(run_id, question_fault(&initial, e)));
        }
        self.restart(initial);
        Ok(())
    }

    /// Restart the current flow at its initial question
    pub fn reset(&self) {
        let initial = self.inner.machine.lock().initial.clone();
        self.restart(initial);
    }

    /// Drop any outstanding decision and return to the initial question
    ///
    /// For flow owners going away. Unlike [`reset`](Self::reset) nothing is
    /// published, so observers do not see a new run.
    pub fn shutdown(&self) {
        let run_id = {
            let mut machine = self.inner.machine.lock();
            let initial = machine.initial.clone();
            machine.restart(initial);
            machine.run_id
        };
        self.inner.gate.signal().clear();
        debug!(run_id = %run_id, "question engine shut down");
    }

    /// Swap the decision provider
    ///
    /// Takes effect for the next decision; one already outstanding keeps
    /// the provider it started with.
    pub fn replace_provider<P>(&self, provider: P)
    where
        P: DecisionProvider + 'static,
    {
        let provider: Arc<dyn DecisionProvider> = Arc::new(provider);
        *self.inner.provider.write() = provider;
        debug!(run_id = %self.run_id(), "decision provider replaced");
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Snapshot of the current state
    pub fn state(&self) -> EngineState {
        self.inner.machine.lock().state.clone()
    }

    /// Question on screen, if any
    pub fn current_question(&self) -> Option<Question> {
        self.inner.machine.lock().state.question().cloned()
    }

    /// Answers recorded so far
    pub fn history(&self) -> History {
        self.inner.machine.lock().state.history().clone()
    }

    /// Question the flow starts with
    pub fn initial_question(&self) -> Question {
        self.inner.machine.lock().initial.clone()
    }

    /// Whether the busy indicator should be shown
    pub fn is_busy(&self) -> bool {
        self.inner.gate.signal().is_busy()
    }

    /// Watch the busy indicator
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.inner.gate.signal().subscribe()
    }

    /// Subscribe to engine events
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.events.subscribe()
    }

    /// Id of the current run
    pub fn run_id(&self) -> Uuid {
        self.inner.machine.lock().run_id
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn provider(&self) -> Arc<dyn DecisionProvider> {
        self.inner.provider.read().clone()
    }

    fn restart(&self, initial: Question) {
        let (run_id, question_id) = {
            let mut machine = self.inner.machine.lock();
            machine.restart(initial);
            (machine.run_id, machine.initial.id.clone())
        };
        self.inner.gate.signal().clear();

        info!(run_id = %run_id, question_id = %question_id, "flow started");
        self.inner.events.publish(
            run_id,
            EngineEventKind::Transition {
                transition: Transition::Reset,
            },
        );
        self.inner.events.publish(
            run_id,
            EngineEventKind::Presented {
                question_id,
                depth: 0,
            },
        );
    }

    /// Issue a decision under the lock; faults are reported after unlocking
    fn begin<F>(&self, issue: F) -> Result<Ticket, EngineFault>
    where
        F: FnOnce(&mut Machine, Arc<dyn DecisionProvider>) -> Result<Ticket, EngineFault>,
    {
        let provider = self.provider();
        let outcome = {
            let mut machine = self.inner.machine.lock();
            let run_id = machine.run_id;
            issue(&mut *machine, provider).map_err(|fault| (run_id, fault))
        };
        outcome.map_err(|(run_id, fault)| self.report(run_id, fault))
    }

    /// Run a ticket's decision through the gate and apply the result
    async fn resolve(&self, ticket: Ticket) -> Result<Step, EngineFault> {
        let Ticket {
            run_id,
            epoch,
            history,
            direction,
            provider,
            shortcut,
            cancel,
        } = ticket;

        debug!(
            run_id = %run_id,
            depth = history.len(),
            direction = ?direction,
            "decision requested"
        );
        self.inner.events.publish(
            run_id,
            EngineEventKind::Transition {
                transition: direction.into(),
            },
        );

        let mut in_flight = InFlight {
            engine: self,
            epoch,
            history: &history,
            armed: true,
        };

        let decision = async {
            match shortcut {
                Some(question) => Ok(Outcome::Question(question)),
                None => provider.decide(&history).await,
            }
        };
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.inner.gate.run(decision) => Some(result),
        };
        in_flight.armed = false;

        match result {
            Some(result) => self.apply(run_id, epoch, &history, result),
            None => Ok(self.discard(run_id, history.len())),
        }
    }

    fn apply(
        &self,
        run_id: Uuid,
        epoch: u64,
        history: &History,
        result: Result<Outcome, ProviderError>,
    ) -> Result<Step, EngineFault> {
        let settled = {
            let mut machine = self.inner.machine.lock();
            let Some(pending) = machine.take_pending(epoch, history) else {
                drop(machine);
                return Ok(self.discard(run_id, history.len()));
            };
            machine.settle(pending, result)
        };

        match settled {
            Settled::Presented { question, depth } => {
                debug!(
                    run_id = %run_id,
                    question_id = %question.id,
                    depth,
                    "question presented"
                );
                self.inner.events.publish(
                    run_id,
                    EngineEventKind::Presented {
                        question_id: question.id.clone(),
                        depth,
                    },
                );
                Ok(Step::Presented(question))
            }
            Settled::Completed { history } => {
                info!(run_id = %run_id, answers = history.len(), "flow completed");
                self.inner.events.publish(
                    run_id,
                    EngineEventKind::Completed {
                        answers: history.len(),
                    },
                );
                if let Some(hook) = &self.inner.hooks.on_complete {
                    hook(&history);
                }
                Ok(Step::Completed(history))
            }
            Settled::RolledBack { fault } | Settled::Stalled { fault } => {
                Err(self.report(run_id, fault))
            }
        }
    }

    fn discard(&self, run_id: Uuid, depth: usize) -> Step {
        warn!(run_id = %run_id, depth, "discarding stale decision");
        self.inner
            .events
            .publish(run_id, EngineEventKind::Discarded { depth });
        Step::Discarded
    }

    /// Deliver a fault to the hook and the event stream
    fn report(&self, run_id: Uuid, fault: EngineFault) -> EngineFault {
        warn!(run_id = %run_id, code = fault.code(), "{}", fault);
        self.inner.events.publish(
            run_id,
            EngineEventKind::Fault {
                fault: fault.clone(),
            },
        );
        if let Some(hook) = &self.inner.hooks.on_fault {
            hook(&fault);
        }
        fault
    }
}

/// Rolls the engine back if a navigation future is dropped mid-decision
struct InFlight<'a> {
    engine: &'a QuestionEngine,
    epoch: u64,
    history: &'a History,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let rolled_back = self
            .engine
            .inner
            .machine
            .lock()
            .abandon(self.epoch, self.history);
        if rolled_back {
            debug!(depth = self.history.len(), "navigation abandoned, state rolled back");
        }
    }
}

fn question_fault(question: &Question, error: FlowError) -> EngineFault {
    match error {
        FlowError::InvalidQuestion {
            question_id,
            reason,
        } => EngineFault::InvalidQuestion {
            question_id,
            reason,
        },
        other => EngineFault::InvalidQuestion {
            question_id: question.id.clone(),
            reason: other.to_string(),
        },
    }
}
