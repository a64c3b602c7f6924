//! Synchronous core of the question engine
//!
//! Everything here runs under the engine mutex and never awaits. The async
//! handle issues a [`Ticket`] when a navigation starts and hands the
//! provider's result back to [`Machine::settle`] when it resolves.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::state::{Direction, EngineState, StateKind};
use crate::fault::EngineFault;
use crate::model::{History, Outcome, Question};
use crate::provider::{DecisionProvider, ProviderError};

/// Decision that has been issued and not yet settled
#[derive(Debug)]
pub(crate) struct Pending {
    /// History snapshot the decision was requested for
    pub issued_for: History,
    pub direction: Direction,
    /// State restored when the provider fails or the caller abandons the call
    pub rollback: EngineState,
    /// Question id the provider must reproduce (back navigation only)
    pub expected_question_id: Option<String>,
}

/// Everything the async side needs to run one decision
pub(crate) struct Ticket {
    pub run_id: Uuid,
    pub epoch: u64,
    pub history: History,
    pub direction: Direction,
    pub provider: Arc<dyn DecisionProvider>,
    /// Answer known without asking the provider (back to the first question)
    pub shortcut: Option<Question>,
    pub cancel: CancellationToken,
}

/// How a decision settled
#[derive(Debug)]
pub(crate) enum Settled {
    Presented { question: Question, depth: usize },
    Completed { history: History },
    /// Provider failed; state rolled back
    RolledBack { fault: EngineFault },
    /// Back navigation inconsistent; state stalled
    Stalled { fault: EngineFault },
}

#[derive(Debug)]
pub(crate) struct Machine {
    pub initial: Question,
    pub state: EngineState,
    pub run_id: Uuid,
    /// Bumped on every (re)start; decisions from older epochs are stale
    pub epoch: u64,
    pub cancel: CancellationToken,
    pub pending: Option<Pending>,
}

impl Machine {
    pub fn new(initial: Question) -> Self {
        Self {
            state: EngineState::initial(initial.clone()),
            initial,
            run_id: Uuid::new_v4(),
            epoch: 0,
            cancel: CancellationToken::new(),
            pending: None,
        }
    }

    /// Begin a fresh run at `initial`, invalidating any outstanding decision
    pub fn restart(&mut self, initial: Question) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.epoch += 1;
        self.run_id = Uuid::new_v4();
        self.pending = None;
        self.state = EngineState::initial(initial.clone());
        self.initial = initial;
    }

    /// Fault for an operation attempted in the wrong state
    pub fn reject(&self, operation: &str) -> EngineFault {
        match self.state.kind() {
            StateKind::AwaitingDecision => EngineFault::Busy,
            kind => EngineFault::invalid_state(operation, kind),
        }
    }

    /// Move to `AwaitingDecision` and hand out the ticket for it
    pub fn issue(
        &mut self,
        history: History,
        direction: Direction,
        expected_question_id: Option<String>,
        provider: Arc<dyn DecisionProvider>,
    ) -> Ticket {
        debug_assert!(
            self.state
                .kind()
                .can_transition_to(&StateKind::AwaitingDecision)
        );

        let shortcut = match direction {
            Direction::Backward if history.is_empty() => Some(self.initial.clone()),
            _ => None,
        };
        let rollback = std::mem::replace(
            &mut self.state,
            EngineState::AwaitingDecision {
                history: history.clone(),
                direction,
            },
        );
        self.pending = Some(Pending {
            issued_for: history.clone(),
            direction,
            rollback,
            expected_question_id,
        });

        Ticket {
            run_id: self.run_id,
            epoch: self.epoch,
            history,
            direction,
            provider,
            shortcut,
            cancel: self.cancel.clone(),
        }
    }

    /// Take the pending decision if it is still the one `epoch`/`history` refer to
    pub fn take_pending(&mut self, epoch: u64, history: &History) -> Option<Pending> {
        if self.epoch != epoch {
            return None;
        }
        match &self.pending {
            Some(p) if &p.issued_for == history => self.pending.take(),
            _ => None,
        }
    }

    /// Apply a provider result to the pending decision
    pub fn settle(
        &mut self,
        pending: Pending,
        result: Result<Outcome, ProviderError>,
    ) -> Settled {
        let Pending {
            issued_for: history,
            direction,
            rollback,
            expected_question_id,
        } = pending;
        let depth = history.len();

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = rollback;
                return Settled::RolledBack {
                    fault: EngineFault::ProviderFailure {
                        message: e.to_string(),
                    },
                };
            }
        };

        match (outcome, direction) {
            (Outcome::Question(question), _) => {
                if let Err(e) = question.validate() {
                    self.state = rollback;
                    return Settled::RolledBack {
                        fault: EngineFault::ProviderFailure {
                            message: e.to_string(),
                        },
                    };
                }
                if let Some(expected) = expected_question_id {
                    if question.id != expected {
                        let found = format!("question '{}'", question.id);
                        return self.stall(history, expected, found);
                    }
                }
                self.state = EngineState::Presenting {
                    question: question.clone(),
                    history,
                };
                Settled::Presented { question, depth }
            }
            (Outcome::Terminal, Direction::Forward) => {
                self.state = EngineState::Complete {
                    history: history.clone(),
                };
                Settled::Completed { history }
            }
            (Outcome::Terminal, Direction::Backward) => {
                let expected = expected_question_id.unwrap_or_default();
                self.stall(history, expected, "terminal".to_string())
            }
        }
    }

    /// Abandon the pending decision, restoring the pre-navigation state
    pub fn abandon(&mut self, epoch: u64, history: &History) -> bool {
        match self.take_pending(epoch, history) {
            Some(pending) => {
                self.state = pending.rollback;
                true
            }
            None => false,
        }
    }

    fn stall(&mut self, history: History, expected: String, found: String) -> Settled {
        let depth = history.len();
        self.state = EngineState::Stalled {
            history,
            expected_question_id: expected.clone(),
        };
        Settled::Stalled {
            fault: EngineFault::ProviderInconsistency {
                depth,
                expected,
                found,
            },
        }
    }
}
