//! Engine event stream
//!
//! The engine publishes what happened through a broadcast channel so that
//! presentation layers, loggers and tests can observe it without holding a
//! reference into engine state. Lagging subscribers lose old events; the
//! engine never blocks on them.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::engine::Transition;
use crate::fault::EngineFault;

/// Something observable that happened in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEvent {
    /// Run the event belongs to; a new id is issued on every start/reset
    pub run_id: Uuid,
    /// What happened
    pub kind: EngineEventKind,
}

/// Event payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEventKind {
    /// A navigation was issued (or the run was reset)
    Transition { transition: Transition },
    /// A question is now presented at `depth` (= history length)
    Presented { question_id: String, depth: usize },
    /// The run completed with `answers` answers
    Completed { answers: usize },
    /// A fault was reported
    Fault { fault: EngineFault },
    /// A decision resolved after its run or history was superseded
    Discarded { depth: usize },
}

/// Broadcast publisher for engine events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event; events without subscribers are dropped
    pub fn publish(&self, run_id: Uuid, kind: EngineEventKind) {
        let _ = self.sender.send(EngineEvent { run_id, kind });
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
