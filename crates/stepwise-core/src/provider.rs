//! Decision provider contract
//!
//! The engine never owns question content. It asks a caller-supplied
//! [`DecisionProvider`] for the next question given the complete answer
//! history, and it recomputes (rather than replays) earlier questions when
//! the user navigates back.
//!
//! # Contract
//!
//! Implementations must be:
//!
//! - **Deterministic**: value-equal histories yield value-equal outcomes.
//!   Back navigation depends on this.
//! - **Free of history side effects**: read-only lookups are fine, but the
//!   history snapshot must not be retained or mutated across calls.
//! - **Total over reachable histories**: every history the engine can build
//!   by moving forward gets a `Question` or `Terminal`.
//!
//! The engine cannot check these properties; it only reports the violations
//! it can observe (see [`EngineFault`](crate::fault::EngineFault)).

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::model::{History, Outcome};

/// Failure raised by a decision provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// A lookup backing the decision failed (map data, remote service, ...)
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// The history does not correspond to any path the provider knows
    #[error("history diverged at depth {depth}: {reason}")]
    Diverged { depth: usize, reason: String },

    /// Anything else
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProviderError {
    /// Create a lookup failure
    pub fn lookup(message: impl Into<String>) -> Self {
        Self::Lookup(message.into())
    }

    /// Create a divergence failure
    pub fn diverged(depth: usize, reason: impl Into<String>) -> Self {
        Self::Diverged {
            depth,
            reason: reason.into(),
        }
    }
}

/// Computes the next question from the complete answer history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Decide what follows `history`
    async fn decide(&self, history: &History) -> Result<Outcome, ProviderError>;
}

#[async_trait]
impl<T> DecisionProvider for Arc<T>
where
    T: DecisionProvider + ?Sized,
{
    async fn decide(&self, history: &History) -> Result<Outcome, ProviderError> {
        (**self).decide(history).await
    }
}

// ============================================================================
// Closure adapters
// ============================================================================

type DecideFn = dyn Fn(History) -> BoxFuture<'static, Result<Outcome, ProviderError>> + Send + Sync;

/// Provider backed by an async closure over an owned history snapshot
pub struct FnProvider {
    f: Box<DecideFn>,
}

/// Wrap an async closure as a [`DecisionProvider`]
///
/// The closure receives its own copy of the history so the returned future
/// can be `'static`.
pub fn provider_fn<F, Fut>(f: F) -> FnProvider
where
    F: Fn(History) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Outcome, ProviderError>> + Send + 'static,
{
    FnProvider {
        f: Box::new(move |history: History| f(history).boxed()),
    }
}

#[async_trait]
impl DecisionProvider for FnProvider {
    async fn decide(&self, history: &History) -> Result<Outcome, ProviderError> {
        (self.f)(history.clone()).await
    }
}

/// Provider backed by a synchronous closure
pub struct SyncFnProvider<F> {
    f: F,
}

/// Wrap a plain closure as a [`DecisionProvider`]
pub fn sync_provider_fn<F>(f: F) -> SyncFnProvider<F>
where
    F: Fn(&History) -> Result<Outcome, ProviderError> + Send + Sync,
{
    SyncFnProvider { f }
}

#[async_trait]
impl<F> DecisionProvider for SyncFnProvider<F>
where
    F: Fn(&History) -> Result<Outcome, ProviderError> + Send + Sync,
{
    async fn decide(&self, history: &History) -> Result<Outcome, ProviderError> {
        (self.f)(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, Question, QuestionOption};

    fn answer(question_id: &str, value: &str) -> Answer {
        Answer {
            question_id: question_id.into(),
            value: value.into(),
            label: value.into(),
        }
    }

    #[tokio::test]
    async fn test_sync_provider_fn() {
        let provider = sync_provider_fn(|history: &History| match history.len() {
            0 => Ok(Outcome::next(Question::new(
                "floor",
                "Which floor?",
                vec![QuestionOption::new("1", "1F")],
            ))),
            _ => Ok(Outcome::Terminal),
        });

        let first = provider.decide(&History::new()).await.unwrap();
        assert_eq!(first.question().map(|q| q.id.as_str()), Some("floor"));

        let done = provider
            .decide(&History::new().append(answer("floor", "1")))
            .await
            .unwrap();
        assert!(done.is_terminal());
    }

    #[tokio::test]
    async fn test_async_provider_fn_sees_snapshot() {
        let provider = provider_fn(|history: History| async move {
            tokio::task::yield_now().await;
            match history.value_of("floor") {
                Some(_) => Ok(Outcome::Terminal),
                None => Err(ProviderError::lookup("no floor selected")),
            }
        });

        let err = provider.decide(&History::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "lookup failed: no floor selected");

        let ok = provider
            .decide(&History::new().append(answer("floor", "2")))
            .await
            .unwrap();
        assert!(ok.is_terminal());
    }

    #[tokio::test]
    async fn test_shared_provider_delegates() {
        let mut mock = MockDecisionProvider::new();
        mock.expect_decide()
            .times(2)
            .returning(|_| Ok(Outcome::Terminal));

        let shared = Arc::new(mock);
        let as_dyn: Arc<dyn DecisionProvider> = Arc::new(shared.clone());
        assert!(as_dyn.decide(&History::new()).await.unwrap().is_terminal());
        assert!(shared.decide(&History::new()).await.unwrap().is_terminal());
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::diverged(2, "unknown option 'x'");
        assert_eq!(
            err.to_string(),
            "history diverged at depth 2: unknown option 'x'"
        );
        let other: ProviderError = anyhow::anyhow!("boom").into();
        assert_eq!(other.to_string(), "boom");
    }
}
