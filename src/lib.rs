//! Stepwise
//!
//! Guided multiple-choice flows with backtracking. This crate re-exports
//! [`stepwise_core`] and adds process-level logging setup.
//!
//! ```no_run
//! use stepwise::{DecisionTree, QuestionEngine, StepwiseConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = StepwiseConfig::load(None)?;
//! stepwise::logging::init(&config.logging)?;
//!
//! let tree = DecisionTree::load("flow.toml".as_ref())?;
//! let engine = QuestionEngine::builder(tree.initial_question(), tree)
//!     .with_config(config.engine)
//!     .on_complete(|history| println!("done after {} answers", history.len()))
//!     .build()?;
//!
//! engine.select_value("1").await?;
//! # Ok(())
//! # }
//! ```

pub mod logging;

pub use stepwise_core::*;
