//! Value types exchanged between the engine and its callers

mod history;
mod question;

pub use history::History;
pub use question::{Answer, Outcome, Question, QuestionOption};
