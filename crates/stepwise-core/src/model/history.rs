//! Append/truncate-only answer log
//!
//! `History` is a value: every operation returns a new history and leaves
//! the receiver untouched, so a snapshot handed to an in-flight decision stays
//! valid no matter what the engine does afterwards.

use serde::{Deserialize, Serialize};

use super::question::Answer;

/// Ordered answers accumulated in the current run
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    answers: Vec<Answer>,
}

impl History {
    /// Empty history, as at flow start
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded answers (the current depth)
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Check if nothing has been answered yet
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// All answers in order
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Iterate over the answers in order
    pub fn iter(&self) -> std::slice::Iter<'_, Answer> {
        self.answers.iter()
    }

    /// Answer at step `index`
    pub fn get(&self, index: usize) -> Option<&Answer> {
        self.answers.get(index)
    }

    /// Most recent answer
    pub fn last(&self) -> Option<&Answer> {
        self.answers.last()
    }

    /// Recorded value for `question_id`, if that question was answered
    pub fn value_of(&self, question_id: &str) -> Option<&str> {
        self.answers
            .iter()
            .find(|a| a.question_id == question_id)
            .map(|a| a.value.as_str())
    }

    /// New history with `answer` appended
    pub fn append(&self, answer: Answer) -> History {
        let mut answers = Vec::with_capacity(self.answers.len() + 1);
        answers.extend_from_slice(&self.answers);
        answers.push(answer);
        History { answers }
    }

    /// New history holding only the first `len` answers
    pub fn truncate(&self, len: usize) -> History {
        let keep = len.min(self.answers.len());
        History {
            answers: self.answers[..keep].to_vec(),
        }
    }

    /// Split off the last answer: `(shorter history, removed answer)`
    pub fn pop(&self) -> Option<(History, Answer)> {
        let last = self.answers.last()?.clone();
        Some((self.truncate(self.answers.len() - 1), last))
    }
}

impl From<Vec<Answer>> for History {
    fn from(answers: Vec<Answer>) -> Self {
        Self { answers }
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Answer;
    type IntoIter = std::slice::Iter<'a, Answer>;

    fn into_iter(self) -> Self::IntoIter {
        self.answers.iter()
    }
}
