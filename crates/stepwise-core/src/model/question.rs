//! Question, option, answer and outcome value types

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{FlowError, FlowResult};

// ============================================================================
// Question Types
// ============================================================================

/// A multiple-choice question presented to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier, unique among the questions reachable in one flow
    pub id: String,
    /// Question text shown as the heading
    pub title: String,
    /// Optional secondary text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered options, never empty for a valid question
    pub options: Vec<QuestionOption>,
}

impl Question {
    /// Create a new question
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        options: Vec<QuestionOption>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            options,
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Find an option by its value
    pub fn option(&self, value: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.value == value)
    }

    /// Whether `option` is one of this question's options
    pub fn offers(&self, option: &QuestionOption) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// Validate the question structure
    pub fn validate(&self) -> FlowResult<()> {
        if self.id.trim().is_empty() {
            return Err(FlowError::invalid_question(&self.id, "question id is empty"));
        }
        if self.options.is_empty() {
            return Err(FlowError::invalid_question(
                &self.id,
                "question has no options",
            ));
        }

        let mut seen = HashSet::with_capacity(self.options.len());
        for (i, opt) in self.options.iter().enumerate() {
            if opt.label.trim().is_empty() {
                return Err(FlowError::invalid_question(
                    &self.id,
                    format!("option {} has empty label", i + 1),
                ));
            }
            if !seen.insert(opt.value.as_str()) {
                return Err(FlowError::invalid_question(
                    &self.id,
                    format!("duplicate option value '{}'", opt.value),
                ));
            }
        }
        Ok(())
    }
}

/// One selectable option of a [`Question`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Opaque token, unique within its question
    pub value: String,
    /// Display text
    pub label: String,
}

impl QuestionOption {
    /// Create a new option
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

// ============================================================================
// Answer / Outcome
// ============================================================================

/// The recorded response to one question
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Answer {
    /// Id of the question this answers
    pub question_id: String,
    /// Value of the selected option
    pub value: String,
    /// Label of the selected option
    pub label: String,
}

impl Answer {
    /// Build the answer produced by choosing `option` on `question`
    pub fn from_option(question: &Question, option: &QuestionOption) -> Self {
        Self {
            question_id: question.id.clone(),
            value: option.value.clone(),
            label: option.label.clone(),
        }
    }
}

/// What a decision provider says comes next
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "question", rename_all = "snake_case")]
pub enum Outcome {
    /// The flow continues with this question
    Question(Question),
    /// No further question; the flow is complete
    Terminal,
}

impl Outcome {
    /// Continue with `question`
    pub fn next(question: Question) -> Self {
        Self::Question(question)
    }

    /// Check if this outcome ends the flow
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }

    /// The next question, if any
    pub fn question(&self) -> Option<&Question> {
        match self {
            Self::Question(q) => Some(q),
            Self::Terminal => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_question() -> Question {
        Question::new(
            "floor",
            "Which floor?",
            vec![
                QuestionOption::new("1", "1F"),
                QuestionOption::new("2", "2F"),
            ],
        )
    }

    #[test]
    fn test_question_validation() {
        assert!(floor_question().validate().is_ok());

        let empty = Question::new("floor", "Which floor?", vec![]);
        assert!(matches!(
            empty.validate(),
            Err(FlowError::InvalidQuestion { .. })
        ));

        let blank_id = Question::new(" ", "Which floor?", vec![QuestionOption::new("1", "1F")]);
        assert!(blank_id.validate().is_err());

        let duplicate = Question::new(
            "floor",
            "Which floor?",
            vec![
                QuestionOption::new("1", "1F"),
                QuestionOption::new("1", "First"),
            ],
        );
        let err = duplicate.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate option value '1'"));

        let blank_label = Question::new("floor", "?", vec![QuestionOption::new("1", "")]);
        assert!(blank_label.validate().is_err());
    }

    #[test]
    fn test_option_lookup_and_membership() {
        let q = floor_question();
        assert_eq!(q.option("2").map(|o| o.label.as_str()), Some("2F"));
        assert!(q.option("3").is_none());

        assert!(q.offers(&QuestionOption::new("1", "1F")));
        // same value, different label is not the same option
        assert!(!q.offers(&QuestionOption::new("1", "Ground")));
    }

    #[test]
    fn test_answer_from_option() {
        let q = floor_question();
        let answer = Answer::from_option(&q, &q.options[0]);
        assert_eq!(answer.question_id, "floor");
        assert_eq!(answer.value, "1");
        assert_eq!(answer.label, "1F");
    }

    #[test]
    fn test_outcome_serialization() {
        let terminal = serde_json::to_value(Outcome::Terminal).unwrap();
        assert_eq!(terminal, serde_json::json!({ "type": "terminal" }));

        let next = Outcome::next(floor_question().with_description("Pick one"));
        let json = serde_json::to_string(&next).unwrap();
        let back: Outcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, next);
        assert!(!back.is_terminal());
        assert_eq!(back.question().map(|q| q.id.as_str()), Some("floor"));
    }
}
