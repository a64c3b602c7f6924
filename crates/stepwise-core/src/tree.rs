//! Declarative decision trees
//!
//! A [`DecisionTree`] is a [`DecisionProvider`] described as data: each node
//! is a question whose options either point at the next node or end the
//! flow. Trees load from TOML, YAML or JSON.
//!
//! ```toml
//! start = "floor"
//!
//! [[nodes]]
//! id = "floor"
//! title = "Which floor are you on?"
//! options = [
//!     { value = "1", label = "1F", next = "nearby" },
//!     { value = "2", label = "2F" },
//! ]
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::{FlowError, FlowResult};
use crate::model::{History, Outcome, Question, QuestionOption};
use crate::provider::{DecisionProvider, ProviderError};

/// Serialized form of a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDocument {
    /// Id of the first question
    pub start: String,
    pub nodes: Vec<TreeNode>,
}

/// One question of a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub options: Vec<TreeOption>,
}

/// An option and where it leads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeOption {
    pub value: String,
    pub label: String,
    /// Next node id; `None` ends the flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl TreeNode {
    fn question(&self) -> Question {
        let options = self
            .options
            .iter()
            .map(|o| QuestionOption::new(&o.value, &o.label))
            .collect();
        let question = Question::new(&self.id, &self.title, options);
        match &self.description {
            Some(description) => question.with_description(description),
            None => question,
        }
    }
}

/// Validated, deterministic decision provider built from a [`TreeDocument`]
#[derive(Debug, Clone)]
pub struct DecisionTree {
    start: String,
    nodes: HashMap<String, TreeNode>,
}

impl DecisionTree {
    /// Build and validate a tree
    pub fn new(document: TreeDocument) -> FlowResult<Self> {
        let mut nodes = HashMap::with_capacity(document.nodes.len());
        for node in document.nodes {
            node.question().validate()?;
            if nodes.contains_key(&node.id) {
                return Err(FlowError::invalid_tree(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
            nodes.insert(node.id.clone(), node);
        }

        if !nodes.contains_key(&document.start) {
            return Err(FlowError::invalid_tree(format!(
                "start node '{}' does not exist",
                document.start
            )));
        }

        for node in nodes.values() {
            for option in &node.options {
                if let Some(next) = &option.next {
                    if !nodes.contains_key(next) {
                        return Err(FlowError::invalid_tree(format!(
                            "option '{}' of '{}' leads to unknown node '{}'",
                            option.value, node.id, next
                        )));
                    }
                }
            }
        }

        let tree = Self {
            start: document.start,
            nodes,
        };
        tree.check_acyclic()?;

        let reachable = tree.reachable();
        if reachable.len() < tree.nodes.len() {
            tracing::warn!(
                unreachable = tree.nodes.len() - reachable.len(),
                "decision tree has unreachable nodes"
            );
        }
        Ok(tree)
    }

    /// Parse a TOML tree
    pub fn from_toml_str(content: &str) -> FlowResult<Self> {
        let document: TreeDocument =
            toml::from_str(content).map_err(|e| FlowError::parse("toml", e.to_string()))?;
        Self::new(document)
    }

    /// Parse a JSON tree
    pub fn from_json_str(content: &str) -> FlowResult<Self> {
        let document: TreeDocument =
            serde_json::from_str(content).map_err(|e| FlowError::parse("json", e.to_string()))?;
        Self::new(document)
    }

    /// Parse a YAML tree
    pub fn from_yaml_str(content: &str) -> FlowResult<Self> {
        let document: TreeDocument =
            serde_yaml::from_str(content).map_err(|e| FlowError::parse("yaml", e.to_string()))?;
        Self::new(document)
    }

    /// Load a tree file; the format follows the extension (JSON otherwise)
    pub fn load(path: &Path) -> FlowResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FlowError::io(
                format!("Failed to read decision tree: {}", e),
                path.display().to_string(),
            )
        })?;

        let tree = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Self::from_toml_str(&content)?,
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content)?,
            _ => Self::from_json_str(&content)?,
        };

        tracing::debug!(
            path = %path.display(),
            nodes = tree.nodes.len(),
            "loaded decision tree"
        );
        Ok(tree)
    }

    /// The question the flow starts with
    pub fn initial_question(&self) -> Question {
        self.root().question()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Outcome for `history`, walking from the root
    pub fn outcome(&self, history: &History) -> Result<Outcome, ProviderError> {
        let mut node = self.root();
        for (depth, answer) in history.iter().enumerate() {
            if answer.question_id != node.id {
                return Err(ProviderError::diverged(
                    depth,
                    format!(
                        "expected an answer to '{}', found '{}'",
                        node.id, answer.question_id
                    ),
                ));
            }
            let option = node
                .options
                .iter()
                .find(|o| o.value == answer.value)
                .ok_or_else(|| {
                    ProviderError::diverged(
                        depth,
                        format!("'{}' has no option '{}'", node.id, answer.value),
                    )
                })?;

            match &option.next {
                Some(next) => {
                    node = self.nodes.get(next).ok_or_else(|| {
                        ProviderError::diverged(depth, format!("unknown node '{}'", next))
                    })?;
                }
                None if depth + 1 == history.len() => return Ok(Outcome::Terminal),
                None => {
                    return Err(ProviderError::diverged(
                        depth + 1,
                        "answers continue past the end of the flow",
                    ));
                }
            }
        }
        Ok(Outcome::next(node.question()))
    }

    fn root(&self) -> &TreeNode {
        // `new` guarantees the start node exists
        &self.nodes[&self.start]
    }

    fn reachable(&self) -> HashSet<&str> {
        let mut seen = HashSet::new();
        let mut stack = vec![self.start.as_str()];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.options.iter().filter_map(|o| o.next.as_deref()));
            }
        }
        seen
    }

    fn check_acyclic(&self) -> FlowResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            tree: &'a DecisionTree,
            id: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
        ) -> FlowResult<()> {
            match marks.get(id) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    return Err(FlowError::invalid_tree(format!(
                        "cycle through node '{}'",
                        id
                    )));
                }
                None => {}
            }
            marks.insert(id, Mark::Visiting);
            if let Some(node) = tree.nodes.get(id) {
                for next in node.options.iter().filter_map(|o| o.next.as_deref()) {
                    visit(tree, next, marks)?;
                }
            }
            marks.insert(id, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        for id in self.nodes.keys() {
            visit(self, id, &mut marks)?;
        }
        Ok(())
    }
}

#[async_trait]
impl DecisionProvider for DecisionTree {
    async fn decide(&self, history: &History) -> Result<Outcome, ProviderError> {
        self.outcome(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Answer;
    use tempfile::TempDir;

    const TREE: &str = r#"
start = "floor"

[[nodes]]
id = "floor"
title = "Which floor are you on?"
options = [
    { value = "1", label = "1F", next = "nearby" },
    { value = "2", label = "2F", next = "nearby" },
]

[[nodes]]
id = "nearby"
title = "What is near you?"
description = "Pick the closest landmark"
options = [
    { value = "escalator", label = "Escalator", next = "facing" },
    { value = "exit", label = "Exit" },
]

[[nodes]]
id = "facing"
title = "Which way are you facing?"
options = [
    { value = "north", label = "North" },
    { value = "south", label = "South" },
]
"#;

    fn answer(question_id: &str, value: &str) -> Answer {
        Answer {
            question_id: question_id.into(),
            value: value.into(),
            label: value.into(),
        }
    }

    #[test]
    fn test_walks_tree() {
        let tree = DecisionTree::from_toml_str(TREE).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.initial_question().id, "floor");

        let first = tree.outcome(&History::new()).unwrap();
        assert_eq!(first.question().map(|q| q.id.as_str()), Some("floor"));

        let history = History::new().append(answer("floor", "2"));
        let nearby = tree.outcome(&history).unwrap();
        let question = nearby.question().unwrap();
        assert_eq!(question.id, "nearby");
        assert_eq!(
            question.description.as_deref(),
            Some("Pick the closest landmark")
        );

        let done = tree
            .outcome(&history.append(answer("nearby", "exit")))
            .unwrap();
        assert!(done.is_terminal());
    }

    #[test]
    fn test_divergent_histories() {
        let tree = DecisionTree::from_toml_str(TREE).unwrap();

        let wrong_question = History::new().append(answer("nearby", "exit"));
        assert!(matches!(
            tree.outcome(&wrong_question),
            Err(ProviderError::Diverged { depth: 0, .. })
        ));

        let unknown_value = History::new().append(answer("floor", "7"));
        assert!(matches!(
            tree.outcome(&unknown_value),
            Err(ProviderError::Diverged { depth: 0, .. })
        ));

        let past_end = History::new()
            .append(answer("floor", "1"))
            .append(answer("nearby", "exit"))
            .append(answer("facing", "north"));
        assert!(matches!(
            tree.outcome(&past_end),
            Err(ProviderError::Diverged { depth: 2, .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_target() {
        let json = r#"{
            "start": "floor",
            "nodes": [
                { "id": "floor", "title": "Floor?", "options": [
                    { "value": "1", "label": "1F", "next": "basement" }
                ]}
            ]
        }"#;
        let err = DecisionTree::from_json_str(json).unwrap_err();
        assert_eq!(err.code(), "STEPWISE_INVALID_TREE");
        assert!(err.to_string().contains("basement"));
    }

    #[test]
    fn test_rejects_missing_start_and_duplicates() {
        let yaml = "start: lobby\nnodes:\n  - id: floor\n    title: Floor?\n    options:\n      - { value: '1', label: 1F }\n";
        let err = DecisionTree::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("lobby"));

        let yaml = "start: floor\nnodes:\n  - id: floor\n    title: Floor?\n    options:\n      - { value: '1', label: 1F }\n  - id: floor\n    title: Again?\n    options:\n      - { value: '1', label: 1F }\n";
        let err = DecisionTree::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_rejects_cycles() {
        let document = TreeDocument {
            start: "a".into(),
            nodes: vec![
                TreeNode {
                    id: "a".into(),
                    title: "A".into(),
                    description: None,
                    options: vec![TreeOption {
                        value: "go".into(),
                        label: "Go".into(),
                        next: Some("b".into()),
                    }],
                },
                TreeNode {
                    id: "b".into(),
                    title: "B".into(),
                    description: None,
                    options: vec![TreeOption {
                        value: "back".into(),
                        label: "Back".into(),
                        next: Some("a".into()),
                    }],
                },
            ],
        };
        let err = DecisionTree::new(document).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_rejects_invalid_node() {
        let json = r#"{ "start": "floor", "nodes": [ { "id": "floor", "title": "Floor?", "options": [] } ] }"#;
        let err = DecisionTree::from_json_str(json).unwrap_err();
        assert!(matches!(err, FlowError::InvalidQuestion { .. }));
    }

    #[test]
    fn test_load_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("flow.toml");
        fs::write(&path, TREE).unwrap();
        let tree = DecisionTree::load(&path).unwrap();
        assert_eq!(tree.initial_question().options.len(), 2);

        let missing = DecisionTree::load(&temp_dir.path().join("missing.yaml")).unwrap_err();
        assert_eq!(missing.code(), "STEPWISE_IO");
    }

    #[tokio::test]
    async fn test_decide_is_deterministic() {
        let tree = DecisionTree::from_toml_str(TREE).unwrap();
        let history = History::new().append(answer("floor", "1"));

        let first = tree.decide(&history).await.unwrap();
        let second = tree.decide(&history.clone()).await.unwrap();
        assert_eq!(first, second);
    }
}
