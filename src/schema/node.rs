use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::entity::{EntityId, Value};

/// Newtype wrapper for story node IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

/// Newtype wrapper for choice IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoiceId(pub u64);

/// Newtype wrapper for storyline IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorylineId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A narrative thread that groups nodes (e.g. "Clinical", "Family").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storyline {
    pub id: StorylineId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A single story beat. Content is opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub storyline_id: StorylineId,
    pub title: String,
    pub content: String,
    pub is_choice_node: bool,
    #[serde(default)]
    pub is_ending: bool,
    #[serde(default)]
    pub image_path: Option<String>,
}

/// A player-selectable edge from one node to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: ChoiceId,
    pub node_id: NodeId,
    pub text: String,
    pub next_node_id: NodeId,
    /// `None` means the choice is always available.
    #[serde(default)]
    pub condition: Option<Condition>,
    /// Side effects applied in the same action as the transition.
    #[serde(default)]
    pub effects: Vec<ChoiceEffect>,
}

impl Choice {
    /// Returns true if the choice can be taken given the current variables.
    pub fn is_available(&self, variables: &HashMap<String, Value>) -> bool {
        self.condition
            .as_ref()
            .map_or(true, |condition| condition.evaluate(variables))
    }

    /// A choice that leads back to the node it leaves.
    pub fn is_self_loop(&self) -> bool {
        self.node_id == self.next_node_id
    }
}

/// A predicate over game-state variables gating a choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// The variable is set and truthy.
    Flag(String),
    /// The variable is set and equal to the value.
    Equals { key: String, value: Value },
    /// The variable is numeric and at least the threshold.
    AtLeast { key: String, value: f64 },
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    pub fn evaluate(&self, variables: &HashMap<String, Value>) -> bool {
        match self {
            Self::Flag(key) => variables.get(key).is_some_and(Value::is_truthy),
            Self::Equals { key, value } => variables.get(key) == Some(value),
            Self::AtLeast { key, value } => variables
                .get(key)
                .and_then(Value::as_f64)
                .is_some_and(|v| v >= *value),
            Self::Not(inner) => !inner.evaluate(variables),
            Self::All(all) => all.iter().all(|c| c.evaluate(variables)),
            Self::Any(any) => any.iter().any(|c| c.evaluate(variables)),
        }
    }
}

/// A world-model or variable change carried by a choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChoiceEffect {
    SetVariable {
        key: String,
        value: Value,
    },
    SetRelationship {
        from: EntityId,
        to: EntityId,
        kind: String,
        strength: f64,
    },
    /// Shifts an existing strength by `delta`; a missing relationship
    /// starts from 0.0.
    AdjustRelationship {
        from: EntityId,
        to: EntityId,
        kind: String,
        delta: f64,
    },
}
