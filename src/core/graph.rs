/// Narrative graph: immutable store of story nodes and their choices.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::schema::entity::Value;
use crate::schema::node::{Choice, ChoiceId, Node, NodeId, Storyline, StorylineId};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content integrity error: {0}")]
    Integrity(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Story nodes, their outgoing choices, and the storylines grouping them.
///
/// Built once from validated content. Lookups on unknown ids return
/// `None` or an empty slice; they never fail.
#[derive(Debug, Clone, Default)]
pub struct NarrativeGraph {
    nodes: BTreeMap<NodeId, Node>,
    choices: FxHashMap<NodeId, Vec<Choice>>,
    storylines: FxHashMap<StorylineId, Storyline>,
}

impl NarrativeGraph {
    /// Build a graph, rejecting content that would surface as a dead end
    /// at runtime: duplicate ids, unknown storylines, and choices whose
    /// source or target node does not exist.
    pub fn new(
        storylines: Vec<Storyline>,
        nodes: Vec<Node>,
        choices: Vec<Choice>,
    ) -> Result<NarrativeGraph, ContentError> {
        let mut storyline_map = FxHashMap::default();
        for storyline in storylines {
            let id = storyline.id;
            if storyline_map.insert(id, storyline).is_some() {
                return Err(ContentError::Integrity(format!(
                    "duplicate storyline id {}",
                    id.0
                )));
            }
        }

        let mut node_map = BTreeMap::new();
        for node in nodes {
            if !storyline_map.contains_key(&node.storyline_id) {
                return Err(ContentError::Integrity(format!(
                    "node {} belongs to unknown storyline {}",
                    node.id, node.storyline_id.0
                )));
            }
            let id = node.id;
            if node_map.insert(id, node).is_some() {
                return Err(ContentError::Integrity(format!("duplicate node id {}", id)));
            }
        }

        let mut seen_choices = FxHashSet::default();
        let mut choice_map: FxHashMap<NodeId, Vec<Choice>> = FxHashMap::default();
        for choice in choices {
            if !seen_choices.insert(choice.id) {
                return Err(ContentError::Integrity(format!(
                    "duplicate choice id {}",
                    choice.id
                )));
            }
            if !node_map.contains_key(&choice.node_id) {
                return Err(ContentError::Integrity(format!(
                    "choice {} leaves unknown node {}",
                    choice.id, choice.node_id
                )));
            }
            if !node_map.contains_key(&choice.next_node_id) {
                return Err(ContentError::Integrity(format!(
                    "choice {} leads to unknown node {}",
                    choice.id, choice.next_node_id
                )));
            }
            choice_map.entry(choice.node_id).or_default().push(choice);
        }

        tracing::debug!(
            nodes = node_map.len(),
            choices = seen_choices.len(),
            storylines = storyline_map.len(),
            "Narrative graph loaded"
        );

        Ok(NarrativeGraph {
            nodes: node_map,
            choices: choice_map,
            storylines: storyline_map,
        })
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Choices leaving `node_id`, in authored order. Empty if none.
    pub fn get_choices(&self, node_id: NodeId) -> &[Choice] {
        self.choices.get(&node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find a choice among the choices of one specific node.
    pub fn find_choice(&self, node_id: NodeId, choice_id: ChoiceId) -> Option<&Choice> {
        self.get_choices(node_id).iter().find(|c| c.id == choice_id)
    }

    /// Choices of `node_id` whose conditions hold under `variables`.
    pub fn available_choices(
        &self,
        node_id: NodeId,
        variables: &HashMap<String, Value>,
    ) -> Vec<&Choice> {
        self.get_choices(node_id)
            .iter()
            .filter(|c| c.is_available(variables))
            .collect()
    }

    pub fn is_node_in_storyline(&self, node_id: NodeId, storyline_id: StorylineId) -> bool {
        self.nodes
            .get(&node_id)
            .is_some_and(|node| node.storyline_id == storyline_id)
    }

    pub fn storyline(&self, id: StorylineId) -> Option<&Storyline> {
        self.storylines.get(&id)
    }

    pub fn storyline_of(&self, node_id: NodeId) -> Option<&Storyline> {
        self.nodes
            .get(&node_id)
            .and_then(|node| self.storylines.get(&node.storyline_id))
    }

    /// The single unconditional choice of a node, if that is all it has.
    /// Non-choice nodes authored this way advance along it.
    pub fn continuation(&self, node_id: NodeId) -> Option<&Choice> {
        match self.get_choices(node_id) {
            [only] if only.condition.is_none() => Some(only),
            _ => None,
        }
    }

    /// The node whose id directly follows `node_id`, if present.
    pub fn next_in_sequence(&self, node_id: NodeId) -> Option<&Node> {
        let next = NodeId(node_id.0.checked_add(1)?);
        self.nodes.get(&next)
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every node reachable from `start` through choices or sequential
    /// advance from non-choice nodes.
    pub fn reachable_from(&self, start: NodeId) -> FxHashSet<NodeId> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            for choice in self.get_choices(id) {
                stack.push(choice.next_node_id);
            }
            if !node.is_choice_node && !node.is_ending && self.get_choices(id).is_empty() {
                if let Some(next) = self.next_in_sequence(id) {
                    stack.push(next.id);
                }
            }
        }
        seen
    }
}
