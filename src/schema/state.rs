use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::entity::Value;
use super::node::NodeId;
use super::timeline::TimelineId;

/// Newtype wrapper for game-state IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub u64);

/// The single live "current position" record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub id: StateId,
    pub current_node_id: NodeId,
    pub current_timeline_id: TimelineId,
    #[serde(default)]
    pub variables: HashMap<String, Value>,
}

/// A partial update to `GameState`.
///
/// Top-level fields left as `None` keep their value; `variables` are merged
/// key by key into the existing map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatePatch {
    #[serde(default)]
    pub current_node_id: Option<NodeId>,
    #[serde(default)]
    pub current_timeline_id: Option<TimelineId>,
    #[serde(default)]
    pub variables: HashMap<String, Value>,
}

impl StatePatch {
    pub fn node(node_id: NodeId) -> Self {
        Self {
            current_node_id: Some(node_id),
            ..Self::default()
        }
    }

    pub fn timeline(timeline_id: TimelineId) -> Self {
        Self {
            current_timeline_id: Some(timeline_id),
            ..Self::default()
        }
    }

    pub fn variable(key: impl Into<String>, value: Value) -> Self {
        Self {
            variables: HashMap::from([(key.into(), value)]),
            ..Self::default()
        }
    }
}

impl GameState {
    /// Apply a patch. Never a full overwrite: variables set earlier and not
    /// named in the patch survive.
    pub fn merge(&mut self, patch: StatePatch) {
        if let Some(node_id) = patch.current_node_id {
            self.current_node_id = node_id;
        }
        if let Some(timeline_id) = patch.current_timeline_id {
            self.current_timeline_id = timeline_id;
        }
        self.variables.extend(patch.variables);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initial() -> GameState {
        GameState {
            id: StateId(1),
            current_node_id: NodeId(1),
            current_timeline_id: TimelineId(1),
            variables: HashMap::from([("visited_ward".to_string(), Value::Bool(true))]),
        }
    }

    #[test]
    fn merge_node_keeps_variables() {
        let mut state = initial();
        state.merge(StatePatch::node(NodeId(2)));
        assert_eq!(state.current_node_id, NodeId(2));
        assert_eq!(state.current_timeline_id, TimelineId(1));
        assert_eq!(state.variables.get("visited_ward"), Some(&Value::Bool(true)));
    }

    #[test]
    fn merge_variables_deep() {
        let mut state = initial();
        state.merge(StatePatch::variable("trust", Value::Int(2)));
        assert_eq!(state.variables.len(), 2);
        state.merge(StatePatch::variable("visited_ward", Value::Bool(false)));
        assert_eq!(state.variables.get("visited_ward"), Some(&Value::Bool(false)));
        assert_eq!(state.variables.get("trust"), Some(&Value::Int(2)));
    }

    #[test]
    fn merge_timeline_only() {
        let mut state = initial();
        state.merge(StatePatch::timeline(TimelineId(3)));
        assert_eq!(state.current_timeline_id, TimelineId(3));
        assert_eq!(state.current_node_id, NodeId(1));
    }

    #[test]
    fn empty_patch_is_noop() {
        let mut state = initial();
        let before = state.clone();
        state.merge(StatePatch::default());
        assert_eq!(state, before);
    }
}
