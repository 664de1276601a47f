use serde::{Deserialize, Serialize};
use std::fmt;

use super::node::NodeId;

/// Newtype wrapper for timeline IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimelineId(pub u64);

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One branch in the tree of alternate story paths.
///
/// Only the root has no parent and no divergence point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub id: TimelineId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: Option<TimelineId>,
    #[serde(default)]
    pub divergence_point_node_id: Option<NodeId>,
}

impl Timeline {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_timeline_from_ron() {
        let t: Timeline =
            ron::from_str(r#"(id: 1, name: "Alpha", description: "Primary timeline")"#).unwrap();
        assert!(t.is_root());
        assert_eq!(t.divergence_point_node_id, None);
    }

    #[test]
    fn branch_is_not_root() {
        let t = Timeline {
            id: TimelineId(2),
            name: "Beta".to_string(),
            description: String::new(),
            parent_id: Some(TimelineId(1)),
            divergence_point_node_id: Some(NodeId(1)),
        };
        assert!(!t.is_root());
    }
}
