use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::node::{ChoiceId, NodeId};
use super::state::StateId;

/// Newtype wrapper for history entry IDs. Monotonic in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(pub u64);

/// One visit in the audit trail. `choice_id` is `None` for arrivals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryId,
    pub state_id: StateId,
    pub node_id: NodeId,
    pub choice_id: Option<ChoiceId>,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn is_arrival(&self) -> bool {
        self.choice_id.is_none()
    }
}
