use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::state::StateId;

/// Newtype wrapper for relationship IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(pub u64);

/// A typed, directional, weighted edge between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub from_entity_id: EntityId,
    pub to_entity_id: EntityId,
    pub kind: String,
    pub strength: f64,
    pub state_id: StateId,
}

impl Relationship {
    /// Returns true if this relationship is the (from, to, kind) triple.
    pub fn matches(&self, from: EntityId, to: EntityId, kind: &str) -> bool {
        self.from_entity_id == from && self.to_entity_id == to && self.kind == kind
    }

    /// Returns true if the entity is either endpoint.
    pub fn touches(&self, entity: EntityId) -> bool {
        self.from_entity_id == entity || self.to_entity_id == entity
    }
}

/// Clamp a strength into `[0, 1]`. NaN collapses to 0.
pub fn clamp_strength(strength: f64) -> f64 {
    if strength.is_nan() {
        0.0
    } else {
        strength.clamp(0.0, 1.0)
    }
}
