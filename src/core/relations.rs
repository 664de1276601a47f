/// Relationship graph: the mutable world model of entities and the
/// weighted, typed edges between them.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::graph::ContentError;
use crate::schema::entity::{Entity, EntityId};
use crate::schema::relationship::{clamp_strength, Relationship, RelationshipId};
use crate::schema::state::StateId;

/// Strengths below this read as "weak".
pub const WEAK_BELOW: f64 = 0.3;
/// Strengths above this read as "strong".
pub const STRONG_ABOVE: f64 = 0.8;

#[derive(Debug, Error)]
pub enum RelationshipError {
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),
}

/// Which way a relationship points, seen from the entity being described.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// Qualitative reading of a strength value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrengthBucket {
    Weak,
    Neutral,
    Strong,
}

impl StrengthBucket {
    pub fn of(strength: f64) -> Self {
        if strength > STRONG_ABOVE {
            Self::Strong
        } else if strength < WEAK_BELOW {
            Self::Weak
        } else {
            Self::Neutral
        }
    }

    /// The adverb a renderer can put in front of the relationship.
    pub fn qualifier(&self) -> &'static str {
        match self {
            Self::Weak => "weakly",
            Self::Neutral => "",
            Self::Strong => "strongly",
        }
    }
}

/// One relationship of an entity, ready for natural-language rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipSummary {
    pub direction: Direction,
    pub kind: String,
    pub counterpart: EntityId,
    pub counterpart_name: String,
    pub bucket: StrengthBucket,
}

/// Entities plus at most one current relationship per
/// (from, to, kind) triple.
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    entities: FxHashMap<EntityId, Entity>,
    entity_order: Vec<EntityId>,
    relationships: Vec<Relationship>,
}

impl RelationshipGraph {
    /// Build the world model. Relationships must connect known entities
    /// and triples must be unique.
    pub fn new(
        entities: Vec<Entity>,
        relationships: Vec<Relationship>,
    ) -> Result<RelationshipGraph, ContentError> {
        let mut graph = RelationshipGraph::default();
        for entity in entities {
            let id = entity.id;
            if graph.entities.insert(id, entity).is_some() {
                return Err(ContentError::Integrity(format!("duplicate entity id {}", id)));
            }
            graph.entity_order.push(id);
        }

        for rel in relationships {
            for endpoint in [rel.from_entity_id, rel.to_entity_id] {
                if !graph.entities.contains_key(&endpoint) {
                    return Err(ContentError::Integrity(format!(
                        "relationship {} references unknown entity {}",
                        rel.id.0, endpoint
                    )));
                }
            }
            if graph
                .relationships
                .iter()
                .any(|r| r.id == rel.id || r.matches(rel.from_entity_id, rel.to_entity_id, &rel.kind))
            {
                return Err(ContentError::Integrity(format!(
                    "relationship {} duplicates an existing id or triple",
                    rel.id.0
                )));
            }
            graph.relationships.push(Relationship {
                strength: clamp_strength(rel.strength),
                ..rel
            });
        }

        Ok(graph)
    }

    /// Entities in load order.
    pub fn get_entities(&self) -> Vec<&Entity> {
        self.entity_order
            .iter()
            .filter_map(|id| self.entities.get(id))
            .collect()
    }

    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Relationships where the entity is either endpoint.
    pub fn get_relationships_for(&self, entity_id: EntityId) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.touches(entity_id))
            .collect()
    }

    pub fn find(&self, from: EntityId, to: EntityId, kind: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.matches(from, to, kind))
    }

    /// Upsert keyed on (from, to, kind). An existing triple has its strength
    /// overwritten; otherwise a new relationship is stamped with `state_id`.
    /// Strength is clamped to `[0, 1]`.
    pub fn update_relationship(
        &mut self,
        from: EntityId,
        to: EntityId,
        kind: &str,
        strength: f64,
        state_id: StateId,
    ) -> Result<Relationship, RelationshipError> {
        for endpoint in [from, to] {
            if !self.entities.contains_key(&endpoint) {
                return Err(RelationshipError::UnknownEntity(endpoint));
            }
        }
        let strength = clamp_strength(strength);

        if let Some(existing) = self
            .relationships
            .iter_mut()
            .find(|r| r.matches(from, to, kind))
        {
            existing.strength = strength;
            tracing::debug!(from = %from, to = %to, kind, strength, "Updated relationship");
            return Ok(existing.clone());
        }

        let id = RelationshipId(
            self.relationships
                .iter()
                .map(|r| r.id.0)
                .max()
                .unwrap_or(0)
                + 1,
        );
        let rel = Relationship {
            id,
            from_entity_id: from,
            to_entity_id: to,
            kind: kind.to_string(),
            strength,
            state_id,
        };
        tracing::debug!(from = %from, to = %to, kind, strength, "Created relationship");
        self.relationships.push(rel.clone());
        Ok(rel)
    }

    /// Shift a triple's strength by `delta`, starting from 0.0 when absent.
    pub fn adjust_relationship(
        &mut self,
        from: EntityId,
        to: EntityId,
        kind: &str,
        delta: f64,
        state_id: StateId,
    ) -> Result<Relationship, RelationshipError> {
        let current = self.find(from, to, kind).map_or(0.0, |r| r.strength);
        self.update_relationship(from, to, kind, current + delta, state_id)
    }

    /// Structured description of every relationship of `entity_id`.
    /// Relationships whose counterpart is missing are skipped.
    pub fn describe_relationships(
        &self,
        entity_id: EntityId,
    ) -> Result<Vec<RelationshipSummary>, RelationshipError> {
        if !self.entities.contains_key(&entity_id) {
            return Err(RelationshipError::UnknownEntity(entity_id));
        }

        let summaries = self
            .get_relationships_for(entity_id)
            .into_iter()
            .filter_map(|rel| {
                let (direction, counterpart) = if rel.from_entity_id == entity_id {
                    (Direction::Outgoing, rel.to_entity_id)
                } else {
                    (Direction::Incoming, rel.from_entity_id)
                };
                let other = self.entities.get(&counterpart)?;
                Some(RelationshipSummary {
                    direction,
                    kind: rel.kind.clone(),
                    counterpart,
                    counterpart_name: other.name.clone(),
                    bucket: StrengthBucket::of(rel.strength),
                })
            })
            .collect();
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: u64, name: &str, kind: &str) -> Entity {
        Entity {
            id: EntityId(id),
            name: name.to_string(),
            kind: kind.to_string(),
            description: String::new(),
        }
    }

    fn world() -> RelationshipGraph {
        RelationshipGraph::new(
            vec![
                entity(1, "Dr. Elias Reeves", "character"),
                entity(2, "Maya", "character"),
                entity(3, "Nexus Hospital", "location"),
            ],
            vec![
                Relationship {
                    id: RelationshipId(1),
                    from_entity_id: EntityId(1),
                    to_entity_id: EntityId(2),
                    kind: "parent_of".to_string(),
                    strength: 1.0,
                    state_id: StateId(1),
                },
                Relationship {
                    id: RelationshipId(2),
                    from_entity_id: EntityId(1),
                    to_entity_id: EntityId(3),
                    kind: "works_at".to_string(),
                    strength: 0.5,
                    state_id: StateId(1),
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn upsert_replaces_strength() {
        let mut g = world();
        let a = EntityId(2);
        let b = EntityId(1);
        let first = g.update_relationship(a, b, "trusts", 0.9, StateId(1)).unwrap();
        let second = g.update_relationship(a, b, "trusts", 0.4, StateId(1)).unwrap();
        assert_eq!(first.id, second.id);
        let matching: Vec<_> = g
            .relationships()
            .iter()
            .filter(|r| r.matches(a, b, "trusts"))
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].strength, 0.4);
    }

    #[test]
    fn strength_is_clamped() {
        let mut g = world();
        let high = g
            .update_relationship(EntityId(1), EntityId(2), "x", 1.5, StateId(1))
            .unwrap();
        assert_eq!(high.strength, 1.0);
        let low = g
            .update_relationship(EntityId(1), EntityId(2), "x", -1.0, StateId(1))
            .unwrap();
        assert_eq!(low.strength, 0.0);
    }

    #[test]
    fn new_relationship_gets_next_id_and_state_stamp() {
        let mut g = world();
        let rel = g
            .update_relationship(EntityId(2), EntityId(3), "visits", 0.2, StateId(7))
            .unwrap();
        assert_eq!(rel.id, RelationshipId(3));
        assert_eq!(rel.state_id, StateId(7));
    }

    #[test]
    fn unknown_entity_rejected_without_mutation() {
        let mut g = world();
        let before = g.relationships().len();
        let err = g
            .update_relationship(EntityId(1), EntityId(99), "trusts", 0.5, StateId(1))
            .unwrap_err();
        assert!(matches!(err, RelationshipError::UnknownEntity(EntityId(99))));
        assert_eq!(g.relationships().len(), before);
    }

    #[test]
    fn adjust_accumulates_and_clamps() {
        let mut g = world();
        let rel = g
            .adjust_relationship(EntityId(1), EntityId(3), "works_at", 0.2, StateId(1))
            .unwrap();
        assert!((rel.strength - 0.7).abs() < 1e-9);
        let rel = g
            .adjust_relationship(EntityId(2), EntityId(3), "fears", -0.3, StateId(1))
            .unwrap();
        assert_eq!(rel.strength, 0.0);
    }

    #[test]
    fn relationships_for_both_directions() {
        let mut g = world();
        g.update_relationship(EntityId(2), EntityId(1), "trusts", 0.9, StateId(1))
            .unwrap();
        assert_eq!(g.get_relationships_for(EntityId(1)).len(), 3);
        assert_eq!(g.get_relationships_for(EntityId(2)).len(), 2);
    }

    #[test]
    fn describe_buckets_and_directions() {
        let mut g = world();
        g.update_relationship(EntityId(2), EntityId(1), "trusts", 0.1, StateId(1))
            .unwrap();
        let summary = g.describe_relationships(EntityId(1)).unwrap();
        assert_eq!(summary.len(), 3);

        let parent = summary.iter().find(|s| s.kind == "parent_of").unwrap();
        assert_eq!(parent.direction, Direction::Outgoing);
        assert_eq!(parent.bucket, StrengthBucket::Strong);
        assert_eq!(parent.counterpart_name, "Maya");

        let work = summary.iter().find(|s| s.kind == "works_at").unwrap();
        assert_eq!(work.bucket, StrengthBucket::Neutral);

        let trust = summary.iter().find(|s| s.kind == "trusts").unwrap();
        assert_eq!(trust.direction, Direction::Incoming);
        assert_eq!(trust.bucket, StrengthBucket::Weak);
        assert_eq!(trust.counterpart, EntityId(2));
    }

    #[test]
    fn describe_unknown_entity() {
        assert!(world().describe_relationships(EntityId(42)).is_err());
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(StrengthBucket::of(0.3), StrengthBucket::Neutral);
        assert_eq!(StrengthBucket::of(0.8), StrengthBucket::Neutral);
        assert_eq!(StrengthBucket::of(0.29), StrengthBucket::Weak);
        assert_eq!(StrengthBucket::of(0.81), StrengthBucket::Strong);
    }

    #[test]
    fn load_rejects_dangling_endpoint() {
        let err = RelationshipGraph::new(
            vec![entity(1, "A", "character")],
            vec![Relationship {
                id: RelationshipId(1),
                from_entity_id: EntityId(1),
                to_entity_id: EntityId(2),
                kind: "knows".to_string(),
                strength: 0.5,
                state_id: StateId(1),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, ContentError::Integrity(_)));
    }
}
