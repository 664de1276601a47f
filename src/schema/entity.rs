use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype wrapper for entity IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A dynamic value stored in game-state variables and compared by
/// choice conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Float(f64),
    Int(i64),
    Bool(bool),
}

impl Value {
    /// Truthiness used by flag conditions: `false`, zero and the empty
    /// string are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::String(s) => !s.is_empty(),
            Self::Float(f) => *f != 0.0,
            Self::Int(i) => *i != 0,
            Self::Bool(b) => *b,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

/// A participant in the world model: a character, a place, an AI, or
/// anything else the story wants to relate.
///
/// `kind` is an open tag ("character", "location", "ai", ...). The engine
/// never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

impl Entity {
    /// Returns true if this entity carries the given kind tag.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }
}
