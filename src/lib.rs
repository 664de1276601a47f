//! Narrative State: the state engine behind branching interactive fiction.
//!
//! A player walks an authored graph of story nodes by picking choices. Each
//! choice advances the current position, may fork the story into a parallel
//! timeline, and may reshape a small world model of weighted relationships
//! between characters and places.

pub mod core;
pub mod schema;
