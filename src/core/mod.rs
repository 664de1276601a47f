//! Core engine: story graph, world model, timelines, history, and the
//! controller that ties them to a state store.

pub mod clock;
pub mod config;
pub mod content;
pub mod context;
pub mod controller;
pub mod graph;
pub mod history;
pub mod relations;
pub mod store;
pub mod timeline;
