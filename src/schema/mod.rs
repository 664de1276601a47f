//! Plain data types shared by the runtime and the store.

pub mod entity;
pub mod history;
pub mod node;
pub mod relationship;
pub mod state;
pub mod timeline;
