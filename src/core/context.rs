/// Engine context: the mutable half of the engine, owned in one place.

use std::fmt;

use crate::core::history::HistoryLog;
use crate::core::relations::RelationshipGraph;
use crate::core::timeline::{BranchRoll, TimelineBranchManager};
use crate::schema::state::GameState;

/// Everything a player action may change: the live game state, the
/// history log, the timeline tree and the world model, plus the roll
/// that decides forks.
///
/// Built once by the controller builder and held behind the controller's
/// lock; there is no ambient global state.
pub struct EngineContext {
    pub(crate) state: GameState,
    pub(crate) history: HistoryLog,
    pub(crate) timelines: TimelineBranchManager,
    pub(crate) relationships: RelationshipGraph,
    pub(crate) roll: Box<dyn BranchRoll>,
}

impl EngineContext {
    pub fn new(
        state: GameState,
        history: HistoryLog,
        timelines: TimelineBranchManager,
        relationships: RelationshipGraph,
        roll: Box<dyn BranchRoll>,
    ) -> Self {
        Self {
            state,
            history,
            timelines,
            relationships,
            roll,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn timelines(&self) -> &TimelineBranchManager {
        &self.timelines
    }

    pub fn relationships(&self) -> &RelationshipGraph {
        &self.relationships
    }
}

impl fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineContext")
            .field("state", &self.state)
            .field("history", &self.history.len())
            .field("timelines", &self.timelines.len())
            .field("relationships", &self.relationships.relationships().len())
            .finish_non_exhaustive()
    }
}
