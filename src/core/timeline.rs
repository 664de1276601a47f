/// Timeline branching: decides when a choice forks the story and keeps
/// the tree of timelines.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::core::graph::{ContentError, NarrativeGraph};
use crate::schema::node::{Choice, Node, NodeId};
use crate::schema::state::{GameState, StatePatch};
use crate::schema::timeline::{Timeline, TimelineId};

/// Chance that an eligible choice forks a new timeline.
pub const DEFAULT_BRANCH_PROBABILITY: f64 = 0.2;

/// Labels handed out to new timelines, cycling when exhausted.
pub const DEFAULT_TIMELINE_LABELS: [&str; 8] = [
    "Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Eta", "Theta",
];

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("unknown timeline: {0}")]
    UnknownTimeline(TimelineId),
}

/// Source of the Bernoulli trial behind branching.
pub trait BranchRoll: Send {
    /// Returns true with the given probability.
    fn roll(&mut self, probability: f64) -> bool;

    /// An independent copy at the current position of the sequence.
    fn snapshot(&self) -> Box<dyn BranchRoll>;
}

/// Seeded RNG roll. Same seed, same sequence of forks.
#[derive(Debug, Clone)]
pub struct SeededRoll {
    rng: StdRng,
}

impl SeededRoll {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl BranchRoll for SeededRoll {
    fn roll(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() < probability
    }

    fn snapshot(&self) -> Box<dyn BranchRoll> {
        Box::new(self.clone())
    }
}

/// A roll with a fixed outcome.
#[derive(Debug, Clone, Copy)]
pub struct FixedRoll(pub bool);

impl BranchRoll for FixedRoll {
    fn roll(&mut self, _probability: f64) -> bool {
        self.0
    }

    fn snapshot(&self) -> Box<dyn BranchRoll> {
        Box::new(*self)
    }
}

/// The timeline tree plus the branching policy.
///
/// The current-timeline pointer lives on `GameState`; the manager reads
/// and rewrites it there.
#[derive(Debug, Clone)]
pub struct TimelineBranchManager {
    timelines: Vec<Timeline>,
    labels: Vec<String>,
    probability: f64,
}

impl TimelineBranchManager {
    /// Build the manager over loaded timelines. The set must form a tree
    /// with exactly one root.
    pub fn new(
        timelines: Vec<Timeline>,
        labels: Vec<String>,
        probability: f64,
    ) -> Result<TimelineBranchManager, ContentError> {
        if labels.is_empty() {
            return Err(ContentError::Integrity(
                "timeline label sequence is empty".to_string(),
            ));
        }

        let mut ids = FxHashSet::default();
        for timeline in &timelines {
            if !ids.insert(timeline.id) {
                return Err(ContentError::Integrity(format!(
                    "duplicate timeline id {}",
                    timeline.id
                )));
            }
        }

        let roots = timelines.iter().filter(|t| t.is_root()).count();
        if roots != 1 {
            return Err(ContentError::Integrity(format!(
                "timeline tree must have exactly one root, found {}",
                roots
            )));
        }

        let manager = TimelineBranchManager {
            timelines,
            labels,
            probability,
        };

        for timeline in &manager.timelines {
            if let Some(parent) = timeline.parent_id {
                if !ids.contains(&parent) {
                    return Err(ContentError::Integrity(format!(
                        "timeline {} has unknown parent {}",
                        timeline.id, parent
                    )));
                }
            }
            // A walk longer than the tree means the parent links loop.
            if manager.lineage(timeline.id).len() > manager.timelines.len() {
                return Err(ContentError::Integrity(format!(
                    "timeline {} is part of a parent cycle",
                    timeline.id
                )));
            }
        }

        Ok(manager)
    }

    /// Every divergence point must be a node of the graph.
    pub fn check_divergence_points(&self, graph: &NarrativeGraph) -> Result<(), ContentError> {
        for timeline in &self.timelines {
            if let Some(node_id) = timeline.divergence_point_node_id {
                if !graph.contains(node_id) {
                    return Err(ContentError::Integrity(format!(
                        "timeline {} diverges at unknown node {}",
                        timeline.id, node_id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Branching is considered only when the node offered more than one
    /// choice and `chosen` is one of them. Each eligible call is an
    /// independent trial.
    pub fn should_branch(
        &self,
        node: &Node,
        choices: &[&Choice],
        chosen: &Choice,
        roll: &mut dyn BranchRoll,
    ) -> bool {
        if choices.len() <= 1 || !choices.iter().any(|c| c.id == chosen.id) {
            return false;
        }
        let fork = roll.roll(self.probability);
        tracing::debug!(node = %node.id, choice = %chosen.id, fork, "Branch trial");
        fork
    }

    /// Next label from the cycling sequence, indexed by the current count.
    pub fn generate_name(&self) -> String {
        self.labels[self.timelines.len() % self.labels.len()].clone()
    }

    /// Attach a new timeline under the state's current timeline and make
    /// it current.
    pub fn create_branch(
        &mut self,
        state: &mut GameState,
        name: impl Into<String>,
        description: impl Into<String>,
        divergence_node_id: NodeId,
    ) -> Result<Timeline, TimelineError> {
        let parent = state.current_timeline_id;
        if self.get_timeline(parent).is_none() {
            return Err(TimelineError::UnknownTimeline(parent));
        }

        let id = TimelineId(self.timelines.iter().map(|t| t.id.0).max().unwrap_or(0) + 1);
        let timeline = Timeline {
            id,
            name: name.into(),
            description: description.into(),
            parent_id: Some(parent),
            divergence_point_node_id: Some(divergence_node_id),
        };
        self.timelines.push(timeline.clone());
        state.merge(StatePatch::timeline(id));

        tracing::info!(
            timeline = %id,
            name = %timeline.name,
            parent = %parent,
            divergence = %divergence_node_id,
            "Timeline branch created"
        );
        Ok(timeline)
    }

    /// Point the state at another timeline. The node position is left
    /// alone: timelines are metadata over one shared node graph.
    pub fn switch_timeline(
        &self,
        state: &mut GameState,
        id: TimelineId,
    ) -> Result<Timeline, TimelineError> {
        let timeline = self
            .get_timeline(id)
            .ok_or(TimelineError::UnknownTimeline(id))?
            .clone();
        state.merge(StatePatch::timeline(id));
        Ok(timeline)
    }

    pub fn get_current_timeline(&self, state: &GameState) -> Option<&Timeline> {
        self.get_timeline(state.current_timeline_id)
    }

    pub fn get_timeline(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.iter().find(|t| t.id == id)
    }

    pub fn all(&self) -> &[Timeline] {
        &self.timelines
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    pub fn root(&self) -> Option<&Timeline> {
        self.timelines.iter().find(|t| t.is_root())
    }

    pub fn children_of(&self, id: TimelineId) -> Vec<&Timeline> {
        self.timelines
            .iter()
            .filter(|t| t.parent_id == Some(id))
            .collect()
    }

    /// The timeline followed by its ancestors up to the root. Stops one
    /// step past the tree size so a corrupt cycle cannot spin forever.
    pub fn lineage(&self, id: TimelineId) -> Vec<&Timeline> {
        let mut path = Vec::new();
        let mut current = self.get_timeline(id);
        while let Some(timeline) = current {
            path.push(timeline);
            if path.len() > self.timelines.len() {
                break;
            }
            current = timeline.parent_id.and_then(|p| self.get_timeline(p));
        }
        path
    }
}
