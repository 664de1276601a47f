/// Story content bundles: everything a story ships with, loaded from RON.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::graph::{ContentError, NarrativeGraph};
use crate::core::relations::RelationshipGraph;
use crate::core::timeline::{TimelineBranchManager, DEFAULT_BRANCH_PROBABILITY, DEFAULT_TIMELINE_LABELS};
use crate::schema::entity::Entity;
use crate::schema::node::{Choice, ChoiceEffect, Node, Storyline};
use crate::schema::relationship::Relationship;
use crate::schema::state::GameState;
use crate::schema::timeline::Timeline;

/// The static half of a story: nodes, choices and storylines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub storylines: Vec<Storyline>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// A complete story: graph, world model, timelines and starting state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryContent {
    #[serde(default)]
    pub storylines: Vec<Storyline>,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    pub timelines: Vec<Timeline>,
    pub initial_state: GameState,
}

impl StoryContent {
    /// Load a story from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<StoryContent, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a story from a RON string. Parsing does not validate; call
    /// [`StoryContent::validate`] for integrity checks.
    pub fn parse_ron(input: &str) -> Result<StoryContent, ContentError> {
        let content: StoryContent = ron::from_str(input)?;
        Ok(content)
    }

    pub fn graph_data(&self) -> GraphData {
        GraphData {
            storylines: self.storylines.clone(),
            nodes: self.nodes.clone(),
            choices: self.choices.clone(),
        }
    }

    pub fn build_graph(&self) -> Result<NarrativeGraph, ContentError> {
        NarrativeGraph::new(
            self.storylines.clone(),
            self.nodes.clone(),
            self.choices.clone(),
        )
    }

    /// Run every load-time integrity check and return the graph on success.
    pub fn validate(&self) -> Result<NarrativeGraph, ContentError> {
        let graph = self.build_graph()?;
        let relationships =
            RelationshipGraph::new(self.entities.clone(), self.relationships.clone())?;
        check_effects(&graph, &relationships)?;
        let labels = DEFAULT_TIMELINE_LABELS.iter().map(|s| s.to_string()).collect();
        let timelines =
            TimelineBranchManager::new(self.timelines.clone(), labels, DEFAULT_BRANCH_PROBABILITY)?;
        timelines.check_divergence_points(&graph)?;
        check_state(&self.initial_state, &graph, &timelines)?;
        Ok(graph)
    }
}

/// Every relationship effect must name known entities.
pub(crate) fn check_effects(
    graph: &NarrativeGraph,
    relationships: &RelationshipGraph,
) -> Result<(), ContentError> {
    for node in graph.nodes() {
        for choice in graph.get_choices(node.id) {
            for effect in &choice.effects {
                let endpoints = match effect {
                    ChoiceEffect::SetVariable { .. } => continue,
                    ChoiceEffect::SetRelationship { from, to, .. }
                    | ChoiceEffect::AdjustRelationship { from, to, .. } => [*from, *to],
                };
                for entity in endpoints {
                    if relationships.get_entity(entity).is_none() {
                        return Err(ContentError::Integrity(format!(
                            "choice {} affects unknown entity {}",
                            choice.id, entity
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

/// The live position must name a real node and a real timeline.
pub(crate) fn check_state(
    state: &GameState,
    graph: &NarrativeGraph,
    timelines: &TimelineBranchManager,
) -> Result<(), ContentError> {
    if !graph.contains(state.current_node_id) {
        return Err(ContentError::Integrity(format!(
            "game state points at unknown node {}",
            state.current_node_id
        )));
    }
    if timelines.get_timeline(state.current_timeline_id).is_none() {
        return Err(ContentError::Integrity(format!(
            "game state points at unknown timeline {}",
            state.current_timeline_id
        )));
    }
    Ok(())
}
