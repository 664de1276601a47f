/// The state controller: player action → committed narrative state.
///
/// Wires together the narrative graph, history log, timeline manager and
/// relationship graph, and persists every action through the state store
/// as a single change set.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::marker::PhantomData;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::EngineConfig;
use crate::core::content::{check_effects, check_state};
use crate::core::context::EngineContext;
use crate::core::graph::{ContentError, NarrativeGraph};
use crate::core::history::HistoryLog;
use crate::core::relations::{RelationshipError, RelationshipGraph, RelationshipSummary};
use crate::core::store::{ChangeSet, StateStore, StoreError};
use crate::core::timeline::{BranchRoll, SeededRoll, TimelineBranchManager, TimelineError};
use crate::schema::entity::{EntityId, Value};
use crate::schema::history::HistoryEntry;
use crate::schema::node::{Choice, ChoiceEffect, ChoiceId, Node, NodeId};
use crate::schema::relationship::Relationship;
use crate::schema::state::{GameState, StatePatch};
use crate::schema::timeline::{Timeline, TimelineId};

/// Capacity of the notification channel. Slow subscribers lose the
/// oldest notifications rather than stalling the engine.
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("choice {choice} is not offered at node {node}")]
    UnknownChoice { node: NodeId, choice: ChoiceId },
    #[error("choice {choice} at node {node} is not available")]
    ChoiceUnavailable { node: NodeId, choice: ChoiceId },
    #[error("no node follows node {0}")]
    NoNextNode(NodeId),
    #[error("node {0} waits for a choice and cannot auto-advance")]
    ChoiceRequired(NodeId),
    #[error("advance requested from node {requested}, but the player is at node {current}")]
    NotAtNode { requested: NodeId, current: NodeId },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("timeline error: {0}")]
    Timeline(#[from] TimelineError),
    #[error("relationship error: {0}")]
    Relationship(#[from] RelationshipError),
    #[error("{0}")]
    Content(#[from] ContentError),
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

/// A choice forked the story into a new timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchEvent {
    pub timeline_id: TimelineId,
    pub timeline_name: String,
    /// Text of the choice that caused the fork.
    pub source_text: String,
    pub divergence_node_id: NodeId,
}

/// A transition led straight back to the node it left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopEvent {
    pub node_id: NodeId,
    pub choice_id: ChoiceId,
}

/// Advisory notification for presentation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    BranchCreated(BranchEvent),
    LoopDetected(LoopEvent),
}

/// Result of a successful `apply_choice`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOutcome {
    pub node: Node,
    pub branch_event: Option<BranchEvent>,
    pub loop_event: Option<LoopEvent>,
}

/// The single authority for advancing narrative position.
///
/// Actions are serialized by an async mutex: a second `apply_choice`
/// waits until the first has committed or failed. Each action stages its
/// writes, commits them through the store in one `ChangeSet`, and only
/// then publishes them to the in-memory context.
pub struct StateController<S: StateStore> {
    graph: NarrativeGraph,
    store: S,
    context: Mutex<EngineContext>,
    clock: Box<dyn Clock>,
    events: broadcast::Sender<EngineEvent>,
}

/// Builder for constructing a `StateController`.
pub struct StateControllerBuilder<S> {
    config: EngineConfig,
    roll: Option<Box<dyn BranchRoll>>,
    clock: Option<Box<dyn Clock>>,
    store: PhantomData<S>,
}

impl<S: StateStore> StateController<S> {
    pub fn builder() -> StateControllerBuilder<S> {
        StateControllerBuilder {
            config: EngineConfig::default(),
            roll: None,
            clock: None,
            store: PhantomData,
        }
    }

    pub fn graph(&self) -> &NarrativeGraph {
        &self.graph
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Receive branch and loop notifications. Sending never blocks; with
    /// no subscribers notifications are dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Read the engine context under the action lock.
    pub async fn with_context<R>(&self, f: impl FnOnce(&EngineContext) -> R) -> R {
        let ctx = self.context.lock().await;
        f(&ctx)
    }

    pub async fn game_state(&self) -> GameState {
        self.with_context(|ctx| ctx.state.clone()).await
    }

    pub async fn current_node(&self) -> Option<Node> {
        self.with_context(|ctx| self.graph.get_node(ctx.state.current_node_id).cloned())
            .await
    }

    /// Choices at the current node whose conditions hold.
    pub async fn available_choices(&self) -> Vec<Choice> {
        self.with_context(|ctx| {
            self.graph
                .available_choices(ctx.state.current_node_id, &ctx.state.variables)
                .into_iter()
                .cloned()
                .collect()
        })
        .await
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.with_context(|ctx| ctx.history.all().to_vec()).await
    }

    pub async fn timelines(&self) -> Vec<Timeline> {
        self.with_context(|ctx| ctx.timelines.all().to_vec()).await
    }

    pub async fn get_current_timeline(&self) -> Option<Timeline> {
        self.with_context(|ctx| ctx.timelines.get_current_timeline(&ctx.state).cloned())
            .await
    }

    /// Record arrival at the starting node. Call once when play begins.
    pub async fn start(&self) -> Result<Node, EngineError> {
        let mut guard = self.context.lock().await;
        let ctx = &mut *guard;

        let node = self.node(ctx.state.current_node_id)?;
        let mut history = ctx.history.stage();
        history.append(ctx.state.id, node.id, None, self.clock.now());

        let changes = ChangeSet {
            history: history.entries().to_vec(),
            ..ChangeSet::default()
        };
        self.store.commit(&changes).await?;
        ctx.history.commit(history);

        tracing::info!(node = %node.id, title = %node.title, "Game started");
        Ok(node.clone())
    }

    /// Take a choice offered at the current node.
    ///
    /// In order: record the departure, roll for a timeline fork (which
    /// diverges at the node being left), move to the target, apply the
    /// choice's effects, record the arrival. Nothing is visible until the
    /// store has committed all of it; on any error no state changes.
    pub async fn apply_choice(&self, choice_id: ChoiceId) -> Result<ChoiceOutcome, EngineError> {
        let mut guard = self.context.lock().await;
        let ctx = &mut *guard;

        let from = ctx.state.current_node_id;
        let node = self.node(from)?;
        let choice = match self.graph.find_choice(from, choice_id) {
            Some(choice) => choice,
            None => {
                tracing::warn!(node = %from, choice = %choice_id, "Rejected unknown choice");
                return Err(EngineError::UnknownChoice {
                    node: from,
                    choice: choice_id,
                });
            }
        };
        if !choice.is_available(&ctx.state.variables) {
            tracing::warn!(node = %from, choice = %choice_id, "Rejected unavailable choice");
            return Err(EngineError::ChoiceUnavailable {
                node: from,
                choice: choice_id,
            });
        }
        let target = self.node(choice.next_node_id)?;

        let now = self.clock.now();
        let mut state = ctx.state.clone();
        let mut history = ctx.history.stage();
        let mut changes = ChangeSet::default();

        // 1. Departure
        history.append(state.id, from, Some(choice.id), now);

        // 2. Fork before the pointer moves, so the divergence is `from`.
        // The roll is staged too: a failed commit must not consume it.
        let offered = self.graph.available_choices(from, &ctx.state.variables);
        let mut roll = ctx.roll.snapshot();
        let mut staged_timelines = None;
        let mut branch_event = None;
        if ctx
            .timelines
            .should_branch(node, &offered, choice, roll.as_mut())
        {
            let mut timelines = ctx.timelines.clone();
            let name = timelines.generate_name();
            let description = format!("Timeline created by choosing \"{}\"", choice.text);
            let timeline = timelines.create_branch(&mut state, name, description, from)?;
            branch_event = Some(BranchEvent {
                timeline_id: timeline.id,
                timeline_name: timeline.name.clone(),
                source_text: choice.text.clone(),
                divergence_node_id: from,
            });
            changes.timelines.push(timeline);
            staged_timelines = Some(timelines);
        }

        // 3. Move
        state.merge(StatePatch::node(target.id));

        // 4. Effects
        let staged_relationships =
            apply_effects(&choice.effects, &mut state, &ctx.relationships, &mut changes)?;

        // 5. Arrival
        history.append(state.id, target.id, None, now);

        changes.history = history.entries().to_vec();
        changes.state = Some(state.clone());
        self.store.commit(&changes).await?;

        ctx.state = state;
        ctx.history.commit(history);
        ctx.roll = roll;
        if let Some(timelines) = staged_timelines {
            ctx.timelines = timelines;
        }
        if let Some(relationships) = staged_relationships {
            ctx.relationships = relationships;
        }
        drop(guard);

        let loop_event = choice.is_self_loop().then(|| LoopEvent {
            node_id: from,
            choice_id: choice.id,
        });

        tracing::debug!(from = %from, to = %target.id, choice = %choice.id, "Choice applied");
        if let Some(event) = &branch_event {
            self.notify(EngineEvent::BranchCreated(event.clone()));
        }
        if let Some(event) = &loop_event {
            tracing::warn!(node = %from, choice = %choice.id, "Narrative loop detected");
            self.notify(EngineEvent::LoopDetected(event.clone()));
        }

        Ok(ChoiceOutcome {
            node: target.clone(),
            branch_event,
            loop_event,
        })
    }

    /// Continue from a non-choice node.
    ///
    /// A node authored with a single unconditional choice follows it;
    /// otherwise the node with the next id is entered. Records exactly one
    /// arrival entry. Auto-advance never forks a timeline.
    pub async fn advance(&self, from_node_id: NodeId) -> Result<Node, EngineError> {
        let mut guard = self.context.lock().await;
        let ctx = &mut *guard;

        let current = ctx.state.current_node_id;
        if current != from_node_id {
            return Err(EngineError::NotAtNode {
                requested: from_node_id,
                current,
            });
        }
        let node = self.node(from_node_id)?;
        if node.is_ending {
            return Err(EngineError::NoNextNode(from_node_id));
        }
        if node.is_choice_node {
            return Err(EngineError::ChoiceRequired(from_node_id));
        }

        let continuation = self.graph.continuation(from_node_id);
        let target = match continuation {
            Some(choice) => self.node(choice.next_node_id)?,
            None => self
                .graph
                .next_in_sequence(from_node_id)
                .ok_or(EngineError::NoNextNode(from_node_id))?,
        };

        let mut state = ctx.state.clone();
        let mut history = ctx.history.stage();
        let mut changes = ChangeSet::default();

        state.merge(StatePatch::node(target.id));
        let effects = continuation.map_or(&[][..], |c| c.effects.as_slice());
        let staged_relationships =
            apply_effects(effects, &mut state, &ctx.relationships, &mut changes)?;
        history.append(state.id, target.id, None, self.clock.now());

        changes.history = history.entries().to_vec();
        changes.state = Some(state.clone());
        self.store.commit(&changes).await?;

        ctx.state = state;
        ctx.history.commit(history);
        if let Some(relationships) = staged_relationships {
            ctx.relationships = relationships;
        }
        drop(guard);

        tracing::debug!(from = %from_node_id, to = %target.id, "Advanced");
        if let Some(choice) = continuation.filter(|c| c.is_self_loop()) {
            tracing::warn!(node = %from_node_id, choice = %choice.id, "Narrative loop detected");
            self.notify(EngineEvent::LoopDetected(LoopEvent {
                node_id: from_node_id,
                choice_id: choice.id,
            }));
        }
        Ok(target.clone())
    }

    /// Repoint the current timeline. The node position is not moved.
    pub async fn switch_timeline(&self, id: TimelineId) -> Result<Timeline, EngineError> {
        let mut guard = self.context.lock().await;
        let ctx = &mut *guard;

        let mut state = ctx.state.clone();
        let timeline = ctx.timelines.switch_timeline(&mut state, id)?;
        self.store.save_game_state(&state).await?;
        ctx.state = state;

        tracing::info!(timeline = %timeline.id, name = %timeline.name, "Switched timeline");
        Ok(timeline)
    }

    /// Merge narrative variables into the game state.
    pub async fn set_variables(
        &self,
        variables: HashMap<String, Value>,
    ) -> Result<GameState, EngineError> {
        let mut guard = self.context.lock().await;
        let ctx = &mut *guard;

        let mut state = ctx.state.clone();
        state.merge(StatePatch {
            variables,
            ..StatePatch::default()
        });
        self.store.save_game_state(&state).await?;
        ctx.state = state.clone();
        Ok(state)
    }

    /// Scripted world-model update outside of a choice.
    pub async fn update_relationship(
        &self,
        from: EntityId,
        to: EntityId,
        kind: &str,
        strength: f64,
    ) -> Result<Relationship, EngineError> {
        let mut guard = self.context.lock().await;
        let ctx = &mut *guard;

        let mut relationships = ctx.relationships.clone();
        let relationship =
            relationships.update_relationship(from, to, kind, strength, ctx.state.id)?;
        self.store.save_relationship(&relationship).await?;
        ctx.relationships = relationships;
        Ok(relationship)
    }

    pub async fn describe_relationships(
        &self,
        entity_id: EntityId,
    ) -> Result<Vec<RelationshipSummary>, EngineError> {
        let summary = self
            .with_context(|ctx| ctx.relationships.describe_relationships(entity_id))
            .await?;
        Ok(summary)
    }

    fn node(&self, id: NodeId) -> Result<&Node, EngineError> {
        self.graph.get_node(id).ok_or_else(|| {
            EngineError::Content(ContentError::Integrity(format!(
                "node {} is missing from the graph",
                id
            )))
        })
    }

    fn notify(&self, event: EngineEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

/// Apply choice effects onto staged copies. The relationship graph is
/// cloned only when an effect touches it.
fn apply_effects(
    effects: &[ChoiceEffect],
    state: &mut GameState,
    relationships: &RelationshipGraph,
    changes: &mut ChangeSet,
) -> Result<Option<RelationshipGraph>, EngineError> {
    let mut staged: Option<RelationshipGraph> = None;
    for effect in effects {
        let updated = match effect {
            ChoiceEffect::SetVariable { key, value } => {
                state.merge(StatePatch::variable(key.clone(), value.clone()));
                continue;
            }
            ChoiceEffect::SetRelationship {
                from,
                to,
                kind,
                strength,
            } => staged
                .get_or_insert_with(|| relationships.clone())
                .update_relationship(*from, *to, kind, *strength, state.id)?,
            ChoiceEffect::AdjustRelationship {
                from,
                to,
                kind,
                delta,
            } => staged
                .get_or_insert_with(|| relationships.clone())
                .adjust_relationship(*from, *to, kind, *delta, state.id)?,
        };
        match changes.relationships.iter_mut().find(|r| r.id == updated.id) {
            Some(existing) => *existing = updated,
            None => changes.relationships.push(updated),
        }
    }
    Ok(staged)
}

impl<S: StateStore> StateControllerBuilder<S> {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn branch_probability(mut self, probability: f64) -> Self {
        self.config.branch_probability = probability;
        self
    }

    /// Provide the branch roll directly (e.g. `FixedRoll` in tests).
    /// Overrides the seed.
    pub fn branch_roll(mut self, roll: impl BranchRoll + 'static) -> Self {
        self.roll = Some(Box::new(roll));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Load everything from the store and validate it. Malformed content
    /// fails here with `EngineError::Content`, never mid-playthrough.
    pub async fn build(self, store: S) -> Result<StateController<S>, EngineError> {
        self.config.validate().map_err(EngineError::InvalidConfig)?;

        let data = store.load_narrative_graph().await?;
        let graph = NarrativeGraph::new(data.storylines, data.nodes, data.choices)?;

        let relationships = RelationshipGraph::new(
            store.load_entities().await?,
            store.load_relationships().await?,
        )?;
        check_effects(&graph, &relationships)?;

        let timelines = TimelineBranchManager::new(
            store.load_timelines().await?,
            self.config.timeline_labels.clone(),
            self.config.branch_probability,
        )?;
        timelines.check_divergence_points(&graph)?;

        let state = store.load_game_state().await?;
        check_state(&state, &graph, &timelines)?;

        let history = HistoryLog::from_entries(store.load_history().await?);

        let roll = match (self.roll, self.config.seed) {
            (Some(roll), _) => roll,
            (None, Some(seed)) => Box::new(SeededRoll::new(seed)),
            (None, None) => Box::new(SeededRoll::from_entropy()),
        };
        let clock = self.clock.unwrap_or_else(|| Box::new(SystemClock));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::info!(
            nodes = graph.node_count(),
            timelines = timelines.len(),
            node = %state.current_node_id,
            "State controller ready"
        );

        Ok(StateController {
            graph,
            store,
            context: Mutex::new(EngineContext::new(
                state,
                history,
                timelines,
                relationships,
                roll,
            )),
            clock,
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::core::content::{GraphData, StoryContent};
    use crate::core::store::MockStateStore;
    use crate::core::timeline::FixedRoll;
    use chrono::{TimeZone, Utc};

    const STORY: &str = r#"StoryContent(
        storylines: [(id: 1, name: "Clinical")],
        nodes: [
            (id: 1, storyline_id: 1, title: "Rounds", content: "", is_choice_node: true),
            (id: 2, storyline_id: 1, title: "Lab", content: "", is_choice_node: false),
            (id: 3, storyline_id: 1, title: "Home", content: "", is_choice_node: false, is_ending: true),
        ],
        choices: [
            (id: 1, node_id: 1, text: "Check the scans", next_node_id: 2,
                effects: [SetRelationship(from: 1, to: 2, kind: "trusts", strength: 0.6)]),
            (id: 2, node_id: 1, text: "Go home", next_node_id: 3),
            (id: 3, node_id: 1, text: "Wait", next_node_id: 1),
        ],
        entities: [
            (id: 1, name: "Reeves", kind: "character"),
            (id: 2, name: "Maya", kind: "character"),
        ],
        timelines: [(id: 1, name: "Alpha")],
        initial_state: (id: 1, current_node_id: 1, current_timeline_id: 1),
    )"#;

    fn content() -> StoryContent {
        StoryContent::parse_ron(STORY).unwrap()
    }

    /// A store that serves `STORY` and has no write expectations yet.
    fn loading_store() -> MockStateStore {
        let content = content();
        let graph: GraphData = content.graph_data();
        let state = content.initial_state.clone();
        let entities = content.entities.clone();
        let timelines = content.timelines.clone();
        let mut store = MockStateStore::new();
        store
            .expect_load_game_state()
            .returning(move || Ok(state.clone()));
        store
            .expect_load_narrative_graph()
            .returning(move || Ok(graph.clone()));
        store
            .expect_load_entities()
            .returning(move || Ok(entities.clone()));
        store
            .expect_load_relationships()
            .returning(|| Ok(Vec::new()));
        store
            .expect_load_timelines()
            .returning(move || Ok(timelines.clone()));
        store.expect_load_history().returning(|| Ok(Vec::new()));
        store
    }

    /// A store that loads fine but refuses every write.
    fn failing_store() -> MockStateStore {
        let mut store = loading_store();
        store
            .expect_commit()
            .returning(|_| Err(StoreError::Unavailable("disk full".to_string())));
        store
            .expect_save_game_state()
            .returning(|_| Err(StoreError::Unavailable("disk full".to_string())));
        store
            .expect_save_relationship()
            .returning(|_| Err(StoreError::Unavailable("disk full".to_string())));
        store
    }

    async fn controller(store: MockStateStore, fork: bool) -> StateController<MockStateStore> {
        StateController::builder()
            .branch_roll(FixedRoll(fork))
            .clock(FixedClock(Utc.timestamp_opt(1_700_000_000, 0).unwrap()))
            .build(store)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn failed_commit_changes_nothing() {
        let engine = controller(failing_store(), true).await;
        let before = engine.game_state().await;

        let err = engine.apply_choice(ChoiceId(1)).await.unwrap_err();
        assert!(matches!(err, EngineError::Persistence(_)));

        assert_eq!(engine.game_state().await, before);
        assert!(engine.history().await.is_empty());
        assert_eq!(engine.timelines().await.len(), 1);
        engine
            .with_context(|ctx| assert!(ctx.relationships().relationships().is_empty()))
            .await;
    }

    #[tokio::test]
    async fn failed_save_keeps_timeline_and_relationships() {
        let engine = controller(failing_store(), false).await;

        assert!(engine.switch_timeline(TimelineId(1)).await.is_err());
        assert!(engine
            .update_relationship(EntityId(1), EntityId(2), "trusts", 0.4)
            .await
            .is_err());
        engine
            .with_context(|ctx| {
                assert!(ctx
                    .relationships()
                    .find(EntityId(1), EntityId(2), "trusts")
                    .is_none())
            })
            .await;
    }

    #[tokio::test]
    async fn unknown_choice_is_rejected_before_persistence() {
        let mut store = loading_store();
        store.expect_commit().never();

        let engine = controller(store, true).await;
        let err = engine.apply_choice(ChoiceId(99)).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnknownChoice { node: NodeId(1), choice: ChoiceId(99) }
        ));
    }

    #[tokio::test]
    async fn commit_receives_the_whole_action() {
        let mut store = loading_store();
        store
            .expect_commit()
            .withf(|changes| {
                changes.history.len() == 2
                    && changes.history[0].choice_id == Some(ChoiceId(1))
                    && changes.history[1].node_id == NodeId(2)
                    && changes.timelines.len() == 1
                    && changes.relationships.len() == 1
                    && changes
                        .state
                        .as_ref()
                        .is_some_and(|s| s.current_timeline_id == TimelineId(2))
            })
            .times(1)
            .returning(|_| Ok(()));

        let engine = controller(store, true).await;
        let outcome = engine.apply_choice(ChoiceId(1)).await.unwrap();
        assert_eq!(outcome.node.id, NodeId(2));
        let branch = outcome.branch_event.unwrap();
        assert_eq!(branch.divergence_node_id, NodeId(1));
        assert_eq!(branch.timeline_name, "Beta");
        assert_eq!(branch.source_text, "Check the scans");
    }

    /// Forks on every other trial.
    #[derive(Clone, Copy)]
    struct Alternating(bool);

    impl BranchRoll for Alternating {
        fn roll(&mut self, _probability: f64) -> bool {
            let fork = self.0;
            self.0 = !self.0;
            fork
        }

        fn snapshot(&self) -> Box<dyn BranchRoll> {
            Box::new(*self)
        }
    }

    #[tokio::test]
    async fn failed_commit_does_not_consume_the_roll() {
        let mut store = loading_store();
        let mut commits = 0;
        store.expect_commit().times(2).returning(move |_| {
            commits += 1;
            if commits == 1 {
                Err(StoreError::Unavailable("disk full".to_string()))
            } else {
                Ok(())
            }
        });
        let engine = StateController::builder()
            .branch_roll(Alternating(true))
            .build(store)
            .await
            .unwrap();

        assert!(engine.apply_choice(ChoiceId(2)).await.is_err());
        let outcome = engine.apply_choice(ChoiceId(2)).await.unwrap();
        assert!(outcome.branch_event.is_some());
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let result = StateController::builder()
            .branch_probability(1.5)
            .build(failing_store())
            .await;
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn effect_on_unknown_entity_fails_build() {
        let mut content = content();
        content.entities.pop();
        let store = crate::core::store::InMemoryStore::from_content(content);
        let result = StateController::builder().build(store).await;
        assert!(matches!(result, Err(EngineError::Content(_))));
    }
}
