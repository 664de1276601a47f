/// State store port: the persistence collaborator behind the engine.
///
/// The engine never assumes a file format or wire protocol; it needs only
/// these operations. `InMemoryStore` backs tests and the console tools.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::core::content::{GraphData, StoryContent};
use crate::schema::entity::Entity;
use crate::schema::history::HistoryEntry;
use crate::schema::relationship::Relationship;
use crate::schema::state::GameState;
use crate::schema::timeline::Timeline;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Every write produced by one player action, committed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub history: Vec<HistoryEntry>,
    pub timelines: Vec<Timeline>,
    pub relationships: Vec<Relationship>,
    pub state: Option<GameState>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
            && self.timelines.is_empty()
            && self.relationships.is_empty()
            && self.state.is_none()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load_game_state(&self) -> Result<GameState, StoreError>;
    /// Persist the full, already merged state.
    async fn save_game_state(&self, state: &GameState) -> Result<(), StoreError>;

    async fn load_narrative_graph(&self) -> Result<GraphData, StoreError>;
    async fn load_entities(&self) -> Result<Vec<Entity>, StoreError>;
    async fn load_relationships(&self) -> Result<Vec<Relationship>, StoreError>;
    async fn save_relationship(&self, relationship: &Relationship) -> Result<(), StoreError>;

    async fn load_history(&self) -> Result<Vec<HistoryEntry>, StoreError>;
    async fn append_history(&self, entry: &HistoryEntry) -> Result<(), StoreError>;

    async fn load_timelines(&self) -> Result<Vec<Timeline>, StoreError>;
    async fn save_timeline(&self, timeline: &Timeline) -> Result<(), StoreError>;

    /// Apply a whole change set or none of it.
    async fn commit(&self, changes: &ChangeSet) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
struct StoreData {
    graph: GraphData,
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
    timelines: Vec<Timeline>,
    state: GameState,
    history: Vec<HistoryEntry>,
}

impl StoreData {
    fn upsert_relationship(&mut self, relationship: &Relationship) {
        match self
            .relationships
            .iter_mut()
            .find(|r| r.id == relationship.id)
        {
            Some(existing) => *existing = relationship.clone(),
            None => self.relationships.push(relationship.clone()),
        }
    }

    fn upsert_timeline(&mut self, timeline: &Timeline) {
        match self.timelines.iter_mut().find(|t| t.id == timeline.id) {
            Some(existing) => *existing = timeline.clone(),
            None => self.timelines.push(timeline.clone()),
        }
    }
}

/// Process-local store seeded from a content bundle.
#[derive(Debug)]
pub struct InMemoryStore {
    data: RwLock<StoreData>,
}

impl InMemoryStore {
    pub fn from_content(content: StoryContent) -> Self {
        let graph = content.graph_data();
        Self {
            data: RwLock::new(StoreData {
                graph,
                entities: content.entities,
                relationships: content.relationships,
                timelines: content.timelines,
                state: content.initial_state,
                history: Vec::new(),
            }),
        }
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn load_game_state(&self) -> Result<GameState, StoreError> {
        Ok(self.data.read().await.state.clone())
    }

    async fn save_game_state(&self, state: &GameState) -> Result<(), StoreError> {
        self.data.write().await.state = state.clone();
        Ok(())
    }

    async fn load_narrative_graph(&self) -> Result<GraphData, StoreError> {
        Ok(self.data.read().await.graph.clone())
    }

    async fn load_entities(&self) -> Result<Vec<Entity>, StoreError> {
        Ok(self.data.read().await.entities.clone())
    }

    async fn load_relationships(&self) -> Result<Vec<Relationship>, StoreError> {
        Ok(self.data.read().await.relationships.clone())
    }

    async fn save_relationship(&self, relationship: &Relationship) -> Result<(), StoreError> {
        self.data.write().await.upsert_relationship(relationship);
        Ok(())
    }

    async fn load_history(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(self.data.read().await.history.clone())
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<(), StoreError> {
        self.data.write().await.history.push(entry.clone());
        Ok(())
    }

    async fn load_timelines(&self) -> Result<Vec<Timeline>, StoreError> {
        Ok(self.data.read().await.timelines.clone())
    }

    async fn save_timeline(&self, timeline: &Timeline) -> Result<(), StoreError> {
        self.data.write().await.upsert_timeline(timeline);
        Ok(())
    }

    async fn commit(&self, changes: &ChangeSet) -> Result<(), StoreError> {
        // One write guard for the whole set: readers see all of it or none.
        let mut data = self.data.write().await;
        data.history.extend(changes.history.iter().cloned());
        for timeline in &changes.timelines {
            data.upsert_timeline(timeline);
        }
        for relationship in &changes.relationships {
            data.upsert_relationship(relationship);
        }
        if let Some(state) = &changes.state {
            data.state = state.clone();
        }
        Ok(())
    }
}
