/// Content integration tests: the bundled story and engine config on disk.

use narrative_state::core::config::EngineConfig;
use narrative_state::core::content::StoryContent;
use narrative_state::core::controller::{EngineError, StateController};
use narrative_state::core::graph::ContentError;
use narrative_state::core::store::InMemoryStore;
use narrative_state::schema::node::{NodeId, StorylineId};
use narrative_state::schema::timeline::TimelineId;

fn story() -> StoryContent {
    let path = std::path::PathBuf::from("content/neural_echo/story.ron");
    StoryContent::load_from_ron(&path).unwrap()
}

#[test]
fn bundled_story_shape() {
    let content = story();
    let graph = content.validate().unwrap();

    assert_eq!(graph.node_count(), 10);
    assert_eq!(content.choices.len(), 17);
    assert_eq!(content.entities.len(), 5);
    assert_eq!(content.relationships.len(), 4);
    assert_eq!(content.timelines.len(), 1);
    assert_eq!(content.timelines[0].name, "Alpha");

    assert!(graph.is_node_in_storyline(NodeId(4), StorylineId(2)));
    assert!(graph.is_node_in_storyline(NodeId(5), StorylineId(3)));
    assert!(!graph.is_node_in_storyline(NodeId(1), StorylineId(3)));
    assert_eq!(graph.storyline_of(NodeId(8)).unwrap().name, "Clinical");
}

#[test]
fn every_node_is_reachable_from_the_start() {
    let content = story();
    let graph = content.validate().unwrap();
    let reachable = graph.reachable_from(content.initial_state.current_node_id);
    assert_eq!(reachable.len(), graph.node_count());
}

#[test]
fn choice_nodes_offer_real_decisions() {
    let graph = story().validate().unwrap();
    for node in graph.nodes().filter(|n| n.is_choice_node) {
        assert!(
            graph.get_choices(node.id).len() >= 2,
            "node {} offers fewer than two choices",
            node.id
        );
    }
}

#[test]
fn bundled_config_matches_defaults() {
    let path = std::path::PathBuf::from("content/config.ron");
    let config = EngineConfig::load_from_ron(&path).unwrap();
    assert_eq!(config, EngineConfig::default());
    assert!(config.validate().is_ok());
}

#[test]
fn missing_story_file_is_an_io_error() {
    let path = std::path::PathBuf::from("content/does_not_exist.ron");
    assert!(matches!(
        StoryContent::load_from_ron(&path),
        Err(ContentError::Io(_))
    ));
}

#[tokio::test]
async fn second_root_timeline_fails_at_load() {
    let mut content = story();
    let mut orphan = content.timelines[0].clone();
    orphan.id = TimelineId(2);
    orphan.name = "Beta".to_string();
    content.timelines.push(orphan);

    let result = StateController::builder()
        .build(InMemoryStore::from_content(content))
        .await;
    assert!(matches!(result, Err(EngineError::Content(_))));
}

#[tokio::test]
async fn dangling_choice_fails_at_load() {
    let mut content = story();
    content.choices[0].next_node_id = NodeId(404);

    let result = StateController::builder()
        .build(InMemoryStore::from_content(content))
        .await;
    assert!(matches!(
        result,
        Err(EngineError::Content(ContentError::Integrity(_)))
    ));
}
