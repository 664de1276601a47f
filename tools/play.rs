/// Play: interactive console shell for walking a story.
///
/// Usage: play <story.ron> [--config <config.ron>] [--seed <n>]
///
/// Commands:
///   choose <id>       : take a choice offered at the current node
///   continue          : advance from a non-choice node
///   timelines         : list timelines, marking the current one
///   switch <id>       : switch to another timeline
///   history           : show the visit log
///   world <entity_id> : describe an entity's relationships
///   help              : list commands
///   quit              : exit

use narrative_state::core::config::EngineConfig;
use narrative_state::core::content::StoryContent;
use narrative_state::core::controller::{EngineEvent, StateController};
use narrative_state::core::store::InMemoryStore;
use narrative_state::schema::entity::EntityId;
use narrative_state::schema::node::{ChoiceId, Node};
use narrative_state::schema::timeline::TimelineId;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "narrative_state=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let story_path = args[1].clone();
    let mut config_path = None;
    let mut seed = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().ok();
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let content = match StoryContent::load_from_ron(Path::new(&story_path)) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Failed to load story: {}", e);
            std::process::exit(1);
        }
    };

    let config = match config_path {
        Some(ref path) => match EngineConfig::load_from_ron(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    let mut builder = StateController::builder().config(config);
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    let engine = match builder.build(InMemoryStore::from_content(content)).await {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to start engine: {}", e);
            std::process::exit(1);
        }
    };
    let mut events = engine.subscribe();

    match engine.start().await {
        Ok(node) => show_node(&engine, &node).await,
        Err(e) => {
            eprintln!("Failed to start story: {}", e);
            std::process::exit(1);
        }
    }

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "choose" | "c" => {
                let Some(id) = parts.get(1).and_then(|s| s.parse().ok()) else {
                    println!("Usage: choose <id>");
                    continue;
                };
                match engine.apply_choice(ChoiceId(id)).await {
                    Ok(outcome) => {
                        drain_events(&mut events);
                        show_node(&engine, &outcome.node).await;
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "continue" | "n" => {
                let state = engine.game_state().await;
                match engine.advance(state.current_node_id).await {
                    Ok(node) => {
                        drain_events(&mut events);
                        show_node(&engine, &node).await;
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "timelines" => {
                let current = engine.game_state().await.current_timeline_id;
                for timeline in engine.timelines().await {
                    let marker = if timeline.id == current { "*" } else { " " };
                    let origin = match (timeline.parent_id, timeline.divergence_point_node_id) {
                        (Some(parent), Some(node)) => {
                            format!(" (from {} at node {})", parent, node)
                        }
                        _ => String::new(),
                    };
                    println!("{} [{}] {}{}", marker, timeline.id, timeline.name, origin);
                }
            }
            "switch" => {
                let Some(id) = parts.get(1).and_then(|s| s.parse().ok()) else {
                    println!("Usage: switch <id>");
                    continue;
                };
                match engine.switch_timeline(TimelineId(id)).await {
                    Ok(timeline) => println!("Now in timeline {}", timeline.name),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "history" => {
                for entry in engine.history().await {
                    let title = engine
                        .graph()
                        .get_node(entry.node_id)
                        .map_or("?", |n| n.title.as_str());
                    match entry.choice_id {
                        Some(choice) => println!(
                            "  #{} left '{}' via choice {}",
                            entry.id.0, title, choice
                        ),
                        None => println!("  #{} arrived at '{}'", entry.id.0, title),
                    }
                }
            }
            "world" => {
                let id = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(1);
                match engine.describe_relationships(EntityId(id)).await {
                    Ok(summaries) if summaries.is_empty() => println!("No relationships."),
                    Ok(summaries) => {
                        for s in summaries {
                            println!(
                                "  {:?} {} {} ({})",
                                s.direction,
                                s.kind,
                                s.counterpart_name,
                                s.bucket.qualifier()
                            );
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            "help" => print_commands(),
            "quit" | "exit" | "q" => break,
            other => println!("Unknown command: {} (try 'help')", other),
        }
    }
}

async fn show_node(engine: &StateController<InMemoryStore>, node: &Node) {
    let storyline = engine
        .graph()
        .storyline_of(node.id)
        .map_or("", |s| s.name.as_str());
    println!("\n== {} [{}] ==\n", node.title, storyline);
    println!("{}\n", node.content);

    if node.is_ending {
        println!("(The End)");
        return;
    }
    if !node.is_choice_node {
        println!("(type 'continue')");
        return;
    }
    for choice in engine.available_choices().await {
        println!("  [{}] {}", choice.id, choice.text);
    }
}

fn drain_events(events: &mut broadcast::Receiver<EngineEvent>) {
    loop {
        match events.try_recv() {
            Ok(EngineEvent::BranchCreated(branch)) => println!(
                "\n*** Timeline {} branched off at node {}: {} ***",
                branch.timeline_name, branch.divergence_node_id, branch.source_text
            ),
            Ok(EngineEvent::LoopDetected(event)) => println!(
                "\n*** Loop: choice {} returns to node {} ***",
                event.choice_id, event.node_id
            ),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
}

fn print_usage() {
    println!("Usage: play <story.ron> [--config <config.ron>] [--seed <n>]");
    println!();
    print_commands();
}

fn print_commands() {
    println!("Commands:");
    println!("  choose <id>        Take a choice at the current node");
    println!("  continue           Advance from a non-choice node");
    println!("  timelines          List timelines");
    println!("  switch <id>        Switch to another timeline");
    println!("  history            Show the visit log");
    println!("  world <entity_id>  Describe an entity's relationships");
    println!("  help               Show this help");
    println!("  quit               Exit");
}
