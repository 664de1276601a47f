/// Story Linter: validates story content integrity and structure.
///
/// Usage: story_linter <story.ron> [--config <config.ron>]

use narrative_state::core::config::EngineConfig;
use narrative_state::core::content::StoryContent;
use narrative_state::core::graph::NarrativeGraph;
use narrative_state::schema::node::{ChoiceEffect, Condition};
use std::collections::HashSet;
use std::path::Path;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "narrative_state=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: story_linter <story.ron> [--config <config.ron>]");
        process::exit(0);
    }

    let story_path = Path::new(&args[1]);
    let mut config_path = None;

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--config" && i + 1 < args.len() {
            i += 1;
            config_path = Some(args[i].clone());
        }
        i += 1;
    }

    let content = match StoryContent::load_from_ron(story_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("ERROR: Failed to load story file: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} nodes, {} choices, {} entities",
        content.nodes.len(),
        content.choices.len(),
        content.entities.len()
    );

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if let Some(ref path) = config_path {
        match EngineConfig::load_from_ron(Path::new(path)) {
            Ok(config) => {
                if let Err(e) = config.validate() {
                    errors.push(format!("Config '{}': {}", path, e));
                }
            }
            Err(e) => errors.push(format!("Config '{}' failed to load: {}", path, e)),
        }
    }

    match content.validate() {
        Ok(graph) => lint_story(&content, &graph, &mut warnings),
        Err(e) => errors.push(e.to_string()),
    }

    // Print report
    println!("\n=== Story Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_story(content: &StoryContent, graph: &NarrativeGraph, warnings: &mut Vec<String>) {
    let start = content.initial_state.current_node_id;
    let reachable = graph.reachable_from(start);

    for node in graph.nodes() {
        if !reachable.contains(&node.id) {
            warnings.push(format!(
                "Node {} '{}' is unreachable from start node {}",
                node.id, node.title, start
            ));
        }

        let choices = graph.get_choices(node.id);
        if node.is_ending {
            if !choices.is_empty() {
                warnings.push(format!(
                    "Ending node {} '{}' has {} choices that can never be taken",
                    node.id,
                    node.title,
                    choices.len()
                ));
            }
            continue;
        }

        if node.is_choice_node {
            match choices.len() {
                0 => warnings.push(format!(
                    "Choice node {} '{}' has no choices and is not an ending",
                    node.id, node.title
                )),
                1 => warnings.push(format!(
                    "Choice node {} '{}' offers a single choice (branching never triggers)",
                    node.id, node.title
                )),
                _ => {}
            }
        } else if graph.continuation(node.id).is_none()
            && graph.next_in_sequence(node.id).is_none()
        {
            warnings.push(format!(
                "Node {} '{}' cannot advance and is not an ending",
                node.id, node.title
            ));
        }

        for choice in choices {
            if choice.is_self_loop() {
                warnings.push(format!(
                    "Choice {} at node {} loops back to its own node",
                    choice.id, node.id
                ));
            }
        }
    }

    // Conditions on variables nothing ever sets can only be satisfied by
    // scripted `set_variables` calls.
    let initial: HashSet<&str> = content
        .initial_state
        .variables
        .keys()
        .map(String::as_str)
        .collect();
    let set_by_effects: HashSet<&str> = content
        .choices
        .iter()
        .flat_map(|c| c.effects.iter())
        .filter_map(|effect| match effect {
            ChoiceEffect::SetVariable { key, .. } => Some(key.as_str()),
            _ => None,
        })
        .collect();

    for choice in &content.choices {
        let Some(condition) = &choice.condition else {
            continue;
        };
        let mut keys = Vec::new();
        condition_keys(condition, &mut keys);
        for key in keys {
            if !initial.contains(key) && !set_by_effects.contains(key) {
                warnings.push(format!(
                    "Choice {} depends on variable '{}' which no choice effect sets",
                    choice.id, key
                ));
            }
        }
    }
}

fn condition_keys<'a>(condition: &'a Condition, keys: &mut Vec<&'a str>) {
    match condition {
        Condition::Flag(key)
        | Condition::Equals { key, .. }
        | Condition::AtLeast { key, .. } => keys.push(key),
        Condition::Not(inner) => condition_keys(inner, keys),
        Condition::All(all) | Condition::Any(all) => {
            for c in all {
                condition_keys(c, keys);
            }
        }
    }
}
