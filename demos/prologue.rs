/// Prologue demo: plays the bundled story through to an ending.
///
/// Loads `story_data/manifest.ron`, walks the prologue picking the first
/// option at every choice, then plays the ending that matches the
/// prologue's outcome and records it.
///
/// Run with: cargo run --example prologue

use story_engine::core::manifest::StoryManifest;
use story_engine::core::traversal::{NodeEvent, TraversalEngine};
use story_engine::schema::node::DialogueNode;
use story_engine::schema::progress::{EndingRecord, Progress};
use std::path::Path;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let base = Path::new("story_data");
    let manifest = StoryManifest::load_from_ron(&base.join("manifest.ron"))
        .expect("Failed to load story manifest");

    let prologue_name = manifest.default_story.clone();
    let prologue = manifest
        .load_story(&prologue_name, base)
        .expect("Failed to load prologue");
    let start = manifest.story(&prologue_name).expect("prologue entry").start.clone();

    let mut progress = Progress::new_game(&start);
    let mut engine = TraversalEngine::new(&prologue);
    let mut event = engine.start(&start).expect("Prologue start node missing");
    let mut last_line = String::new();

    println!("=== {} ===", prologue_name);
    loop {
        event = match event {
            NodeEvent::Displayed(node) => {
                show(node);
                last_line = node.id.clone();
                progress.current_dialogue_id = node.id.clone();
                engine.advance()
            }
            NodeEvent::ChoicePending(node) => {
                let labels = node.choice_labels();
                println!("    > {}", labels.first().copied().unwrap_or("..."));
                engine.choose(0).expect("choice without targets")
            }
            NodeEvent::Ended(_) => {
                println!("=== end of {} ===\n", prologue_name);
                break;
            }
            NodeEvent::BrokenLink(id) => {
                println!("!!! broken link to '{}'", id);
                break;
            }
            NodeEvent::NoAdvance => break,
        };
    }

    println!("Saved progress:\n{}\n", progress.to_ron().expect("serialize progress"));

    // Boarding the ferry leads to the wind ending; turning back to the
    // failed ending.
    let ending_story = if last_line == "pre_0012" {
        "end_wind"
    } else {
        "end_failed"
    };

    let graph = manifest
        .load_story(ending_story, base)
        .expect("Failed to load ending");
    let mut engine = TraversalEngine::new(&graph);
    let start = &manifest.story(ending_story).expect("ending entry").start;
    let mut event = engine.start(start).expect("Ending start node missing");
    while let NodeEvent::Displayed(node) = event {
        show(node);
        event = engine.advance();
    }

    let mut record = EndingRecord::new();
    if let Some(ending) = manifest.ending_for(ending_story) {
        record.record(&ending.id);
        println!("\nEnding reached: {} ({})", ending.title, ending.id);
    }
    println!(
        "Endings unlocked: {}/{}",
        record.len(),
        manifest.endings.len()
    );
}

fn show(node: &DialogueNode) {
    if node.shows_speaker() {
        println!("{}: {}", node.display_name(), node.content);
    } else {
        println!("  {}", node.content);
    }
}
