/// Preview: interactive shell for stepping through a story.
///
/// Usage: preview --story <file.csv> [--start <id>] [--seed <n>]
///        preview --manifest <manifest.ron> [--name <story>] [--seed <n>]
///
/// Commands:
///   next | n          : advance past the current node
///   choose <n>        : take option n of the current choice
///   goto <id>         : resume at a node id
///   save              : print the current progress as RON
///   load <ron>        : resume from a RON progress snapshot
///   auto <n>          : random playthrough from the current node, n steps max
///   info              : show graph and cursor state
///   help              : list commands
///   quit              : exit

use story_engine::core::loader::DialogueGraph;
use story_engine::core::manifest::StoryManifest;
use story_engine::core::playtest::random_playthrough;
use story_engine::core::traversal::{NodeEvent, TraversalEngine};
use story_engine::schema::node::DialogueNode;
use story_engine::schema::progress::Progress;
use std::io::{self, BufRead, Write};
use std::path::Path;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut story_path = None;
    let mut manifest_path = None;
    let mut story_name = None;
    let mut start = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--story" if i + 1 < args.len() => {
                i += 1;
                story_path = Some(args[i].clone());
            }
            "--manifest" if i + 1 < args.len() => {
                i += 1;
                manifest_path = Some(args[i].clone());
            }
            "--name" if i + 1 < args.len() => {
                i += 1;
                story_name = Some(args[i].clone());
            }
            "--start" if i + 1 < args.len() => {
                i += 1;
                start = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let (graph, start) = match (story_path, manifest_path) {
        (Some(path), None) => match DialogueGraph::load_from_path(Path::new(&path)) {
            Ok(graph) => {
                let start = start.or_else(|| graph.ids().next().map(str::to_string));
                (graph, start)
            }
            Err(e) => {
                eprintln!("ERROR: Failed to load story '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        (None, Some(path)) => load_from_manifest(Path::new(&path), story_name, start),
        _ => {
            eprintln!("ERROR: pass exactly one of --story or --manifest");
            print_usage();
            std::process::exit(1);
        }
    };

    let Some(start) = start else {
        eprintln!("ERROR: story is empty and no --start was given");
        std::process::exit(1);
    };

    println!("Loaded {} dialogue nodes", graph.len());
    for warning in graph.warnings() {
        println!("WARNING: {}", warning);
    }
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    let mut engine = TraversalEngine::new(&graph);
    match engine.start(&start) {
        Ok(event) => print_event(&event),
        Err(e) => println!("ERROR: {}", e),
    }

    let mut current_seed = seed;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim()),
            None => (line.to_lowercase(), ""),
        };

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "next" | "n" => {
                let event = engine.advance();
                print_event(&event);
            }
            "choose" | "c" => match rest.parse::<usize>() {
                Ok(index) => match engine.choose(index) {
                    Ok(event) => print_event(&event),
                    Err(e) => println!("ERROR: {}", e),
                },
                Err(_) => println!("Usage: choose <n>"),
            },
            "goto" => {
                if rest.is_empty() {
                    println!("Usage: goto <id>");
                    continue;
                }
                match engine.resume(rest) {
                    Ok(event) => print_event(&event),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "save" => {
                let Some(node) = engine.current() else {
                    println!("Nothing to save: no node on display.");
                    continue;
                };
                let progress = Progress::at_node(node);
                match progress.to_ron() {
                    Ok(text) => println!("{}", text),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "load" => match Progress::from_ron(rest) {
                Ok(progress) => match engine.resume(&progress.current_dialogue_id) {
                    Ok(event) => print_event(&event),
                    Err(e) => println!("ERROR: {}", e),
                },
                Err(e) => println!("ERROR: {}", e),
            },
            "auto" => {
                let steps: usize = rest.parse().unwrap_or(100);
                let Some(from) = engine.current_id() else {
                    println!("No node on display. Use 'goto <id>' first.");
                    continue;
                };
                match random_playthrough(&graph, from, current_seed, steps) {
                    Ok(run) => {
                        println!("\n--- Playthrough (seed {}) ---", current_seed);
                        println!("{}", run.visited.join(" -> "));
                        println!("Outcome: {:?}", run.outcome);
                        println!("--- End ---\n");
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
                current_seed = current_seed.wrapping_add(1);
            }
            "info" => {
                println!("Nodes: {}", graph.len());
                println!("Warnings: {}", graph.warnings().len());
                println!("State: {:?}", engine.state());
                if let Some(id) = engine.current_id() {
                    println!("Current: {}", id);
                }
            }
            other => println!("Unknown command: {}. Type 'help'.", other),
        }
    }
}

fn load_from_manifest(
    path: &Path,
    name: Option<String>,
    start: Option<String>,
) -> (DialogueGraph, Option<String>) {
    let manifest = StoryManifest::load_from_ron(path).unwrap_or_else(|e| {
        eprintln!("ERROR: Failed to load manifest '{}': {}", path.display(), e);
        std::process::exit(1);
    });
    let name = name.unwrap_or_else(|| manifest.default_story.clone());
    let base_dir = path.parent().unwrap_or(Path::new("."));

    let graph = manifest.load_story(&name, base_dir).unwrap_or_else(|e| {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    });
    let start = start.or_else(|| manifest.story(&name).ok().map(|s| s.start.clone()));
    (graph, start)
}

fn print_node(node: &DialogueNode) {
    println!();
    if !node.scene.is_empty() || !node.bg.is_empty() {
        println!("  [scene: {} | bg: {}]", node.scene, node.bg);
    }
    if node.shows_speaker() && !node.display_name().is_empty() {
        println!("  {}:", node.display_name());
    }
    println!("  {}", node.content);
    println!("  ({} · {})", node.id, node.kind().name());
}

fn print_event(event: &NodeEvent<'_>) {
    match event {
        NodeEvent::Displayed(node) => {
            print_node(node);
            if node.is_choice() {
                print_choices(node);
            }
        }
        NodeEvent::ChoicePending(node) => {
            println!("Choose an option with 'choose <n>':");
            print_choices(node);
        }
        NodeEvent::Ended(reason) => println!("\n=== Story ended ({:?}) ===", reason),
        NodeEvent::BrokenLink(id) => println!("\n=== Broken link: node '{}' does not exist ===", id),
        NodeEvent::NoAdvance => println!("Nothing to advance. Use 'goto <id>' to continue."),
    }
}

fn print_choices(node: &DialogueNode) {
    let targets = node.target_ids();
    for (i, label) in node.choice_labels().iter().enumerate() {
        let target = targets.get(i).copied().unwrap_or("<missing>");
        println!("    [{}] {} -> {}", i, label, target);
    }
}

fn print_usage() {
    println!("Usage: preview --story <file.csv> [--start <id>] [--seed <n>]");
    println!("       preview --manifest <manifest.ron> [--name <story>] [--seed <n>]");
}

fn print_help() {
    println!("Commands:");
    println!("  next | n     : advance past the current node");
    println!("  choose <n>   : take option n of the current choice");
    println!("  goto <id>    : resume at a node id");
    println!("  save         : print the current progress as RON");
    println!("  load <ron>   : resume from a RON progress snapshot");
    println!("  auto <n>     : random playthrough from the current node");
    println!("  info         : show graph and cursor state");
    println!("  help         : list commands");
    println!("  quit         : exit");
}
