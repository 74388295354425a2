/// Story Linter: validates story CSV files for links, arity and reachability.
///
/// Usage: story_linter <csv_or_dir> [--start <id>] [--strict] [--playthroughs <n>]

use story_engine::core::loader::DialogueGraph;
use story_engine::core::playtest::{random_playthrough, unreachable, PlaythroughOutcome};
use std::path::{Path, PathBuf};
use std::process;

struct LintReport {
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: story_linter <csv_or_dir> [--start <id>] [--strict] [--playthroughs <n>]");
        process::exit(0);
    }

    let story_path = Path::new(&args[1]);
    let mut start = None;
    let mut strict = false;
    let mut playthroughs = 0u64;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--start" if i + 1 < args.len() => {
                i += 1;
                start = Some(args[i].clone());
            }
            "--playthroughs" if i + 1 < args.len() => {
                i += 1;
                playthroughs = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("Error: --playthroughs must be a number");
                    process::exit(1);
                });
            }
            "--strict" => strict = true,
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let files = if story_path.is_file() {
        vec![story_path.to_path_buf()]
    } else if story_path.is_dir() {
        let mut found = Vec::new();
        collect_csv_files(story_path, &mut found);
        found.sort();
        found
    } else {
        eprintln!("ERROR: Path '{}' does not exist", story_path.display());
        process::exit(1);
    };

    let mut report = LintReport {
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    for path in &files {
        match DialogueGraph::load_from_path(path) {
            Ok(graph) => {
                println!("  Loaded: {} ({} nodes)", path.display(), graph.len());
                lint_graph(path, &graph, start.as_deref(), playthroughs, &mut report);
            }
            Err(e) => report.errors.push(format!("{}: {}", path.display(), e)),
        }
    }

    println!("\n=== Story Lint Report ===\n");

    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &report.warnings {
        println!("WARNING: {}", warning);
    }

    for error in &report.errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} files, {} errors, {} warnings",
        files.len(),
        report.errors.len(),
        report.warnings.len()
    );

    if report.errors.is_empty() && !(strict && !report.warnings.is_empty()) {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn collect_csv_files(dir: &Path, out: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_csv_files(&path, out);
            } else if path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            {
                out.push(path);
            }
        }
    }
}

fn lint_graph(
    path: &Path,
    graph: &DialogueGraph,
    start: Option<&str>,
    playthroughs: u64,
    report: &mut LintReport,
) {
    for warning in graph.warnings() {
        report.warnings.push(format!("{}: {}", path.display(), warning));
    }

    // Without an explicit start, the first authored row opens the story.
    let Some(start) = start.or_else(|| graph.ids().next()) else {
        return;
    };

    if !graph.contains(start) {
        report
            .errors
            .push(format!("{}: start node '{}' not found", path.display(), start));
        return;
    }

    for id in unreachable(graph, start) {
        report.warnings.push(format!(
            "{}: node '{}' is unreachable from '{}'",
            path.display(),
            id,
            start
        ));
    }

    for seed in 0..playthroughs {
        match random_playthrough(graph, start, seed, 10_000) {
            Ok(run) => match run.outcome {
                PlaythroughOutcome::Ended | PlaythroughOutcome::StepLimit => {}
                PlaythroughOutcome::BrokenLink(id) => report.errors.push(format!(
                    "{}: playthrough seed {} hit missing node '{}' after {} steps",
                    path.display(),
                    seed,
                    id,
                    run.visited.len()
                )),
                PlaythroughOutcome::DeadChoice(id) => report.errors.push(format!(
                    "{}: playthrough seed {} stuck on choice '{}' with no targets",
                    path.display(),
                    seed,
                    id
                )),
            },
            Err(e) => report.errors.push(format!("{}: {}", path.display(), e)),
        }
    }
}
