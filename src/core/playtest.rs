/// Offline story analysis: reachability and seeded random playthroughs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;

use crate::core::loader::DialogueGraph;
use crate::core::traversal::{EndReason, NodeEvent, TraversalEngine, TraversalError};
use crate::schema::node::{is_terminal, DialogueNode, NodeKind};

/// How a random playthrough stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaythroughOutcome {
    Ended,
    BrokenLink(String),
    /// A choice node with no usable target.
    DeadChoice(String),
    StepLimit,
}

/// The path a random playthrough took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playthrough {
    pub visited: Vec<String>,
    pub outcome: PlaythroughOutcome,
}

/// Every id a node can link to: next id, jump target and all choice targets.
fn successors(node: &DialogueNode) -> Vec<&str> {
    let mut out = match node.kind() {
        NodeKind::Choice | NodeKind::Jump => node.target_ids(),
        _ => Vec::new(),
    };
    if let Some(next) = node.linear_next() {
        if !out.contains(&next) {
            out.push(next);
        }
    }
    out.retain(|id| !is_terminal(id));
    out
}

/// Ids reachable from `start`, `start` included. Links to missing nodes
/// are not followed.
pub fn reachable_from(graph: &DialogueGraph, start: &str) -> FxHashSet<String> {
    let mut seen = FxHashSet::default();
    let mut stack = vec![start];

    while let Some(id) = stack.pop() {
        let Some(node) = graph.get(id) else {
            continue;
        };
        if !seen.insert(id.to_string()) {
            continue;
        }
        stack.extend(successors(node));
    }

    seen
}

/// Ids that cannot be reached from `start`, in source order.
pub fn unreachable(graph: &DialogueGraph, start: &str) -> Vec<String> {
    let seen = reachable_from(graph, start);
    graph
        .ids()
        .filter(|id| !seen.contains(*id))
        .map(str::to_string)
        .collect()
}

/// Walk the story from `start`, picking choice options uniformly at random.
/// The same seed always produces the same path.
pub fn random_playthrough(
    graph: &DialogueGraph,
    start: &str,
    seed: u64,
    max_steps: usize,
) -> Result<Playthrough, TraversalError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut engine = TraversalEngine::new(graph);
    let mut visited = Vec::new();

    let mut event = engine.start(start)?;
    for _ in 0..max_steps {
        event = match event {
            NodeEvent::Displayed(node) => {
                visited.push(node.id.clone());
                engine.advance()
            }
            NodeEvent::ChoicePending(node) => {
                let options = node.target_ids().len();
                if options == 0 {
                    return Ok(Playthrough {
                        visited,
                        outcome: PlaythroughOutcome::DeadChoice(node.id.clone()),
                    });
                }
                engine.choose(rng.gen_range(0..options))?
            }
            NodeEvent::Ended(EndReason::BrokenLink(id)) | NodeEvent::BrokenLink(id) => {
                return Ok(Playthrough {
                    visited,
                    outcome: PlaythroughOutcome::BrokenLink(id),
                });
            }
            NodeEvent::Ended(_) | NodeEvent::NoAdvance => {
                return Ok(Playthrough {
                    visited,
                    outcome: PlaythroughOutcome::Ended,
                });
            }
        };
    }

    Ok(Playthrough {
        visited,
        outcome: PlaythroughOutcome::StepLimit,
    })
}
