/// Traversal state machine over a loaded dialogue graph.
///
/// The host owns timing and input: it calls [`TraversalEngine::advance`]
/// once per player advance and [`TraversalEngine::choose`] when a choice
/// node is on display. Every call returns a [`NodeEvent`] for the
/// presentation layer.

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::core::loader::DialogueGraph;
use crate::schema::node::{is_terminal, DialogueNode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalError {
    #[error("start node not found: {0}")]
    StartNodeNotFound(String),
    #[error("node {0} is not a choice node")]
    NotAChoice(String),
    #[error("choice {index} out of range for node {id} ({available} option(s))")]
    ChoiceOutOfRange {
        id: String,
        index: usize,
        available: usize,
    },
}

/// Why a traversal stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// Reached an `END` marker or an empty link.
    Clean,
    /// A link pointed at an id the graph does not contain.
    BrokenLink(String),
    /// `start`/`resume` was given an unknown id.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalState {
    Uninitialized,
    AwaitingAdvance,
    Ended(EndReason),
}

/// What the presentation layer should do after a traversal call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent<'g> {
    /// A node is now on display.
    Displayed(&'g DialogueNode),
    /// The current node is a choice; call `choose` instead of `advance`.
    ChoicePending(&'g DialogueNode),
    /// The story finished. Only `EndReason::Clean` is emitted here;
    /// broken links have their own variant.
    Ended(EndReason),
    /// The story stopped on a link to a missing node.
    BrokenLink(String),
    /// Nothing happened: the engine is not awaiting an advance.
    NoAdvance,
}

/// A choice option as offered to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption<'g> {
    pub index: usize,
    pub label: &'g str,
    pub target: Option<&'g str>,
}

/// Cursor into one immutable graph. Several engines may share a graph.
#[derive(Debug, Clone)]
pub struct TraversalEngine<'g> {
    graph: &'g DialogueGraph,
    current: Option<&'g DialogueNode>,
    state: TraversalState,
}

impl<'g> TraversalEngine<'g> {
    pub fn new(graph: &'g DialogueGraph) -> Self {
        Self {
            graph,
            current: None,
            state: TraversalState::Uninitialized,
        }
    }

    pub fn graph(&self) -> &'g DialogueGraph {
        self.graph
    }

    pub fn state(&self) -> &TraversalState {
        &self.state
    }

    pub fn current(&self) -> Option<&'g DialogueNode> {
        self.current
    }

    pub fn current_id(&self) -> Option<&'g str> {
        self.current.map(|node| node.id.as_str())
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.state, TraversalState::Ended(_))
    }

    /// The id to persist for a later [`TraversalEngine::resume`].
    pub fn snapshot_id(&self) -> Option<String> {
        self.current_id().map(str::to_string)
    }

    /// Begin at `start_id`.
    pub fn start(&mut self, start_id: &str) -> Result<NodeEvent<'g>, TraversalError> {
        debug!("start at {}", start_id);
        self.enter(start_id)
    }

    /// Re-seed from a saved id. The node is shown as current; the next
    /// `advance` follows its own link.
    pub fn resume(&mut self, node_id: &str) -> Result<NodeEvent<'g>, TraversalError> {
        debug!("resume at {}", node_id);
        self.enter(node_id)
    }

    /// Follow the current node's link.
    pub fn advance(&mut self) -> NodeEvent<'g> {
        let Some(node) = self.awaiting() else {
            return NodeEvent::NoAdvance;
        };

        match node.linear_next() {
            Some(next) => self.follow(next),
            None => NodeEvent::ChoicePending(node),
        }
    }

    /// Take option `index` of the current choice node. `next_id` is
    /// ignored for choice nodes.
    pub fn choose(&mut self, index: usize) -> Result<NodeEvent<'g>, TraversalError> {
        let Some(node) = self.awaiting() else {
            return Ok(NodeEvent::NoAdvance);
        };
        if !node.is_choice() {
            return Err(TraversalError::NotAChoice(node.id.clone()));
        }

        let targets = node.target_ids();
        let target = targets
            .get(index)
            .copied()
            .ok_or_else(|| TraversalError::ChoiceOutOfRange {
                id: node.id.clone(),
                index,
                available: targets.len(),
            })?;
        debug!("{} chose option {} -> {}", node.id, index, target);
        Ok(self.follow(target))
    }

    /// Options of the current node if it is a choice, labels paired with
    /// their parallel targets. A label without a target has `None`.
    pub fn choices(&self) -> Vec<ChoiceOption<'g>> {
        let Some(node) = self.current.filter(|node| node.is_choice()) else {
            return Vec::new();
        };
        let targets = node.target_ids();
        node.choice_labels()
            .into_iter()
            .enumerate()
            .map(|(index, label)| ChoiceOption {
                index,
                label,
                target: targets.get(index).copied(),
            })
            .collect()
    }

    fn awaiting(&self) -> Option<&'g DialogueNode> {
        match self.state {
            TraversalState::AwaitingAdvance => self.current,
            _ => None,
        }
    }

    fn enter(&mut self, id: &str) -> Result<NodeEvent<'g>, TraversalError> {
        let graph = self.graph;
        match graph.get(id) {
            Some(node) => Ok(self.display(node)),
            None => {
                error!("start node not found: {}", id);
                self.current = None;
                self.state = TraversalState::Ended(EndReason::Failed);
                Err(TraversalError::StartNodeNotFound(id.to_string()))
            }
        }
    }

    fn follow(&mut self, next: &str) -> NodeEvent<'g> {
        if is_terminal(next) {
            debug!("story ended");
            self.current = None;
            self.state = TraversalState::Ended(EndReason::Clean);
            return NodeEvent::Ended(EndReason::Clean);
        }

        let graph = self.graph;
        match graph.get(next) {
            Some(node) => self.display(node),
            None => {
                warn!("next node not found: {}", next);
                self.current = None;
                self.state = TraversalState::Ended(EndReason::BrokenLink(next.to_string()));
                NodeEvent::BrokenLink(next.to_string())
            }
        }
    }

    fn display(&mut self, node: &'g DialogueNode) -> NodeEvent<'g> {
        self.current = Some(node);
        self.state = TraversalState::AwaitingAdvance;
        NodeEvent::Displayed(node)
    }
}
