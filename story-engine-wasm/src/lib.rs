//! WASM bindings for story-engine: powers the browser story preview.

use wasm_bindgen::prelude::*;

use story_engine::core::loader::DialogueGraph;
use story_engine::core::playtest::{random_playthrough, unreachable};
use story_engine::core::traversal::{NodeEvent, TraversalEngine, TraversalError};
use story_engine::schema::node::DialogueNode;
use story_engine::schema::progress::Progress;

// ---------------------------------------------------------------------------
// Embedded story data: compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const PROLOGUE: &str = include_str!("../../story_data/prologue.csv");
    pub const END_FAILED: &str = include_str!("../../story_data/END_BE_failed.csv");
    pub const END_WIND: &str = include_str!("../../story_data/END_TE_wind.csv");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct NodeView {
    id: String,
    node_type: String,
    /// Empty for narration.
    speaker: String,
    content: String,
    scene: String,
    bg: String,
    bgm: String,
    fx: String,
    choices: Vec<String>,
}

#[derive(serde::Serialize)]
struct StepOutput {
    kind: &'static str,
    node: Option<NodeView>,
    missing: Option<String>,
}

#[derive(serde::Serialize)]
struct GraphInfo {
    nodes: usize,
    warnings: Vec<String>,
    unreachable: Vec<String>,
}

enum Action<'a> {
    Start(&'a str),
    Advance,
    Choose(usize),
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------
fn node_view(node: &DialogueNode) -> NodeView {
    NodeView {
        id: node.id.clone(),
        node_type: node.kind().name().to_string(),
        speaker: if node.shows_speaker() {
            node.display_name().to_string()
        } else {
            String::new()
        },
        content: node.content.clone(),
        scene: node.scene.clone(),
        bg: node.bg.clone(),
        bgm: node.bgm.clone(),
        fx: node.fx.clone(),
        choices: node
            .choice_labels()
            .into_iter()
            .map(str::to_string)
            .collect(),
    }
}

fn step_output(event: &NodeEvent<'_>) -> StepOutput {
    match event {
        NodeEvent::Displayed(node) => StepOutput {
            kind: "displayed",
            node: Some(node_view(node)),
            missing: None,
        },
        NodeEvent::ChoicePending(node) => StepOutput {
            kind: "choice_pending",
            node: Some(node_view(node)),
            missing: None,
        },
        NodeEvent::Ended(_) => StepOutput {
            kind: "ended",
            node: None,
            missing: None,
        },
        NodeEvent::BrokenLink(id) => StepOutput {
            kind: "broken_link",
            node: None,
            missing: Some(id.clone()),
        },
        NodeEvent::NoAdvance => StepOutput {
            kind: "no_advance",
            node: None,
            missing: None,
        },
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// StorySession: the main exported struct
// ---------------------------------------------------------------------------

/// Owns one loaded graph plus the id of the node on display. Each call
/// re-seeds a traversal engine from that id.
#[wasm_bindgen]
pub struct StorySession {
    graph: DialogueGraph,
    current: Option<String>,
}

#[wasm_bindgen]
impl StorySession {
    /// Load a session from CSV text.
    #[wasm_bindgen(constructor)]
    pub fn new(csv: &str) -> Result<StorySession, JsError> {
        let graph = DialogueGraph::parse_csv(csv)
            .map_err(|e| JsError::new(&format!("Story load error: {e}")))?;
        Ok(StorySession {
            graph,
            current: None,
        })
    }

    /// Load one of the bundled stories by name.
    pub fn bundled(name: &str) -> Result<StorySession, JsError> {
        let source = match name {
            "prologue" => data::PROLOGUE,
            "end_failed" => data::END_FAILED,
            "end_wind" => data::END_WIND,
            _ => return Err(JsError::new(&format!("Unknown story: {name}"))),
        };
        Self::new(source)
    }

    pub fn bundled_stories() -> String {
        serde_json::to_string(&["prologue", "end_failed", "end_wind"])
            .unwrap_or_else(|_| "[]".to_string())
    }

    /// Node count, load warnings and unreachable nodes as JSON.
    pub fn info(&self, start: &str) -> Result<String, JsError> {
        to_json(&GraphInfo {
            nodes: self.graph.len(),
            warnings: self.graph.warnings().iter().map(|w| w.to_string()).collect(),
            unreachable: unreachable(&self.graph, start),
        })
    }

    /// Start (or resume) at a node. Returns a step as JSON.
    pub fn start(&mut self, id: &str) -> Result<String, JsError> {
        self.step(Action::Start(id))
    }

    pub fn advance(&mut self) -> Result<String, JsError> {
        self.step(Action::Advance)
    }

    pub fn choose(&mut self, index: usize) -> Result<String, JsError> {
        self.step(Action::Choose(index))
    }

    /// The current progress as RON, or an empty string if nothing is shown.
    /// The scene is taken from the node on display.
    pub fn save(&self) -> Result<String, JsError> {
        match self.current.as_deref().and_then(|id| self.graph.get(id)) {
            Some(node) => Progress::at_node(node)
                .to_ron()
                .map_err(|e| JsError::new(&format!("Save error: {e}"))),
            None => Ok(String::new()),
        }
    }

    /// Resume from a RON progress snapshot produced by `save`.
    pub fn load(&mut self, progress_ron: &str) -> Result<String, JsError> {
        let progress = Progress::from_ron(progress_ron)
            .map_err(|e| JsError::new(&format!("Load error: {e}")))?;
        self.step(Action::Start(&progress.current_dialogue_id))
    }

    /// Seeded random walk from `start`. Returns the visited ids as JSON.
    pub fn autoplay(&self, start: &str, seed: u64, max_steps: usize) -> Result<String, JsError> {
        let run = random_playthrough(&self.graph, start, seed, max_steps)
            .map_err(|e| JsError::new(&format!("Traversal error: {e}")))?;
        to_json(&run.visited)
    }
}

impl StorySession {
    fn step(&mut self, action: Action<'_>) -> Result<String, JsError> {
        let (output, current) = {
            let mut engine = TraversalEngine::new(&self.graph);
            if let (Some(id), false) = (&self.current, matches!(action, Action::Start(_))) {
                engine
                    .resume(id)
                    .map_err(|e| JsError::new(&format!("Traversal error: {e}")))?;
            }

            let event = match action {
                Action::Start(id) => engine.resume(id),
                Action::Advance => Ok(engine.advance()),
                Action::Choose(index) => engine.choose(index),
            }
            .map_err(|e: TraversalError| JsError::new(&format!("Traversal error: {e}")))?;

            (step_output(&event), engine.snapshot_id())
        };

        self.current = current;
        to_json(&output)
    }
}
