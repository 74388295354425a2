use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::node::DialogueNode;

/// Number of save slots the host exposes.
pub const MAX_SAVE_SLOTS: usize = 3;

/// Scene a fresh game starts in.
pub const DEFAULT_SCENE: &str = "Prologue";

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("invalid save slot: {0}")]
    InvalidSlot(usize),
    #[error("RON serialization error: {0}")]
    RonSer(#[from] ron::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A validated save-slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaveSlot(usize);

impl SaveSlot {
    pub fn new(slot: usize) -> Result<Self, ProgressError> {
        if slot < MAX_SAVE_SLOTS {
            Ok(Self(slot))
        } else {
            Err(ProgressError::InvalidSlot(slot))
        }
    }

    pub fn index(&self) -> usize {
        self.0
    }

    /// Conventional file name for this slot, e.g. `save_0.ron`.
    pub fn file_name(&self) -> String {
        format!("save_{}.ron", self.0)
    }
}

/// The snapshot the host's save system persists.
///
/// Only `current_dialogue_id` matters to the dialogue core; it is the id
/// handed back to [`crate::core::traversal::TraversalEngine::resume`].
/// `save_time` is an opaque timestamp string supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current_dialogue_id: String,
    pub current_scene: String,
    #[serde(default)]
    pub money: i64,
    #[serde(default)]
    pub save_name: String,
    #[serde(default)]
    pub save_time: String,
}

impl Progress {
    pub fn new_game(start_id: &str) -> Self {
        Self {
            current_dialogue_id: start_id.to_string(),
            current_scene: DEFAULT_SCENE.to_string(),
            money: 0,
            save_name: "New Game".to_string(),
            save_time: String::new(),
        }
    }

    /// A snapshot positioned on `node`, taking its scene when it has one.
    pub fn at_node(node: &DialogueNode) -> Self {
        let mut progress = Self::new_game(&node.id);
        if !node.scene.is_empty() {
            progress.current_scene = node.scene.clone();
        }
        progress
    }

    pub fn to_ron(&self) -> Result<String, ProgressError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn from_ron(input: &str) -> Result<Self, ProgressError> {
        Ok(ron::from_str(input)?)
    }
}

/// Endings the player has reached, in the order they were first reached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndingRecord {
    endings: Vec<String>,
}

impl EndingRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an ending. Returns true if it had not been reached before.
    /// Empty ids are ignored.
    pub fn record(&mut self, ending_id: &str) -> bool {
        if ending_id.is_empty() || self.has(ending_id) {
            return false;
        }
        self.endings.push(ending_id.to_string());
        true
    }

    pub fn has(&self, ending_id: &str) -> bool {
        !ending_id.is_empty() && self.endings.iter().any(|e| e == ending_id)
    }

    pub fn all(&self) -> &[String] {
        &self.endings
    }

    pub fn len(&self) -> usize {
        self.endings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endings.is_empty()
    }

    pub fn to_ron(&self) -> Result<String, ProgressError> {
        Ok(ron::to_string(self)?)
    }

    pub fn from_ron(input: &str) -> Result<Self, ProgressError> {
        Ok(ron::from_str(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_bounds() {
        assert_eq!(SaveSlot::new(0).unwrap().index(), 0);
        assert_eq!(SaveSlot::new(2).unwrap().file_name(), "save_2.ron");
        assert!(matches!(
            SaveSlot::new(3),
            Err(ProgressError::InvalidSlot(3))
        ));
    }

    #[test]
    fn new_game_defaults() {
        let p = Progress::new_game("pre_0001");
        assert_eq!(p.current_dialogue_id, "pre_0001");
        assert_eq!(p.current_scene, "Prologue");
        assert_eq!(p.money, 0);
        assert_eq!(p.save_name, "New Game");
    }

    #[test]
    fn at_node_takes_scene() {
        let node = DialogueNode {
            id: "te_0002".to_string(),
            scene: "Harbor".to_string(),
            ..Default::default()
        };
        let p = Progress::at_node(&node);
        assert_eq!(p.current_dialogue_id, "te_0002");
        assert_eq!(p.current_scene, "Harbor");

        let bare = DialogueNode {
            id: "x".to_string(),
            ..Default::default()
        };
        assert_eq!(Progress::at_node(&bare).current_scene, "Prologue");
    }

    #[test]
    fn progress_ron_round_trip() {
        let mut p = Progress::new_game("pre_0042");
        p.money = 120;
        p.save_time = "2026-02-03T17:30:00".to_string();
        let text = p.to_ron().unwrap();
        assert_eq!(Progress::from_ron(&text).unwrap(), p);
    }

    #[test]
    fn progress_missing_optional_fields() {
        let p = Progress::from_ron(
            r#"(current_dialogue_id: "end_0003", current_scene: "Endings")"#,
        )
        .unwrap();
        assert_eq!(p.current_dialogue_id, "end_0003");
        assert_eq!(p.money, 0);
        assert!(p.save_name.is_empty());
    }

    #[test]
    fn progress_malformed_input() {
        assert!(matches!(
            Progress::from_ron("(current_dialogue_id: 3"),
            Err(ProgressError::Ron(_))
        ));
    }

    #[test]
    fn ending_record_dedup() {
        let mut rec = EndingRecord::new();
        assert!(rec.record("end1"));
        assert!(!rec.record("end1"));
        assert!(!rec.record(""));
        assert!(rec.record("end3"));
        assert_eq!(rec.all(), &["end1".to_string(), "end3".to_string()]);
        assert!(rec.has("end3"));
        assert!(!rec.has("end2"));
        assert!(!rec.has(""));
        assert_eq!(rec.len(), 2);
    }

    #[test]
    fn ending_record_ron() {
        let mut rec = EndingRecord::new();
        rec.record("end2");
        let restored = EndingRecord::from_ron(&rec.to_ron().unwrap()).unwrap();
        assert_eq!(restored, rec);
    }
}
