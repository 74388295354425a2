use serde::{Deserialize, Serialize};

/// Reserved `next_id`/`target` value that terminates a story.
pub const END_MARKER: &str = "END";

/// Separator for multi-valued fields (`choices`, `target`).
pub const PIPE_SEPARATOR: char = '|';

/// Recognized CSV header names. Matching is case-insensitive.
pub mod columns {
    pub const ID: &str = "id";
    pub const NEXT_ID: &str = "next_id";
    pub const SPEAKER: &str = "speaker";
    pub const SCENE: &str = "scene";
    pub const CONTENT: &str = "content";
    pub const TYPE: &str = "type";
    pub const CHOICES: &str = "choices";
    pub const TARGET: &str = "target";
    pub const CONDITION: &str = "condition";
    pub const EXPRESSION: &str = "expression";
    pub const FX: &str = "fx";
    pub const BG: &str = "bg";
    pub const EFFECT: &str = "effect";
    pub const NAME_OVERRIDE: &str = "nameOverride";
    pub const BGM: &str = "bgm";
}

/// Case-insensitive comparison. Type and header lookups lowercase their
/// keys up front instead.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// True for the `END` sentinel in any casing.
pub fn is_end_marker(value: &str) -> bool {
    eq_ignore_case(value, END_MARKER)
}

/// True when a link value terminates the story: empty or `END`.
pub fn is_terminal(value: &str) -> bool {
    value.is_empty() || is_end_marker(value)
}

/// Split a pipe-delimited field, trimming parts and dropping empty ones.
pub fn split_pipe(value: &str) -> Vec<&str> {
    value
        .split(PIPE_SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// The closed set of node types the engine understands.
///
/// Unrecognized authored values are preserved in `Other` and are displayed
/// like `Line`; nothing rejects them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Line,
    Narration,
    Choice,
    Jump,
    Command,
    Other(String),
}

impl NodeKind {
    /// Classify an authored `type` cell. Empty cells are lines.
    pub fn classify(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" | "line" => Self::Line,
            "narration" => Self::Narration,
            "choice" => Self::Choice,
            "jump" => Self::Jump,
            "command" => Self::Command,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    /// Returns the lowercase tag for this kind (e.g., "narration").
    pub fn name(&self) -> &str {
        match self {
            Self::Line => "line",
            Self::Narration => "narration",
            Self::Choice => "choice",
            Self::Jump => "jump",
            Self::Command => "command",
            Self::Other(raw) => raw,
        }
    }
}

/// One authored dialogue unit: a single CSV data row.
///
/// Every field keeps the trimmed text of its cell. The mini-expression
/// fields (`condition`, `expression`, `effect`) are carried but never
/// evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueNode {
    pub id: String,
    pub next_id: String,
    pub speaker: String,
    pub scene: String,
    pub content: String,
    /// The raw `type` cell. Use [`DialogueNode::kind`] to interpret it.
    pub node_type: String,
    pub choices: String,
    pub target: String,
    pub condition: String,
    pub expression: String,
    pub fx: String,
    pub bg: String,
    pub effect: String,
    pub name_override: String,
    pub bgm: String,
}

impl DialogueNode {
    pub fn kind(&self) -> NodeKind {
        NodeKind::classify(&self.node_type)
    }

    pub fn is_choice(&self) -> bool {
        self.kind() == NodeKind::Choice
    }

    /// Option labels of a choice node, in authored order.
    pub fn choice_labels(&self) -> Vec<&str> {
        split_pipe(&self.choices)
    }

    /// Destination ids from the `target` column, parallel to the labels.
    pub fn target_ids(&self) -> Vec<&str> {
        split_pipe(&self.target)
    }

    /// The name shown above the line: `nameOverride` wins over `speaker`.
    pub fn display_name(&self) -> &str {
        if self.name_override.is_empty() {
            &self.speaker
        } else {
            &self.name_override
        }
    }

    /// Narration suppresses the speaker label; every other kind shows it.
    pub fn shows_speaker(&self) -> bool {
        self.kind() != NodeKind::Narration
    }

    /// The id linear traversal follows out of this node.
    ///
    /// Jump nodes use their single `target` entry and ignore `next_id`,
    /// unless the target cell is empty. Choice nodes have no linear
    /// successor; callers pick one of [`DialogueNode::target_ids`].
    pub fn linear_next(&self) -> Option<&str> {
        match self.kind() {
            NodeKind::Choice => None,
            NodeKind::Jump => Some(
                self.target_ids()
                    .first()
                    .copied()
                    .unwrap_or(self.next_id.as_str()),
            ),
            _ => Some(self.next_id.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: &str) -> DialogueNode {
        DialogueNode {
            id: "pre_0001".to_string(),
            next_id: "pre_0002".to_string(),
            speaker: "Lin".to_string(),
            node_type: kind.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(NodeKind::classify("Narration"), NodeKind::Narration);
        assert_eq!(NodeKind::classify(" CHOICE "), NodeKind::Choice);
        assert_eq!(NodeKind::classify("jump"), NodeKind::Jump);
        assert_eq!(NodeKind::classify("Command"), NodeKind::Command);
        assert_eq!(NodeKind::classify(""), NodeKind::Line);
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let kind = NodeKind::classify("Flashback");
        assert_eq!(kind, NodeKind::Other("Flashback".to_string()));
        assert_eq!(kind.name(), "Flashback");
    }

    #[test]
    fn eq_ignore_case_compares_lowercased() {
        assert!(eq_ignore_case("Narration", "NARRATION"));
        assert!(eq_ignore_case("ÉTÉ", "été"));
        assert!(!eq_ignore_case("line", "lines"));
        assert!(!eq_ignore_case("", "END"));
    }

    #[test]
    fn end_marker_any_case() {
        assert!(is_end_marker("END"));
        assert!(is_end_marker("end"));
        assert!(is_end_marker("End"));
        assert!(!is_end_marker("ending"));
        assert!(is_terminal(""));
        assert!(!is_terminal("pre_0002"));
    }

    #[test]
    fn split_pipe_trims_and_drops_empty() {
        assert_eq!(split_pipe(" a | b ||c|"), vec!["a", "b", "c"]);
        assert!(split_pipe("").is_empty());
        assert!(split_pipe(" | ").is_empty());
    }

    #[test]
    fn display_name_prefers_override() {
        let mut n = node("line");
        assert_eq!(n.display_name(), "Lin");
        n.name_override = "???".to_string();
        assert_eq!(n.display_name(), "???");
    }

    #[test]
    fn narration_hides_speaker() {
        assert!(!node("narration").shows_speaker());
        assert!(node("line").shows_speaker());
        assert!(node("command").shows_speaker());
        assert!(node("mystery").shows_speaker());
    }

    #[test]
    fn jump_overrides_next_id() {
        let mut n = node("jump");
        n.target = "pre_0100".to_string();
        assert_eq!(n.linear_next(), Some("pre_0100"));

        n.target.clear();
        assert_eq!(n.linear_next(), Some("pre_0002"));
    }

    #[test]
    fn choice_has_no_linear_next() {
        let mut n = node("choice");
        n.choices = "Stay|Leave".to_string();
        n.target = "a|b".to_string();
        assert_eq!(n.linear_next(), None);
        assert_eq!(n.choice_labels(), vec!["Stay", "Leave"]);
        assert_eq!(n.target_ids(), vec!["a", "b"]);
    }
}
