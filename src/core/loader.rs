/// Dialogue graph loading: column mapping, node construction, validation.

use rustc_hash::FxHashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::csv;
use crate::schema::node::{columns, is_end_marker, is_terminal, DialogueNode, NodeKind};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("story source has no data rows")]
    MalformedSource,
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    #[error("strict load rejected {} warning(s)", .0.len())]
    Strict(Vec<LoadWarning>),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Advisory problems found while loading. None of these stop a load
/// unless [`LoadOptions::strict`] is set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadWarning {
    /// `row` is the 1-based position in the parsed table (header is row 1).
    #[error("row {row}: empty id, skipped")]
    EmptyId { row: usize },
    #[error("id={id} next_id not found: {next_id}")]
    DanglingNext { id: String, next_id: String },
    #[error("id={id} target not found: {target}")]
    DanglingTarget { id: String, target: String },
    #[error("id={id} choice count ({choices}) != target count ({targets})")]
    ChoiceArity {
        id: String,
        choices: usize,
        targets: usize,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Treat any accumulated warning as a load failure.
    pub strict: bool,
}

impl LoadOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// Id-to-node mapping for one story source. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogueGraph {
    nodes: FxHashMap<String, DialogueNode>,
    /// Ids in source order.
    order: Vec<String>,
    warnings: Vec<LoadWarning>,
}

impl DialogueGraph {
    /// Parse and validate a story from CSV text with default options.
    pub fn parse_csv(input: &str) -> Result<DialogueGraph, LoadError> {
        load(input)
    }

    /// Read a UTF-8 CSV file and load it.
    pub fn load_from_path(path: &Path) -> Result<DialogueGraph, LoadError> {
        let contents = std::fs::read_to_string(path)?;
        let graph = load(&contents)?;
        info!(
            "loaded {} dialogue nodes from {}",
            graph.len(),
            path.display()
        );
        Ok(graph)
    }

    pub fn get(&self, id: &str) -> Option<&DialogueNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Node ids in the order they were authored.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Nodes in the order they were authored.
    pub fn nodes(&self) -> impl Iterator<Item = &DialogueNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    fn insert(&mut self, node: DialogueNode) -> Result<(), LoadError> {
        if self.nodes.contains_key(&node.id) {
            return Err(LoadError::DuplicateId(node.id));
        }
        self.order.push(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }
}

/// Load a story graph from CSV text.
pub fn load(input: &str) -> Result<DialogueGraph, LoadError> {
    load_with(input, &LoadOptions::default())
}

/// Load a story graph from CSV text with explicit options. A leading
/// byte-order mark is ignored.
pub fn load_with(input: &str, options: &LoadOptions) -> Result<DialogueGraph, LoadError> {
    let rows = csv::parse(input.strip_prefix('\u{feff}').unwrap_or(input));
    if rows.len() < 2 {
        return Err(LoadError::MalformedSource);
    }

    let header = ColumnMap::from_header(&rows[0]);
    let mut graph = DialogueGraph::default();

    for (index, row) in rows.iter().enumerate().skip(1) {
        let node = header.build_node(row);
        if node.id.is_empty() {
            let warning = LoadWarning::EmptyId { row: index + 1 };
            warn!("{}", warning);
            graph.warnings.push(warning);
            continue;
        }
        graph.insert(node)?;
    }

    let issues = validate(&graph);
    for issue in &issues {
        warn!("{}", issue);
    }
    graph.warnings.extend(issues);

    if options.strict && !graph.warnings.is_empty() {
        return Err(LoadError::Strict(graph.warnings));
    }

    Ok(graph)
}

/// Check references and choice arity across the whole node set.
pub fn validate(graph: &DialogueGraph) -> Vec<LoadWarning> {
    let mut issues = Vec::new();

    for node in graph.nodes() {
        if !is_terminal(&node.next_id) && !graph.contains(&node.next_id) {
            issues.push(LoadWarning::DanglingNext {
                id: node.id.clone(),
                next_id: node.next_id.clone(),
            });
        }

        for target in node.target_ids() {
            if !is_end_marker(target) && !graph.contains(target) {
                issues.push(LoadWarning::DanglingTarget {
                    id: node.id.clone(),
                    target: target.to_string(),
                });
            }
        }

        if node.kind() == NodeKind::Choice {
            let choices = node.choice_labels().len();
            let targets = node.target_ids().len();
            if choices != targets {
                issues.push(LoadWarning::ChoiceArity {
                    id: node.id.clone(),
                    choices,
                    targets,
                });
            }
        }
    }

    issues
}

/// Header name (lowercased) to column index.
struct ColumnMap {
    index: FxHashMap<String, usize>,
}

impl ColumnMap {
    fn from_header(header: &[String]) -> Self {
        let mut index = FxHashMap::default();
        for (i, name) in header.iter().enumerate() {
            // Later duplicates win.
            index.insert(name.trim().to_lowercase(), i);
        }
        Self { index }
    }

    fn get(&self, row: &[String], column: &str) -> String {
        self.index
            .get(&column.to_lowercase())
            .and_then(|&i| row.get(i))
            .map(|cell| cell.trim().to_string())
            .unwrap_or_default()
    }

    fn build_node(&self, row: &[String]) -> DialogueNode {
        DialogueNode {
            id: self.get(row, columns::ID),
            next_id: self.get(row, columns::NEXT_ID),
            speaker: self.get(row, columns::SPEAKER),
            scene: self.get(row, columns::SCENE),
            content: self.get(row, columns::CONTENT),
            node_type: self.get(row, columns::TYPE),
            choices: self.get(row, columns::CHOICES),
            target: self.get(row, columns::TARGET),
            condition: self.get(row, columns::CONDITION),
            expression: self.get(row, columns::EXPRESSION),
            fx: self.get(row, columns::FX),
            bg: self.get(row, columns::BG),
            effect: self.get(row, columns::EFFECT),
            name_override: self.get(row, columns::NAME_OVERRIDE),
            bgm: self.get(row, columns::BGM),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,next_id,speaker,scene,content,type,choices,target\n";

    fn story(body: &str) -> String {
        format!("{HEADER}{body}")
    }

    #[test]
    fn header_only_is_malformed() {
        assert!(matches!(load(HEADER), Err(LoadError::MalformedSource)));
        assert!(matches!(load(""), Err(LoadError::MalformedSource)));
    }

    #[test]
    fn loads_linear_story() {
        let graph = load(&story(
            "a,b,Lin,street,Hello.,line,,\nb,END,,street,The wind rose.,narration,,\n",
        ))
        .unwrap();
        assert_eq!(graph.len(), 2);
        assert!(graph.warnings().is_empty());
        let a = graph.get("a").unwrap();
        assert_eq!(a.speaker, "Lin");
        assert_eq!(a.content, "Hello.");
        assert_eq!(graph.get("b").unwrap().kind(), NodeKind::Narration);
    }

    #[test]
    fn fields_are_trimmed() {
        let graph = load(&story("  a , END , Lin ,,\" spaced \",LINE,,\n")).unwrap();
        let a = graph.get("a").unwrap();
        assert_eq!(a.next_id, "END");
        assert_eq!(a.speaker, "Lin");
        assert_eq!(a.content, "spaced");
        assert_eq!(a.node_type, "LINE");
    }

    #[test]
    fn duplicate_id_is_fatal() {
        let err = load(&story("a,END,,,,,,\nb,END,,,,,,\na,END,,,,,,\n")).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn empty_ids_skipped_without_duplicate_error() {
        let graph = load(&story(",x,,,,,,\n  ,y,,,,,,\na,END,,,,,,\n")).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(
            graph.warnings()[..2],
            [
                LoadWarning::EmptyId { row: 2 },
                LoadWarning::EmptyId { row: 3 }
            ]
        );
    }

    #[test]
    fn header_is_case_insensitive_and_unordered() {
        let graph = load("CONTENT,Next_ID,ID,NameOverride,extra\nHi,END,a,???,ignored\n").unwrap();
        let a = graph.get("a").unwrap();
        assert_eq!(a.content, "Hi");
        assert_eq!(a.next_id, "END");
        assert_eq!(a.name_override, "???");
        assert!(a.speaker.is_empty());
    }

    #[test]
    fn short_rows_yield_empty_fields() {
        let graph = load(&story("a\n")).unwrap();
        let a = graph.get("a").unwrap();
        assert!(a.next_id.is_empty());
        assert!(a.content.is_empty());
    }

    #[test]
    fn dangling_next_warns() {
        let graph = load(&story("a,ZZZ,,,,,,\n")).unwrap();
        assert_eq!(
            graph.warnings(),
            &[LoadWarning::DanglingNext {
                id: "a".to_string(),
                next_id: "ZZZ".to_string()
            }]
        );
    }

    #[test]
    fn end_marker_is_not_dangling() {
        let graph = load(&story("a,end,,,,jump,,End\n")).unwrap();
        assert!(graph.warnings().is_empty());
    }

    #[test]
    fn dangling_targets_warn_per_entry() {
        let graph = load(&story("a,,,,,choice,X|Y|Z,b| nope |END\nb,END,,,,,,\n")).unwrap();
        assert_eq!(
            graph.warnings(),
            &[LoadWarning::DanglingTarget {
                id: "a".to_string(),
                target: "nope".to_string()
            }]
        );
    }

    #[test]
    fn choice_arity() {
        let ok = load(&story("c,,,,,choice,X|Y,t1|t2\nt1,END,,,,,,\nt2,END,,,,,,\n")).unwrap();
        assert!(ok.warnings().is_empty());

        let bad = load(&story("c,,,,,Choice,X|Y,t1\nt1,END,,,,,,\n")).unwrap();
        assert_eq!(
            bad.warnings(),
            &[LoadWarning::ChoiceArity {
                id: "c".to_string(),
                choices: 2,
                targets: 1
            }]
        );
    }

    #[test]
    fn strict_mode_rejects_warnings() {
        let text = story("a,ZZZ,,,,,,\n");
        let err = load_with(&text, &LoadOptions::strict()).unwrap_err();
        assert!(matches!(err, LoadError::Strict(w) if w.len() == 1));

        let clean = story("a,END,,,,,,\n");
        assert!(load_with(&clean, &LoadOptions::strict()).is_ok());
    }

    #[test]
    fn ids_keep_source_order() {
        let graph = load(&story("c,END,,,,,,\na,END,,,,,,\nb,END,,,,,,\n")).unwrap();
        assert_eq!(graph.ids().collect::<Vec<_>>(), vec!["c", "a", "b"]);
    }

    #[test]
    fn leading_bom_is_ignored() {
        let graph = load("\u{feff}id,next_id\na,END\nb,END\n").unwrap();
        assert_eq!(graph.len(), 2);
        assert!(graph.warnings().is_empty());
        assert!(graph.contains("a"));
    }

    #[test]
    fn load_is_idempotent() {
        let text = story("a,b,Lin,,Hi,,,\nb,END,,,,narration,,\n");
        assert_eq!(load(&text).unwrap(), load(&text).unwrap());
    }
}
