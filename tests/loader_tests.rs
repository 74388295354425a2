/// Story loading integration tests: fixtures through parser and validator.

use story_engine::core::csv;
use story_engine::core::loader::{load, load_with, DialogueGraph, LoadError, LoadOptions, LoadWarning};
use story_engine::schema::node::NodeKind;
use std::path::Path;

#[test]
fn sample_story_loads_cleanly() {
    let graph = DialogueGraph::load_from_path(Path::new("tests/fixtures/sample_story.csv")).unwrap();
    assert_eq!(graph.len(), 9);
    assert!(
        graph.warnings().is_empty(),
        "unexpected warnings: {:?}",
        graph.warnings()
    );

    let ids: Vec<&str> = graph.ids().collect();
    assert_eq!(ids.first(), Some(&"pre_0001"));
    assert_eq!(ids.last(), Some(&"pre_0030"));
}

#[test]
fn sample_story_fields() {
    let graph = DialogueGraph::load_from_path(Path::new("tests/fixtures/sample_story.csv")).unwrap();

    let opening = graph.get("pre_0001").unwrap();
    assert_eq!(opening.kind(), NodeKind::Narration);
    assert_eq!(opening.content, "The tide came in slow, grey and patient.");
    assert_eq!(opening.bg, "harbor_dawn");
    assert_eq!(opening.bgm, "tide");

    let quoted = graph.get("pre_0002").unwrap();
    assert_eq!(quoted.content, "\"You're late,\" she said.");
    assert_eq!(quoted.expression, "smile");

    let ferryman = graph.get("pre_0003").unwrap();
    assert_eq!(ferryman.display_name(), "???");

    let deck = graph.get("pre_0010").unwrap();
    assert_eq!(deck.condition, "trust>=1");
    assert_eq!(deck.effect, "trust+=1");
    assert_eq!(deck.fx, "shake");

    let multiline = graph.get("pre_0011").unwrap();
    assert_eq!(multiline.content, "We made it.\nSomehow.");

    let choice = graph.get("pre_0004").unwrap();
    assert_eq!(choice.choice_labels(), vec!["Board", "Stay ashore"]);
    assert_eq!(choice.target_ids(), vec!["pre_0010", "pre_0020"]);

    assert_eq!(graph.get("pre_0030").unwrap().kind(), NodeKind::Command);
}

#[test]
fn broken_fixture_collects_warnings_in_order() {
    let graph = DialogueGraph::load_from_path(Path::new("tests/fixtures/broken_links.csv")).unwrap();
    assert_eq!(graph.len(), 2);
    assert_eq!(
        graph.warnings(),
        &[
            LoadWarning::EmptyId { row: 4 },
            LoadWarning::DanglingNext {
                id: "a".to_string(),
                next_id: "ZZZ".to_string(),
            },
            LoadWarning::ChoiceArity {
                id: "b".to_string(),
                choices: 2,
                targets: 1,
            },
        ]
    );
}

#[test]
fn broken_fixture_fails_strict() {
    let text = std::fs::read_to_string("tests/fixtures/broken_links.csv").unwrap();
    match load_with(&text, &LoadOptions::strict()) {
        Err(LoadError::Strict(warnings)) => assert_eq!(warnings.len(), 3),
        other => panic!("expected strict failure, got {:?}", other),
    }
}

#[test]
fn missing_file_is_io_error() {
    let err = DialogueGraph::load_from_path(Path::new("tests/fixtures/does_not_exist.csv")).unwrap_err();
    assert!(matches!(err, LoadError::Io(_)));
}

#[test]
fn node_count_matches_unique_nonempty_ids() {
    let text = "id,next_id\n\
                a,END\n\
                ,END\n\
                b,END\n\
                \x20 ,END\n\
                c,END\n";
    let rows = csv::parse(text);
    let expected = rows[1..]
        .iter()
        .filter(|row| !row[0].trim().is_empty())
        .count();
    assert_eq!(load(text).unwrap().len(), expected);
}

#[test]
fn choice_arity_warning_tracks_target_count() {
    let matching = "id,type,choices,target\nc,choice,X|Y,T1|T2\nT1,,,\nT2,,,\n";
    assert!(load(matching).unwrap().warnings().is_empty());

    let short = "id,type,choices,target\nc,choice,X|Y,T1\nT1,,,\nT2,,,\n";
    assert!(load(short)
        .unwrap()
        .warnings()
        .iter()
        .any(|w| matches!(w, LoadWarning::ChoiceArity { choices: 2, targets: 1, .. })));
}

#[test]
fn loading_twice_gives_equal_graphs() {
    let text = std::fs::read_to_string("tests/fixtures/sample_story.csv").unwrap();
    let first = load(&text).unwrap();
    let second = load(&text).unwrap();
    assert_eq!(first, second);
}

#[test]
fn bundled_story_data_loads() {
    for path in [
        "story_data/prologue.csv",
        "story_data/END_BE_failed.csv",
        "story_data/END_TE_wind.csv",
    ] {
        let graph = DialogueGraph::load_from_path(Path::new(path)).unwrap();
        assert!(!graph.is_empty(), "{} is empty", path);
        assert!(
            graph.warnings().is_empty(),
            "{} has warnings: {:?}",
            path,
            graph.warnings()
        );
    }
}
