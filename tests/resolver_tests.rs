// tests/resolver_tests.rs

use tally_lang::ast::FieldSpec;
use tally_lang::cli::json_to_value;
use tally_lang::lexer::Lexer;
use tally_lang::parser::Parser;
use tally_lang::resolver::{ContextTree, resolve};
use tally_lang::value::Value;

fn data(json: &str) -> Value {
    json_to_value(serde_json::from_str(json).expect("test data should be valid JSON"))
}

fn resolve_for(source: &str, json: &str) -> ContextTree {
    let program = Parser::new(Lexer::new(source).tokenize())
        .parse_program()
        .expect("program should parse");
    resolve(&program.uses, &data(json))
}

// ============================================================================
// Axis collection and leaf enumeration
// ============================================================================

#[test]
fn test_no_axes_single_leaf() {
    let tree = resolve_for("USE products", r#"{"products": [{"p": 1}]}"#);
    assert!(tree.axes.is_empty());
    assert_eq!(tree.leaves.len(), 1);
    assert!(tree.leaves[0].choices.is_empty());
}

#[test]
fn test_leaf_count_is_axis_product() {
    let tree = resolve_for(
        "USE a.[x,y].rows\nUSE b.[p,q,r].rows2",
        r#"{"a": {}, "b": {}}"#,
    );
    assert_eq!(tree.axes.len(), 2);
    assert_eq!(tree.leaves.len(), 6);
}

#[test]
fn test_leaves_follow_axis_order() {
    let tree = resolve_for("USE y.[w1,w2].plays", r#"{"y": {}}"#);
    let choices: Vec<&[String]> = tree.leaves.iter().map(|l| l.choices.as_slice()).collect();
    assert_eq!(choices[0], ["w1".to_string()]);
    assert_eq!(choices[1], ["w2".to_string()]);
}

#[test]
fn test_identical_axes_collapse() {
    // Same position, same alternatives: one shared axis, two leaves
    let tree = resolve_for(
        "USE y2024.[w1,w2].offense\nUSE y2024.[w1,w2].defense",
        r#"{"y2024": {"w1": {"offense": [], "defense": []},
                     "w2": {"offense": [], "defense": []}}}"#,
    );
    assert_eq!(tree.axes.len(), 1);
    assert_eq!(tree.leaves.len(), 2);
}

#[test]
fn test_differing_axes_cross_product() {
    let tree = resolve_for(
        "USE y.[w1,w2].a\nUSE y.[w3,w4].b",
        r#"{"y": {}}"#,
    );
    assert_eq!(tree.axes.len(), 2);
    assert_eq!(tree.leaves.len(), 4);
}

// ============================================================================
// Bindings
// ============================================================================

#[test]
fn test_binding_keyed_by_final_segment() {
    let tree = resolve_for("USE products", r#"{"products": [{"p": 1}, {"p": 2}]}"#);
    let binding = &tree.leaves[0].binding;
    assert_eq!(binding.entries.len(), 1);
    assert_eq!(binding.entries[0].name, "products");
    assert_eq!(binding.entries[0].rows.len(), 2);
}

#[test]
fn test_field_set_projects_records() {
    let tree = resolve_for(
        "USE games.plays.[down,yards]",
        r#"{"games": {"plays": [{"down": 1, "yards": 5, "extra": true}]}}"#,
    );
    let binding = &tree.leaves[0].binding;
    // One entry per field-set name, all sharing the projected rows
    assert_eq!(binding.entries.len(), 2);
    let row = &binding.entries[0].rows[0];
    assert_eq!(row.field("down"), Value::Integer(1));
    assert_eq!(row.field("yards"), Value::Integer(5));
    assert_eq!(row.field("extra"), Value::Null);
}

#[test]
fn test_single_segment_axis_binds_by_chosen_alternative() {
    // With no preceding segment the bracketed list is an axis, and each
    // leaf's binding is keyed by its own chosen alternative
    let tree = resolve_for(
        "USE [east,west]",
        r#"{"east": [{"v": 1}], "west": [{"v": 2}, {"v": 3}]}"#,
    );
    assert_eq!(tree.axes.len(), 1);
    assert_eq!(tree.leaves[0].binding.entries[0].name, "east");
    assert_eq!(tree.leaves[1].binding.entries[0].name, "west");
    assert_eq!(tree.leaves[1].binding.entries[0].rows.len(), 2);
}

#[test]
fn test_missing_path_yields_empty_binding() {
    let tree = resolve_for("USE absent.path", r#"{"products": []}"#);
    assert!(tree.leaves[0].binding.entries.is_empty());
}

#[test]
fn test_missing_alternative_is_soft_per_leaf() {
    // w2 doesn't exist: its leaf gets an empty binding, w1 still resolves
    let tree = resolve_for(
        "USE y.[w1,w2].plays",
        r#"{"y": {"w1": {"plays": [{"r": 1}]}}}"#,
    );
    assert_eq!(tree.leaves[0].binding.entries.len(), 1);
    assert!(tree.leaves[1].binding.entries.is_empty());
}

#[test]
fn test_single_record_target_binds_as_one_row() {
    let tree = resolve_for("USE config", r#"{"config": {"limit": 10}}"#);
    let binding = &tree.leaves[0].binding;
    assert_eq!(binding.entries[0].rows.len(), 1);
    assert!(binding.entries[0].rows[0].is_object());
}

#[test]
fn test_later_use_wins_for_same_name() {
    let tree = resolve_for(
        "USE old.plays\nUSE new.plays",
        r#"{"old": {"plays": [{"v": 1}]}, "new": {"plays": [{"v": 2}, {"v": 3}]}}"#,
    );
    let binding = &tree.leaves[0].binding;
    assert_eq!(binding.entries.len(), 1);
    assert_eq!(binding.entries[0].rows.len(), 2);
}

// ============================================================================
// Binding resolution for SELECT
// ============================================================================

#[test]
fn test_resolve_exact_name_match() {
    let tree = resolve_for(
        "USE a.rows\nUSE b.other",
        r#"{"a": {"rows": [{"x": 1}]}, "b": {"other": [{"x": 2}]}}"#,
    );
    let binding = &tree.leaves[0].binding;
    let rows = binding.resolve(&FieldSpec::Single("other".to_string()));
    assert_eq!(rows[0].field("x"), Value::Integer(2));
}

#[test]
fn test_resolve_prefers_earliest_use_exposing_field() {
    let tree = resolve_for(
        "USE a.first\nUSE b.second",
        r#"{"a": {"first": [{"only_here": 1}]},
            "b": {"second": [{"shared": 2}]}}"#,
    );
    let binding = &tree.leaves[0].binding;
    let rows = binding.resolve(&FieldSpec::Single("shared".to_string()));
    assert_eq!(rows[0].field("shared"), Value::Integer(2));
}

#[test]
fn test_resolve_star_uses_earliest_declaration() {
    let tree = resolve_for(
        "USE a.first\nUSE b.second",
        r#"{"a": {"first": [{"v": 1}]}, "b": {"second": [{"v": 2}]}}"#,
    );
    let binding = &tree.leaves[0].binding;
    let rows = binding.resolve(&FieldSpec::All);
    assert_eq!(rows[0].field("v"), Value::Integer(1));
}

#[test]
fn test_resolve_unknown_field_is_empty() {
    let tree = resolve_for("USE products", r#"{"products": [{"p": 1}]}"#);
    let rows = tree.leaves[0]
        .binding
        .resolve(&FieldSpec::Single("nope".to_string()));
    assert!(rows.is_empty());
}
