// tests/executor_tests.rs

use std::collections::HashMap;

use tally_lang::cli::json_to_value;
use tally_lang::executor::EvalError;
use tally_lang::ops;
use tally_lang::value::Value;
use tally_lang::{CompiledQuery, parse};

fn data(json: &str) -> Value {
    json_to_value(serde_json::from_str(json).expect("test data should be valid JSON"))
}

fn compiled(source: &str) -> CompiledQuery {
    parse(source).expect("program should parse")
}

fn run(source: &str, json: &str) -> HashMap<String, Value> {
    compiled(source).execute(&data(json)).expect("execution should succeed")
}

fn result(source: &str, json: &str, name: &str) -> Value {
    run(source, json)[name].clone()
}

// ============================================================================
// Testable properties
// ============================================================================

#[test]
fn test_round_trip_select_star() {
    let json = r#"{"items": [{"a": 1}, {"a": 2}, {"a": 3}]}"#;
    let value = result("USE items QUERY all SELECT * RETURN", json, "all");
    match value {
        Value::Array(rows) => {
            assert_eq!(rows.len(), 3);
            assert_eq!(rows[0].field("a"), Value::Integer(1));
            assert_eq!(rows[2].field("a"), Value::Integer(3));
        }
        other => panic!("expected array, got {:?}", other),
    }
}

#[test]
fn test_parse_is_idempotent() {
    let source = "USE items QUERY n COUNT SELECT * RETURN";
    let json = r#"{"items": [{"a": 1}, {"a": 2}]}"#;
    let first = compiled(source).execute(&data(json)).unwrap();
    let second = compiled(source).execute(&data(json)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_axis_product_result_tree() {
    let source = "USE top.[a,b].[c,d].rows QUERY n COUNT SELECT * RETURN";
    let json = r#"{"top": {
        "a": {"c": {"rows": [{"v": 1}]},           "d": {"rows": [{"v": 1}, {"v": 2}]}},
        "b": {"c": {"rows": [{"v": 1}, {"v": 2}, {"v": 3}]}, "d": {"rows": []}}
    }}"#;
    let value = result(source, json, "n");
    assert_eq!(value.field("a").field("c"), Value::Integer(1));
    assert_eq!(value.field("a").field("d"), Value::Integer(2));
    assert_eq!(value.field("b").field("c"), Value::Integer(3));
    assert_eq!(value.field("b").field("d"), Value::Integer(0));
}

#[test]
fn test_aggregate_boundaries_over_empty_working_set() {
    let json = r#"{"items": []}"#;
    let source = |op: &str| format!("USE items QUERY q SELECT * {} RETURN", op);

    for op in [
        "SUM", "AVERAGE", "MEDIAN", "MIN", "MAX", "VARIANCE", "RANGE",
    ] {
        assert_eq!(
            result(&source(op), json, "q"),
            Value::Integer(0),
            "{} over empty set",
            op
        );
    }
    assert_eq!(result(&source("UNIQUE"), json, "q"), Value::Array(vec![]));
    assert_eq!(result(&source("MOST_FREQUENT"), json, "q"), Value::Null);
    assert_eq!(result(&source("LEAST_FREQUENT"), json, "q"), Value::Null);
    assert_eq!(
        result("USE items QUERY q COUNT SELECT * RETURN", json, "q"),
        Value::Integer(0)
    );
}

#[test]
fn test_divide_by_zero_returns_zero() {
    // $b sums an empty selection, so it holds 0
    let source = "USE items QUERY q \
                      SELECT a $x SUM \
                      SELECT missing $y SUM \
                      DIVIDE $x $y \
                  RETURN";
    let json = r#"{"items": [{"a": 5}]}"#;
    assert_eq!(result(source, json, "q"), Value::Integer(0));
}

// ============================================================================
// End-to-end query scenarios
// ============================================================================

#[test]
fn test_scenario_most_frequent_category() {
    let source = "USE products QUERY c SELECT cat $m MOST_FREQUENT RETURN";
    let json = r#"{"products": [{"cat": "A"}, {"cat": "A"}, {"cat": "B"}]}"#;
    assert_eq!(result(source, json, "c"), Value::String("A".to_string()));
}

#[test]
fn test_scenario_mean_via_variables() {
    let source = "USE products QUERY mean \
                      SELECT p \
                      $t SUM \
                      $n COUNT SELECT p \
                      DIVIDE $t $n \
                  RETURN";
    let json = r#"{"products": [{"p": 10}, {"p": 20}, {"p": 30}, {"p": 40}]}"#;
    assert_eq!(result(source, json, "mean"), Value::Integer(25));
}

#[test]
fn test_scenario_percent_of() {
    let source = "USE plays QUERY pct \
                      PERCENT_OF SELECT * WHERE (r = \"P\" & b = \"Y\"), \
                                 SELECT * WHERE (r = \"P\") \
                  RETURN";
    let json = r#"{"plays": [
        {"r": "P", "b": "Y"},
        {"r": "P", "b": "N"},
        {"r": "R", "b": "N"}
    ]}"#;
    assert_eq!(result(source, json, "pct"), Value::Integer(50));
}

#[test]
fn test_scenario_per_axis_counts() {
    let source = "USE y.[w1,w2].plays QUERY n COUNT SELECT * RETURN";
    let json = r#"{"y": {
        "w1": {"plays": [{"v": 1}, {"v": 2}]},
        "w2": {"plays": [{"v": 1}, {"v": 2}, {"v": 3}]}
    }}"#;
    let value = result(source, json, "n");
    assert_eq!(value.field("w1"), Value::Integer(2));
    assert_eq!(value.field("w2"), Value::Integer(3));
}

#[test]
fn test_scenario_contains() {
    let json = r#"{"plays": [
        {"tags": ["a", "b"]},
        {"tags": ["a"]},
        {"note": "no tags field"}
    ]}"#;
    let count = |cond: &str| {
        result(
            &format!("USE plays QUERY n COUNT SELECT * WHERE ({}) RETURN", cond),
            json,
            "n",
        )
    };

    assert_eq!(count("tags CONTAINS \"a\""), Value::Integer(2));
    assert_eq!(count("tags CONTAINS \"z\""), Value::Integer(0));
    // CONTAINS is always false on a non-array field, NOT_CONTAINS always true
    assert_eq!(count("note CONTAINS \"no\""), Value::Integer(0));
    assert_eq!(count("tags NOT_CONTAINS \"b\""), Value::Integer(2));
}

// ============================================================================
// SELECT semantics
// ============================================================================

#[test]
fn test_single_field_projection() {
    let source = "USE products QUERY p SELECT p RETURN";
    let json = r#"{"products": [{"p": 10}, {"p": 20}]}"#;
    assert_eq!(
        result(source, json, "p"),
        Value::Array(vec![Value::Integer(10), Value::Integer(20)])
    );
}

#[test]
fn test_multi_field_projection_yields_maps() {
    let source = "USE products QUERY rows SELECT [p, q] RETURN";
    let json = r#"{"products": [{"p": 1, "q": 2, "r": 3}]}"#;
    match result(source, json, "rows") {
        Value::Array(rows) => {
            assert_eq!(rows[0].field("p"), Value::Integer(1));
            assert_eq!(rows[0].field("q"), Value::Integer(2));
            assert_eq!(rows[0].field("r"), Value::Null);
        }
        other => panic!("expected array, got {:?}", other),
    }
}

#[test]
fn test_non_scalar_field_serializes_to_string() {
    let source = "USE items QUERY v SELECT nested RETURN";
    let json = r#"{"items": [{"nested": {"k": 1}}]}"#;
    assert_eq!(
        result(source, json, "v"),
        Value::Array(vec![Value::String("{\"k\":1}".to_string())])
    );
}

#[test]
fn test_each_flattens_array_fields() {
    let source = "USE plays QUERY t SELECT EACH tags RETURN";
    let json = r#"{"plays": [{"tags": ["a", "b"]}, {"tags": ["c"]}]}"#;
    assert_eq!(
        result(source, json, "t"),
        Value::Array(vec![
            Value::String("a".to_string()),
            Value::String("b".to_string()),
            Value::String("c".to_string()),
        ])
    );
}

#[test]
fn test_select_resets_working_set() {
    let source = "USE items QUERY n \
                      SELECT a WHERE (a > 10) \
                      SELECT a \
                      SUM \
                  RETURN";
    let json = r#"{"items": [{"a": 5}, {"a": 20}]}"#;
    // The second SELECT starts over from the binding, not from the filtered set
    assert_eq!(result(source, json, "n"), Value::Integer(25));
}

#[test]
fn test_count_does_not_disturb_working_set() {
    let source = "USE items QUERY s \
                      SELECT a \
                      $n COUNT SELECT a WHERE (a > 10) \
                      SUM \
                  RETURN";
    let json = r#"{"items": [{"a": 5}, {"a": 20}]}"#;
    // SUM still sees both rows even though COUNT's SELECT filtered
    assert_eq!(result(source, json, "s"), Value::Integer(25));
}

#[test]
fn test_where_condition_with_variable() {
    let source = "USE items \
                  QUERY avg SELECT a $threshold AVERAGE RETURN \
                  QUERY above SELECT a WHERE (a > $threshold) RETURN";
    let json = r#"{"items": [{"a": 10}, {"a": 20}, {"a": 30}]}"#;
    assert_eq!(
        result(source, json, "above"),
        Value::Array(vec![Value::Integer(30)])
    );
}

// ============================================================================
// Aggregates
// ============================================================================

#[test]
fn test_median_odd_and_even() {
    let json_odd = r#"{"items": [{"a": 30}, {"a": 10}, {"a": 20}]}"#;
    let json_even = r#"{"items": [{"a": 40}, {"a": 10}, {"a": 30}, {"a": 20}]}"#;
    let source = "USE items QUERY m SELECT a MEDIAN RETURN";
    assert_eq!(result(source, json_odd, "m"), Value::Integer(20));
    assert_eq!(result(source, json_even, "m"), Value::Integer(25));
}

#[test]
fn test_min_max_range() {
    let json = r#"{"items": [{"a": 12}, {"a": 3}, {"a": 41}]}"#;
    assert_eq!(
        result("USE items QUERY q SELECT a MIN RETURN", json, "q"),
        Value::Integer(3)
    );
    assert_eq!(
        result("USE items QUERY q SELECT a MAX RETURN", json, "q"),
        Value::Integer(41)
    );
    assert_eq!(
        result("USE items QUERY q SELECT a RANGE RETURN", json, "q"),
        Value::Integer(38)
    );
}

#[test]
fn test_variance_uses_sample_divisor() {
    // Sample variance of [1, 3] is ((1-2)^2 + (3-2)^2) / (2-1) = 2
    let json = r#"{"items": [{"a": 1}, {"a": 3}]}"#;
    assert_eq!(
        result("USE items QUERY v SELECT a VARIANCE RETURN", json, "v"),
        Value::Integer(2)
    );
    // Fewer than two values: variance is 0, not NaN
    let single = r#"{"items": [{"a": 7}]}"#;
    assert_eq!(
        result("USE items QUERY v SELECT a VARIANCE RETURN", single, "v"),
        Value::Integer(0)
    );
}

#[test]
fn test_standard_deviation_is_sqrt_of_variance() {
    let json = r#"{"items": [{"a": 1}, {"a": 3}]}"#;
    let value = result(
        "USE items QUERY s SELECT a STANDARD_DEVIATION RETURN",
        json,
        "s",
    );
    let n = value.as_float().expect("numeric result");
    assert!((n - 2f64.sqrt()).abs() < 1e-12);
}

#[test]
fn test_sum_coerces_non_numeric_to_zero() {
    let json = r#"{"items": [{"a": 10}, {"a": "text"}, {"a": true}, {"a": 5}]}"#;
    assert_eq!(
        result("USE items QUERY s SELECT a SUM RETURN", json, "s"),
        Value::Integer(15)
    );
}

#[test]
fn test_unique_keeps_first_seen_order() {
    let json = r#"{"items": [{"c": "A"}, {"x": 1}, {"c": "B"}, {"c": "A"}]}"#;
    assert_eq!(
        result("USE items QUERY u SELECT c UNIQUE RETURN", json, "u"),
        Value::Array(vec![
            Value::String("A".to_string()),
            Value::Null,
            Value::String("B".to_string()),
        ])
    );
}

#[test]
fn test_frequency_excludes_nulls_and_breaks_ties_first_seen() {
    // c values: B, A, null, A, B -> counts B:2 A:2, null excluded
    let json = r#"{"items": [{"c": "B"}, {"c": "A"}, {"x": 1}, {"c": "A"}, {"c": "B"}]}"#;
    assert_eq!(
        result(
            "USE items QUERY m SELECT c MOST_FREQUENT RETURN",
            json,
            "m"
        ),
        Value::String("B".to_string())
    );

    // c values: A, A, B, C, C -> least frequent is B
    let json = r#"{"items": [{"c": "A"}, {"c": "A"}, {"c": "B"}, {"c": "C"}, {"c": "C"}]}"#;
    assert_eq!(
        result(
            "USE items QUERY l SELECT c LEAST_FREQUENT RETURN",
            json,
            "l"
        ),
        Value::String("B".to_string())
    );
}

#[test]
fn test_percent_of_default_denominator() {
    let source = "USE plays QUERY pct PERCENT_OF SELECT * WHERE (r = \"P\") RETURN";
    let json = r#"{"plays": [{"r": "P"}, {"r": "P"}, {"r": "R"}, {"r": "R"}]}"#;
    assert_eq!(result(source, json, "pct"), Value::Integer(50));
}

#[test]
fn test_integer_arithmetic_overflow_does_not_panic() {
    // Products and differences outside i64 range fall back to the
    // decimal/float path instead of overflowing
    let product = ops::multiply(&Value::Integer(i64::MAX), &Value::Integer(2));
    assert!(matches!(product, Value::Float(_)));

    let difference = ops::subtract(&Value::Integer(i64::MIN), &Value::Integer(1));
    assert!(matches!(difference, Value::Float(_)));
}

#[test]
fn test_subtract_and_multiply() {
    let source = "USE items QUERY q \
                      SELECT a $max MAX \
                      SELECT a $min MIN \
                      SUBTRACT $max $min \
                      $spread SUBTRACT $max $min \
                      MULTIPLY $spread $spread \
                  RETURN";
    let json = r#"{"items": [{"a": 3}, {"a": 10}]}"#;
    assert_eq!(result(source, json, "q"), Value::Integer(49));
}

// ============================================================================
// Variables and errors
// ============================================================================

#[test]
fn test_variables_are_global_across_blocks() {
    let source = "USE items \
                  QUERY first SELECT a $t SUM RETURN \
                  QUERY second $n COUNT SELECT a DIVIDE $t $n RETURN";
    let json = r#"{"items": [{"a": 10}, {"a": 30}]}"#;
    let results = run(source, json);
    assert_eq!(results["second"], Value::Integer(20));
}

#[test]
fn test_unresolved_variable_is_fatal() {
    let source = "USE items QUERY q DIVIDE $nope $nada RETURN";
    let err = compiled(source)
        .execute(&data(r#"{"items": []}"#))
        .unwrap_err();
    assert_eq!(err, EvalError::UnresolvedVariable("$nope".to_string()));
}

#[test]
fn test_ambiguous_aggregate_is_fatal() {
    let source = "USE items QUERY q SELECT [a, b] SUM RETURN";
    let err = compiled(source)
        .execute(&data(r#"{"items": [{"a": 1, "b": 2}]}"#))
        .unwrap_err();
    assert!(matches!(err, EvalError::AmbiguousAggregate { operator: "SUM", .. }));
}

#[test]
fn test_error_aborts_whole_execution() {
    // The first query would succeed on its own; the failing second query
    // must abort the call without a partial result map.
    let source = "USE items \
                  QUERY good COUNT SELECT * RETURN \
                  QUERY bad DIVIDE $missing $also_missing RETURN";
    let result = compiled(source).execute(&data(r#"{"items": [{"a": 1}]}"#));
    assert!(result.is_err());
}

#[test]
fn test_duplicate_query_names_last_write_wins() {
    let source = "USE items \
                  QUERY n COUNT SELECT * RETURN \
                  QUERY n SELECT a SUM RETURN";
    let json = r#"{"items": [{"a": 10}, {"a": 20}]}"#;
    let results = run(source, json);
    assert_eq!(results.len(), 1);
    assert_eq!(results["n"], Value::Integer(30));
}

#[test]
fn test_missing_data_degrades_to_empty_results() {
    let source = "USE absent.path QUERY n COUNT SELECT * RETURN";
    assert_eq!(
        result(source, r#"{"something": "else"}"#, "n"),
        Value::Integer(0)
    );
}

// ============================================================================
// Public API surface
// ============================================================================

#[test]
fn test_expected_paths_in_source_order() {
    let compiled = compiled("USE a.b USE y.[w1,w2].plays QUERY q SELECT * RETURN");
    assert_eq!(compiled.expected_paths(), vec!["a.b", "y.[w1,w2].plays"]);
}

#[test]
fn test_compiled_query_is_reusable() {
    let compiled = compiled("USE items QUERY n COUNT SELECT * RETURN");
    let one = compiled.execute(&data(r#"{"items": [{"a": 1}]}"#)).unwrap();
    let two = compiled
        .execute(&data(r#"{"items": [{"a": 1}, {"a": 2}]}"#))
        .unwrap();
    assert_eq!(one["n"], Value::Integer(1));
    assert_eq!(two["n"], Value::Integer(2));
}
