//! End-to-end CLR scenarios against the public API: parsing a CL document,
//! evaluating it, and exporting the result.

use pretty_assertions::assert_eq;
use recordlang::{parse_cl, Value};

fn export_of(src: &str) -> serde_json::Value {
    parse_cl(src).expect("parse").export().expect("export")
}

// ============================================================================
// CONCRETE SCENARIOS (spec.md §8)
// ============================================================================

#[test]
fn empty_record_exports_empty_object() {
    assert_eq!(export_of("{}"), serde_json::json!({}));
}

#[test]
fn arithmetic_precedence_power_over_times_over_plus() {
    // 1 + ((2 ** 3) * 3) = 1 + 24 = 25
    assert_eq!(
        export_of("{x = 1 + 2 ** 3 * 3}"),
        serde_json::json!({"x": 25})
    );
}

#[test]
fn parenthesized_subtraction_then_power() {
    assert_eq!(export_of("{x = (3 - 1) ** 3}"), serde_json::json!({"x": 8}));
}

#[test]
fn if_picks_the_true_branch() {
    assert_eq!(
        export_of("{x = true, y = if x then 5 else 10}"),
        serde_json::json!({"x": true, "y": 5})
    );
}

#[test]
fn nested_field_access_resolves_in_the_accessed_records_scope() {
    let doc = r#"{
        x = { a = 1, b = 3 * a, c = { d = 9 } },
        y = x.a,
        z = x.c.d
    }"#;
    assert_eq!(
        export_of(doc),
        serde_json::json!({
            "x": {"a": 1, "b": 3, "c": {"d": 9}},
            "y": 1,
            "z": 9,
        })
    );
}

#[test]
fn factorial_through_call_recursion() {
    let doc = r#"{
        fact = { result = if n <= 1 then 1 else n * fact(n=n-1, fact=fact).result }
        f0 = fact(n=0, fact=fact).result
        f1 = fact(n=1, fact=fact).result
        f2 = fact(n=2, fact=fact).result
        f3 = fact(n=3, fact=fact).result
        f10 = fact(n=10, fact=fact).result
    }"#;
    assert_eq!(
        export_of(doc),
        serde_json::json!({"f0": 1, "f1": 1, "f2": 2, "f3": 6, "f10": 3628800})
    );
}

#[test]
fn fibonacci_through_call_recursion_is_one_based() {
    let doc = r#"{
        fibo = { result = if n <= 1 then 1 else fibo(n=n-1, fibo=fibo).result + fibo(n=n-2, fibo=fibo).result }
        f10 = fibo(n=10, fibo=fibo).result
    }"#;
    assert_eq!(export_of(doc), serde_json::json!({"f10": 89}));
}

#[test]
fn list_and_matrix_access() {
    assert_eq!(
        export_of("{x = [[1,2,3],[10,20,30]][1][0]}"),
        serde_json::json!({"x": 10})
    );
}

// ============================================================================
// CLR INVARIANTS (spec.md §8)
// ============================================================================

#[test]
fn field_memoization_evaluates_the_expression_at_most_once() {
    let record = parse_cl("{x = 1 + 1}").expect("parse");
    let first = record.get("x").expect("first eval");
    let second = record.get("x").expect("second eval");
    assert_eq!(first, second);
    assert_eq!(first, Value::Int(2));
}

#[test]
fn merge_shadowing_prefers_the_right_hand_side() {
    let a = parse_cl("{x = 1, y = 2}").expect("parse a");
    let b = parse_cl("{y = 20, z = 30}").expect("parse b");
    let merged = &*a + &*b;
    assert_eq!(merged.get("x"), Ok(Value::Int(1)));
    assert_eq!(merged.get("y"), Ok(Value::Int(20)));
    assert_eq!(merged.get("z"), Ok(Value::Int(30)));
}

#[test]
fn call_is_equivalent_to_merging_a_record_of_immediates() {
    let direct = export_of("{f = {x = 1, y = x + 1}, out = f(x=10).y}");
    let merged = export_of("{f = {x = 1, y = x + 1}, g = f + {x = 10}, out = g.y}");
    assert_eq!(direct, merged);
}
