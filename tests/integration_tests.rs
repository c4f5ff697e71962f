//! Integration tests for datatpl evaluation

use datatpl::{
    coerce, evaluate_as, options::DEFAULT_MAX_DEPTH, EvalError, EvalOptions, Evaluator, Expression, Properties, PropertyMap,
    TypeKind, Value,
};
use pretty_assertions::assert_eq;
use rayon::prelude::*;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

/// Helper to build a property bag from pairs
fn props(entries: &[(&str, Value)]) -> PropertyMap {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Property bag that records every name looked up
struct RecordingProperties {
    inner: PropertyMap,
    lookups: RefCell<Vec<String>>,
}

impl RecordingProperties {
    fn new(inner: PropertyMap) -> Self {
        Self {
            inner,
            lookups: RefCell::new(Vec::new()),
        }
    }

    fn looked_up(&self, name: &str) -> bool {
        self.lookups.borrow().iter().any(|n| n == name)
    }
}

impl Properties for RecordingProperties {
    fn get_property(&self, name: &str) -> Option<&Value> {
        self.lookups.borrow_mut().push(name.to_string());
        self.inner.get(name)
    }
}

fn all_value_kinds() -> Vec<Value> {
    let mut map = HashMap::new();
    map.insert("foo".to_string(), Value::Float(4.0));
    vec![
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::UInt(32),
        Value::Int(-16),
        Value::Float(3.145),
        Value::from("test"),
        Value::from(""),
        Value::from(vec![Value::from("foo"), Value::Float(4.0)]),
        Value::List(vec![]),
        Value::Map(map),
        Value::Map(HashMap::new()),
    ]
}

#[test]
fn test_literal_evaluation_matches_direct_coercion() {
    let empty = PropertyMap::new();
    for value in all_value_kinds() {
        let expr = Expression::literal(value.clone());
        assert_eq!(evaluate_as::<String, _>(&expr, &empty), coerce::<String>(&value));
        assert_eq!(evaluate_as::<f64, _>(&expr, &empty), coerce::<f64>(&value));
        assert_eq!(evaluate_as::<bool, _>(&expr, &empty), coerce::<bool>(&value));
    }
}

#[test]
fn test_missing_property_defaults() {
    let empty = PropertyMap::new();
    let missing = Expression::property("missing");
    assert_eq!(evaluate_as::<String, _>(&missing, &empty), "");
    assert_eq!(evaluate_as::<f64, _>(&missing, &empty), 0.0);
    assert!(!evaluate_as::<bool, _>(&missing, &empty));
}

#[test]
fn test_fallback() {
    let ctx = props(&[("a", Value::from("x"))]);
    assert_eq!(
        evaluate_as::<String, _>(&Expression::property_or("a", "y"), &ctx),
        "x"
    );
    assert_eq!(
        evaluate_as::<String, _>(&Expression::property_or("b", "y"), &ctx),
        "y"
    );
}

#[test]
fn test_fallback_is_lazy() {
    let ctx = RecordingProperties::new(props(&[("a", Value::from("x"))]));
    let expr = Expression::property_or("a", Expression::property("trap"));
    assert_eq!(evaluate_as::<String, _>(&expr, &ctx), "x");
    assert!(!ctx.looked_up("trap"));
}

#[test]
fn test_conditional_evaluates_only_selected_branch() {
    let ctx = RecordingProperties::new(props(&[("c", Value::Bool(true)), ("a", Value::from("yes"))]));
    let expr = Expression::conditional(
        Expression::property("c"),
        Expression::property("a"),
        Expression::property("trap"),
    );
    assert_eq!(evaluate_as::<String, _>(&expr, &ctx), "yes");
    assert!(ctx.looked_up("c"));
    assert!(ctx.looked_up("a"));
    assert!(!ctx.looked_up("trap"));

    let ctx = RecordingProperties::new(props(&[("c", Value::Bool(false))]));
    let expr = Expression::conditional(
        Expression::property("c"),
        Expression::property("trap"),
        Expression::literal("no"),
    );
    assert_eq!(evaluate_as::<String, _>(&expr, &ctx), "no");
    assert!(!ctx.looked_up("trap"));
}

#[test]
fn test_rejected_branch_cannot_fail_strict_evaluation() {
    let evaluator = Evaluator::with_options(EvalOptions::default().strict());
    let ctx = props(&[("c", Value::UInt(1))]);
    let expr = Expression::conditional(
        Expression::property("c"),
        Expression::literal(10.0),
        Expression::property("absent"),
    );
    assert_eq!(evaluator.try_evaluate_as::<f64, _>(&expr, &ctx), Ok(10.0));
}

#[test]
fn test_arithmetic() {
    let empty = PropertyMap::new();
    assert_eq!(
        evaluate_as::<f64, _>(&Expression::add(Expression::literal(2.0), Expression::literal(3.0)), &empty),
        5.0
    );
    let inf: f64 = evaluate_as(&Expression::divide(1.0, 0.0), &empty);
    assert_eq!(inf, f64::INFINITY);
    assert_eq!(
        evaluate_as::<String, _>(&Expression::divide(1.0, 0.0), &empty),
        "inf"
    );
}

#[test]
fn test_concat_and_length() {
    let empty = PropertyMap::new();
    let concat = Expression::concat([Expression::literal("foo"), Expression::literal("bar")]);
    assert_eq!(evaluate_as::<String, _>(&concat, &empty), "foobar");
    assert_eq!(
        evaluate_as::<f64, _>(&Expression::length(Expression::literal("foobar")), &empty),
        6.0
    );
    assert_eq!(evaluate_as::<f64, _>(&Expression::length(concat), &empty), 6.0);
    // UTF-8 bytes, not characters
    assert_eq!(
        evaluate_as::<f64, _>(&Expression::length(Expression::literal("日本")), &empty),
        6.0
    );
}

#[test]
fn test_property_type_tests() {
    let ctx = props(&[("a", Value::UInt(32))]);
    assert!(evaluate_as::<bool, _>(
        &Expression::property_is("a", TypeKind::Number),
        &ctx
    ));
    assert!(!evaluate_as::<bool, _>(
        &Expression::property_is("a", TypeKind::String),
        &ctx
    ));
    assert!(!evaluate_as::<bool, _>(
        &Expression::property_is("b", TypeKind::Number),
        &ctx
    ));
}

#[test]
fn test_canonical_text() {
    assert_eq!(coerce::<String>(&Value::Bool(true)), "true");
    assert_eq!(coerce::<String>(&Value::UInt(32)), "32");
    assert_eq!(coerce::<String>(&Value::Int(-16)), "-16");
}

#[test]
fn test_label_expression() {
    // "{name} ({ref})" when a ref exists, plain name otherwise
    let label = Expression::conditional(
        Expression::property_is("ref", TypeKind::String),
        Expression::concat([
            Expression::property_or("name", "unnamed"),
            Expression::literal(" ("),
            Expression::property("ref"),
            Expression::literal(")"),
        ]),
        Expression::property_or("name", "unnamed"),
    );

    let road = props(&[("name", Value::from("Main St")), ("ref", Value::from("A1"))]);
    assert_eq!(evaluate_as::<String, _>(&label, &road), "Main St (A1)");

    let path = props(&[("ref", Value::UInt(7))]);
    assert_eq!(evaluate_as::<String, _>(&label, &path), "unnamed");
}

#[test]
fn test_btree_and_value_property_bags() {
    let expr = Expression::multiply(Expression::property("size"), 2.0);

    let mut tree = BTreeMap::new();
    tree.insert("size".to_string(), Value::Int(-4));
    assert_eq!(evaluate_as::<f64, _>(&expr, &tree), -8.0);

    let value = Value::from(serde_json::json!({ "size": 1.5 }));
    assert_eq!(evaluate_as::<f64, _>(&expr, &value), 3.0);
}

#[test]
fn test_expression_from_json_document() {
    let expr: Expression = serde_json::from_str(
        r#"{
            "conditional": {
                "condition": { "has_property": "height" },
                "then_expr": { "binary": { "op": "divide", "left": { "property": "height" }, "right": { "literal": 2 } } },
                "else_expr": { "literal": 1.5 }
            }
        }"#,
    )
    .unwrap();

    let ctx = props(&[("height", Value::UInt(10))]);
    assert_eq!(evaluate_as::<f64, _>(&expr, &ctx), 5.0);
    assert_eq!(evaluate_as::<f64, _>(&expr, &PropertyMap::new()), 1.5);
}

#[test]
fn test_repeated_evaluation_is_identical() {
    let ctx = props(&[("a", Value::from("x")), ("n", Value::Float(2.5))]);
    let expr = Expression::concat([
        Expression::property("a"),
        Expression::literal(":"),
        Expression::add(Expression::property("n"), Expression::length(Expression::property("a"))),
    ]);
    let first = evaluate_as::<String, _>(&expr, &ctx);
    let second = evaluate_as::<String, _>(&expr, &ctx);
    assert_eq!(first, "x:3.5");
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_evaluation_of_shared_tree() {
    let expr = Expression::add(Expression::property("n"), 1.0);
    let contexts: Vec<PropertyMap> = (0..256u64)
        .map(|n| props(&[("n", Value::UInt(n))]))
        .collect();

    let results: Vec<f64> = contexts
        .par_iter()
        .map(|ctx| evaluate_as::<f64, _>(&expr, ctx))
        .collect();

    let expected: Vec<f64> = (0..256u64).map(|n| n as f64 + 1.0).collect();
    assert_eq!(results, expected);
}

/// Wrap a literal in fallbacks until the tree is `depth` nodes deep
fn fallback_chain(depth: usize) -> Expression {
    let mut expr = Expression::literal("x");
    for _ in 1..depth {
        expr = Expression::property_or("absent", expr);
    }
    expr
}

#[test]
fn test_tree_at_default_depth_limit_evaluates() {
    // Runs on the default test thread stack
    let expr = fallback_chain(DEFAULT_MAX_DEPTH);
    assert_eq!(expr.depth(), DEFAULT_MAX_DEPTH);

    let empty = PropertyMap::new();
    let evaluator = Evaluator::new();
    assert_eq!(evaluator.try_evaluate_as::<String, _>(&expr, &empty), Ok("x".to_string()));
    assert_eq!(evaluator.try_evaluate_as::<f64, _>(&expr, &empty), Ok(1.0));
    assert_eq!(evaluator.try_evaluate_as::<bool, _>(&expr, &empty), Ok(true));
}

#[test]
fn test_deep_tree_hits_depth_guard() {
    let expr = fallback_chain(DEFAULT_MAX_DEPTH + 1);
    let empty = PropertyMap::new();

    let err = Evaluator::new()
        .try_evaluate_as::<String, _>(&expr, &empty)
        .unwrap_err();
    assert_eq!(
        err,
        EvalError::DepthExceeded {
            depth: DEFAULT_MAX_DEPTH + 1,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    );
    assert_eq!(evaluate_as::<String, _>(&expr, &empty), "");

    let deeper = fallback_chain(4 * DEFAULT_MAX_DEPTH);
    let unlimited = Evaluator::with_options(EvalOptions::default().with_max_depth(None));
    assert_eq!(unlimited.evaluate_as::<String, _>(&deeper, &empty), "x");
}
