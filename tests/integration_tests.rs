// tests/integration_tests.rs

use docmut::{
    CheckError, CompileError, Document, Env, EvalContext, EvalError, ExpressionError,
    ExpressionErrorKind, MutationError, Native, ParseError, Value, apply_expressions,
};
use pretty_assertions::assert_eq;
use serde_json::json;

/// Runs `expressions` against `doc` bound to `root`; returns the outcome and
/// the document as it stands afterwards.
fn run(doc: Native, expressions: &[&str]) -> (Result<Vec<Value>, ExpressionError>, Native) {
    let document = Document::new(doc);
    let env = Env::with_mutators("root");
    let mut ctx = EvalContext::new();
    ctx.bind_root("root", &document).unwrap();
    let result = apply_expressions(&env, &ctx, expressions);
    (result, document.snapshot())
}

fn eval_error(doc: Native, expression: &str) -> EvalError {
    match run(doc, &[expression]).0 {
        Err(ExpressionError {
            kind: ExpressionErrorKind::Eval(e),
            ..
        }) => e,
        other => panic!("expected an evaluation error, got {other:?}"),
    }
}

fn check_error(expression: &str) -> CheckError {
    match Env::with_mutators("root").compile(expression) {
        Err(CompileError::Check(e)) => e,
        other => panic!("expected a check error, got {other:?}"),
    }
}

// ============================================================================
// End-to-End Scenarios
// ============================================================================

#[test]
fn test_merge_scalar_into_object() {
    let (result, doc) = run(
        json!({"spec": {"replicas": 1}}),
        &["root.spec.merge({\"replicas\": 3})", "root.spec.replicas"],
    );
    assert_eq!(result.unwrap(), vec![Value::Null, Value::Integer(3)]);
    assert_eq!(doc, json!({"spec": {"replicas": 3}}));
}

#[test]
fn test_merge_into_sequence() {
    let (result, doc) = run(
        json!({"items": ["a"]}),
        &[
            "root.items.merge([\"b\", \"c\"])",
            "root.items.size()",
            "root.items[2]",
        ],
    );
    assert_eq!(
        result.unwrap(),
        vec![Value::Null, Value::Integer(3), Value::String("c".into())]
    );
    assert_eq!(doc, json!({"items": ["a", "b", "c"]}));
}

#[test]
fn test_merge_then_remove_container() {
    let (result, doc) = run(
        json!({"spec": {"template": {"containers": [{"name": "nginx"}]}}}),
        &[
            "root.spec.template.containers.merge([{\"name\": \"sidecar\"}])",
            "root.spec.template.containers[1].name",
            "root.spec.template.containers[1].remove()",
        ],
    );
    assert_eq!(
        result.unwrap(),
        vec![Value::Null, Value::String("sidecar".into()), Value::Null]
    );
    assert_eq!(
        doc,
        json!({"spec": {"template": {"containers": [{"name": "nginx"}]}}})
    );
}

#[test]
fn test_remove_sequence_nested_in_sequence() {
    let (result, doc) = run(
        json!({"m": [[[1, 2], [3]], [[4, 5]]]}),
        &["root.m[0][0].remove()", "root.m[0][0][0]"],
    );
    assert_eq!(result.unwrap(), vec![Value::Null, Value::Integer(3)]);
    assert_eq!(doc, json!({"m": [[[3]], [[4, 5]]]}));
}

#[test]
fn test_patch_computed_from_document() {
    let (result, doc) = run(
        json!({"spec": {"replicas": 2, "image": "nginx"}}),
        &["root.spec.merge({'replicas': root.spec.replicas * 2, 'image': root.spec.image + ':1.25'})"],
    );
    result.unwrap();
    assert_eq!(doc, json!({"spec": {"replicas": 4, "image": "nginx:1.25"}}));
}

#[test]
fn test_conditional_mutation_short_circuits() {
    let (result, doc) = run(
        json!({"spec": {"replicas": 1}}),
        &[
            "root.spec.replicas > 5 && root.spec.merge({'replicas': 5}) == null",
            "root.spec.replicas < 5 && root.spec.merge({'paused': true}) == null",
        ],
    );
    assert_eq!(
        result.unwrap(),
        vec![Value::Boolean(false), Value::Boolean(true)]
    );
    assert_eq!(doc, json!({"spec": {"replicas": 1, "paused": true}}));
}

#[test]
fn test_bracket_access_matches_member_access() {
    let (result, doc) = run(
        json!({"metadata": {"labels": {}}}),
        &["root[\"metadata\"]['labels'].merge({'app': 'web'})"],
    );
    result.unwrap();
    assert_eq!(doc, json!({"metadata": {"labels": {"app": "web"}}}));
}

#[test]
fn test_sequence_root() {
    let document = Document::new(json!([{"name": "a"}]));
    let env = Env::with_mutators("root");
    let mut ctx = EvalContext::new();
    ctx.bind_root("root", &document).unwrap();

    apply_expressions(&env, &ctx, &["root.merge([{'name': 'b'}])", "root[0].remove()"]).unwrap();
    drop(ctx);

    assert_eq!(document.into_inner(), json!([{"name": "b"}]));
}

#[test]
fn test_scalar_root_cannot_bind() {
    let document = Document::new(json!(42));
    let mut ctx = EvalContext::new();
    assert!(matches!(
        ctx.bind_root("root", &document),
        Err(MutationError::NotObject(_))
    ));
}

// ============================================================================
// Types
// ============================================================================

#[test]
fn test_type_identities() {
    let (result, _) = run(
        json!({"spec": {"ports": [80]}}),
        &[
            "type(root.spec) == ObjectMutator",
            "type(root.spec.ports) == SequenceMutator",
            "type(root.spec.ports[0]) == type(1)",
            "type(root.spec) == type(root.spec.ports)",
        ],
    );
    assert_eq!(
        result.unwrap(),
        vec![
            Value::Boolean(true),
            Value::Boolean(true),
            Value::Boolean(true),
            Value::Boolean(false)
        ]
    );
}

#[test]
fn test_mutator_conversion_is_disallowed() {
    assert_eq!(
        eval_error(json!({"spec": {}}), "string(root.spec)"),
        EvalError::Mutation(MutationError::UnsupportedConversion {
            from: "ObjectMutator".to_string(),
            to: "string".to_string()
        })
    );
    assert!(matches!(
        eval_error(json!({"items": []}), "int(root.items)"),
        EvalError::Mutation(MutationError::UnsupportedConversion { .. })
    ));
}

#[test]
fn test_mutator_equality_is_an_error() {
    assert_eq!(
        eval_error(json!({"spec": {}}), "root.spec == root.spec"),
        EvalError::NoSuchOverload {
            function: "_==_".to_string(),
            receiver: "ObjectMutator".to_string()
        }
    );
}

#[test]
fn test_builtins_on_mutators() {
    let (result, _) = run(
        json!({"spec": {"replicas": 1}, "items": [1, 2]}),
        &[
            "root.spec.contains('replicas')",
            "root.spec.contains('paused')",
            "size(root.items)",
            "root.size()",
        ],
    );
    assert_eq!(
        result.unwrap(),
        vec![
            Value::Boolean(true),
            Value::Boolean(false),
            Value::Integer(2),
            Value::Integer(2)
        ]
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_remove_root_fails() {
    assert!(matches!(
        eval_error(json!({"a": 1}), "root.remove()"),
        EvalError::Mutation(MutationError::UnsupportedOperation(_))
    ));
}

#[test]
fn test_list_field_merge_fails() {
    assert_eq!(
        eval_error(json!({"spec": {}}), "root.spec.merge({'ports': [80]})"),
        EvalError::Mutation(MutationError::UnsupportedOperation(
            "array cannot merge with object".to_string()
        ))
    );
}

#[test]
fn test_index_at_length_fails() {
    assert_eq!(
        eval_error(json!({"items": ["a"]}), "root.items[1]"),
        EvalError::Mutation(MutationError::IndexOutOfBound { index: 1, len: 1 })
    );
}

#[test]
fn test_repeated_patch_key_writes_nothing() {
    let (result, doc) = run(
        json!({"spec": {}}),
        &["root.spec.merge({'replicas': 1, 'replicas': 2})"],
    );
    assert!(matches!(
        result.unwrap_err().kind,
        ExpressionErrorKind::Eval(EvalError::DuplicateKey(_))
    ));
    assert_eq!(doc, json!({"spec": {}}));
}

#[test]
fn test_merge_on_scalar_has_no_overload() {
    assert_eq!(
        eval_error(json!({"spec": {"replicas": 1}}), "root.spec.replicas.merge({})"),
        EvalError::NoSuchOverload {
            function: "merge".to_string(),
            receiver: "int".to_string()
        }
    );
}

#[test]
fn test_batch_stops_at_first_failure_without_rollback() {
    let (result, doc) = run(
        json!({"a": {}}),
        &[
            "root.a.merge({'x': 1})",
            "root.missing.merge({})",
            "root.a.merge({'y': 2})",
        ],
    );
    let err = result.unwrap_err();
    assert_eq!(err.index, 1);
    assert_eq!(err.expression, "root.missing.merge({})");
    assert_eq!(
        err.kind,
        ExpressionErrorKind::Eval(EvalError::Mutation(MutationError::NotFound(
            "missing".to_string()
        )))
    );
    assert_eq!(doc, json!({"a": {"x": 1}}));
}

#[test]
fn test_partial_merge_stays_applied() {
    let (result, doc) = run(
        json!({"spec": {}}),
        &["root.spec.merge({'a': 1, 'b': [2], 'c': 3})"],
    );
    assert!(result.is_err());
    assert_eq!(doc, json!({"spec": {"a": 1}}));
}

// ============================================================================
// Static Checking
// ============================================================================

#[test]
fn test_undeclared_reference() {
    assert_eq!(
        check_error("object.spec"),
        CheckError::UndeclaredReference("object".to_string())
    );
}

#[test]
fn test_unknown_function() {
    assert_eq!(
        check_error("root.frobnicate()"),
        CheckError::UnknownFunction("frobnicate".to_string())
    );
    assert_eq!(
        check_error("len(root)"),
        CheckError::UnknownFunction("len".to_string())
    );
}

#[test]
fn test_arity_mismatch() {
    assert_eq!(
        check_error("root.spec.merge()"),
        CheckError::ArityMismatch {
            function: "merge".to_string(),
            expected: vec![1],
            found: 0
        }
    );
    assert_eq!(
        check_error("root.spec.remove(1)"),
        CheckError::ArityMismatch {
            function: "remove".to_string(),
            expected: vec![0],
            found: 1
        }
    );
}

#[test]
fn test_compile_surfaces_parse_errors() {
    assert!(matches!(
        Env::with_mutators("root").compile("root.spec.merge("),
        Err(CompileError::Parse(ParseError::UnexpectedToken { .. }))
    ));
}

#[test]
fn test_plain_env_knows_no_mutation() {
    let env = Env::new();
    assert_eq!(
        env.compile("root.merge({})").unwrap_err(),
        CompileError::Check(CheckError::UndeclaredReference("root".to_string()))
    );
    assert!(env.compile("[1, 2].contains(2)").is_ok());
}
