// tests/mutator_tests.rs

use docmut::{
    Document, Indexer, Mutable, MutationError, Node, ObjectMutator, SequenceMutator, TypeTag,
    Value,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

fn map(entries: Vec<(&str, Value)>) -> Value {
    Value::Map(entries.into_iter().map(|(k, v)| (key(k), v)).collect())
}

fn list(items: Vec<Value>) -> Value {
    Value::List(items)
}

fn object(value: Value) -> ObjectMutator {
    match value {
        Value::Object(m) => m,
        other => panic!("expected ObjectMutator, got {other}"),
    }
}

fn sequence(value: Value) -> SequenceMutator {
    match value {
        Value::Sequence(m) => m,
        other => panic!("expected SequenceMutator, got {other}"),
    }
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn test_missing_key_is_not_found() {
    let document = Document::new(json!({"spec": {"replicas": 1}}));
    let root = ObjectMutator::root(&document).unwrap();
    for missing in ["status", "", "Spec"] {
        assert_eq!(
            root.get(&key(missing)).unwrap_err(),
            MutationError::NotFound(missing.to_string())
        );
    }
}

#[test]
fn test_composites_become_child_mutators() {
    let document = Document::new(json!({"spec": {"items": [1]}, "name": "web"}));
    let root = ObjectMutator::root(&document).unwrap();

    assert_eq!(root.get(&key("name")).unwrap(), key("web"));

    let spec = object(root.get(&key("spec")).unwrap());
    assert_eq!(spec.state().path(), "$.spec");
    assert_eq!(spec.parent().map(|p| p.state().path()), Some("$".to_string()));

    let items = sequence(spec.get(&key("items")).unwrap());
    assert_eq!(items.state().path(), "$.spec.items");
    assert_eq!(items.len().unwrap(), 1);
}

#[test]
fn test_scalar_sequence_elements_come_back_directly() {
    let document = Document::new(json!({"ports": [80, "http", null, 1.5]}));
    let root = ObjectMutator::root(&document).unwrap();
    let ports = sequence(root.get(&key("ports")).unwrap());

    assert_eq!(ports.get(&Value::Integer(0)).unwrap(), Value::Integer(80));
    assert_eq!(ports.get(&Value::Integer(1)).unwrap(), key("http"));
    assert_eq!(ports.get(&Value::Integer(2)).unwrap(), Value::Null);
    assert_eq!(ports.get(&Value::Integer(3)).unwrap(), Value::Float(1.5));
}

#[test]
fn test_index_equal_to_length_is_out_of_bound() {
    let document = Document::new(json!({"items": ["a"]}));
    let root = ObjectMutator::root(&document).unwrap();
    let items = sequence(root.get(&key("items")).unwrap());

    assert_eq!(
        items.get(&Value::Integer(1)).unwrap_err(),
        MutationError::IndexOutOfBound { index: 1, len: 1 }
    );
}

// ============================================================================
// Object Merge
// ============================================================================

#[test]
fn test_merge_scalar_then_read_back() {
    let document = Document::new(json!({"spec": {"replicas": 1}}));
    let root = ObjectMutator::root(&document).unwrap();
    let spec = object(root.get(&key("spec")).unwrap());

    assert_eq!(
        spec.merge(&map(vec![("replicas", Value::Integer(3))])).unwrap(),
        Value::Null
    );
    assert_eq!(spec.get(&key("replicas")).unwrap(), Value::Integer(3));
    assert_eq!(document.snapshot(), json!({"spec": {"replicas": 3}}));
}

#[test]
fn test_merge_nested_map_is_stored_natively() {
    let document = Document::new(json!({"metadata": {}}));
    let root = ObjectMutator::root(&document).unwrap();
    let metadata = object(root.get(&key("metadata")).unwrap());

    let labels = map(vec![("app", key("web")), ("tier", key("front"))]);
    metadata.merge(&map(vec![("labels", labels)])).unwrap();

    // Reads back as native structure, reached through a fresh mutator
    let labels = object(metadata.get(&key("labels")).unwrap());
    assert_eq!(labels.get(&key("app")).unwrap(), key("web"));
    assert_eq!(
        document.snapshot(),
        json!({"metadata": {"labels": {"app": "web", "tier": "front"}}})
    );
}

#[test]
fn test_merge_replaces_nested_structure() {
    let document = Document::new(json!({"spec": {"a": {"x": 1, "y": 2}, "b": true}}));
    let root = ObjectMutator::root(&document).unwrap();
    let spec = object(root.get(&key("spec")).unwrap());

    spec.merge(&map(vec![("a", map(vec![("x", Value::Integer(10))]))]))
        .unwrap();

    assert_eq!(document.snapshot(), json!({"spec": {"a": {"x": 10}, "b": true}}));
}

#[test]
fn test_merge_list_field_into_object_is_unsupported() {
    let patches = vec![
        list(vec![]),
        list(vec![Value::Integer(1)]),
        list(vec![map(vec![("name", key("nginx"))])]),
    ];
    for patch in patches {
        let document = Document::new(json!({"spec": {}}));
        let root = ObjectMutator::root(&document).unwrap();
        let err = root.merge(&map(vec![("containers", patch)])).unwrap_err();
        assert_eq!(
            err,
            MutationError::UnsupportedOperation("array cannot merge with object".to_string())
        );
        assert_eq!(document.snapshot(), json!({"spec": {}}));
    }
}

#[test]
fn test_partial_object_merge_is_not_rolled_back() {
    let document = Document::new(json!({"spec": {"replicas": 1}}));
    let root = ObjectMutator::root(&document).unwrap();
    let spec = object(root.get(&key("spec")).unwrap());

    let patch = map(vec![
        ("replicas", Value::Integer(2)),
        ("ports", list(vec![Value::Integer(80)])),
        ("paused", Value::Boolean(true)),
    ]);
    assert!(matches!(
        spec.merge(&patch),
        Err(MutationError::UnsupportedOperation(_))
    ));
    assert_eq!(document.snapshot(), json!({"spec": {"replicas": 2}}));
}

#[test]
fn test_non_string_patch_key_is_bad_key() {
    let document = Document::new(json!({}));
    let root = ObjectMutator::root(&document).unwrap();
    let patch = Value::Map(vec![
        (key("a"), Value::Integer(1)),
        (Value::Integer(5), Value::Integer(2)),
    ]);

    assert_eq!(
        root.merge(&patch).unwrap_err(),
        MutationError::BadKey("5".to_string())
    );
    assert_eq!(document.snapshot(), json!({"a": 1}));
}

#[test]
fn test_merge_requires_map_patch() {
    let document = Document::new(json!({}));
    let root = ObjectMutator::root(&document).unwrap();
    assert!(matches!(
        root.merge(&list(vec![])),
        Err(MutationError::UnsupportedOperation(_))
    ));
}

// ============================================================================
// Sequence Merge
// ============================================================================

#[test]
fn test_sequence_merge_appends_and_writes_back() {
    let document = Document::new(json!({"items": ["a"]}));
    let root = ObjectMutator::root(&document).unwrap();
    let items = sequence(root.get(&key("items")).unwrap());

    items.merge(&list(vec![key("b"), key("c")])).unwrap();

    assert_eq!(items.len().unwrap(), 3);
    assert_eq!(document.snapshot(), json!({"items": ["a", "b", "c"]}));
    // A fresh read through the parent sees the grown sequence
    let again = sequence(root.get(&key("items")).unwrap());
    assert_eq!(again.get(&Value::Integer(2)).unwrap(), key("c"));
}

#[test]
fn test_sequence_merge_flattens_elements() {
    let document = Document::new(json!([]));
    let root = SequenceMutator::root(&document).unwrap();

    root.merge(&list(vec![
        map(vec![("name", key("sidecar")), ("ports", list(vec![Value::Integer(9090)]))]),
        list(vec![Value::Null]),
    ]))
    .unwrap();

    assert_eq!(
        document.snapshot(),
        json!([{"name": "sidecar", "ports": [9090]}, [null]])
    );
}

#[test]
fn test_sequence_merge_nested_in_sequences() {
    let document = Document::new(json!({"matrix": [[["x"]], [["y"]]]}));
    let root = ObjectMutator::root(&document).unwrap();
    let matrix = sequence(root.get(&key("matrix")).unwrap());
    let row = sequence(matrix.get(&Value::Integer(1)).unwrap());
    let cell = sequence(row.get(&Value::Integer(0)).unwrap());

    cell.merge(&list(vec![key("z"), Value::Integer(1)])).unwrap();

    assert_eq!(
        document.snapshot(),
        json!({"matrix": [[["x"]], [["y", "z", 1]]]})
    );
    // Ancestors are untouched apart from the one cell
    assert_eq!(matrix.len().unwrap(), 2);
    assert_eq!(row.len().unwrap(), 1);
}

#[test]
fn test_failed_sequence_merge_writes_nothing() {
    let document = Document::new(json!({"items": [1]}));
    let root = ObjectMutator::root(&document).unwrap();
    let items = sequence(root.get(&key("items")).unwrap());

    let err = items
        .merge(&list(vec![Value::Integer(2), Value::Float(f64::NAN)]))
        .unwrap_err();
    assert!(matches!(err, MutationError::UnsupportedConversion { .. }));
    assert_eq!(document.snapshot(), json!({"items": [1]}));
}

// ============================================================================
// Remove
// ============================================================================

#[test]
fn test_remove_detaches_from_object_parent() {
    let document = Document::new(json!({"spec": {"replicas": 1}, "status": {}}));
    let root = ObjectMutator::root(&document).unwrap();
    let status = object(root.get(&key("status")).unwrap());

    assert_eq!(status.remove().unwrap(), Value::Null);
    assert_eq!(
        root.get(&key("status")).unwrap_err(),
        MutationError::NotFound("status".to_string())
    );
    assert_eq!(document.snapshot(), json!({"spec": {"replicas": 1}}));
}

#[test]
fn test_remove_splices_sequence_parent() {
    let document = Document::new(json!({"containers": [{"name": "a"}, {"name": "b"}, {"name": "c"}]}));
    let root = ObjectMutator::root(&document).unwrap();
    let containers = sequence(root.get(&key("containers")).unwrap());

    object(containers.get(&Value::Integer(1)).unwrap())
        .remove()
        .unwrap();

    assert_eq!(
        document.snapshot(),
        json!({"containers": [{"name": "a"}, {"name": "c"}]})
    );
    // Later elements shifted down
    let second = object(containers.get(&Value::Integer(1)).unwrap());
    assert_eq!(second.get(&key("name")).unwrap(), key("c"));
}

#[test]
fn test_remove_nested_in_sequences() {
    let document = Document::new(json!({"m": [[[1, 2], [3]], [[4, 5]]]}));
    let root = ObjectMutator::root(&document).unwrap();
    let outer = sequence(root.get(&key("m")).unwrap());
    let inner = sequence(outer.get(&Value::Integer(0)).unwrap());

    sequence(inner.get(&Value::Integer(0)).unwrap())
        .remove()
        .unwrap();

    assert_eq!(document.snapshot(), json!({"m": [[[3]], [[4, 5]]]}));
    assert_eq!(
        sequence(inner.get(&Value::Integer(0)).unwrap())
            .get(&Value::Integer(0))
            .unwrap(),
        Value::Integer(3)
    );
}

#[test]
fn test_removed_node_is_stale() {
    let document = Document::new(json!({"spec": {"replicas": 1}}));
    let root = ObjectMutator::root(&document).unwrap();
    let spec = object(root.get(&key("spec")).unwrap());

    spec.remove().unwrap();

    assert_eq!(
        spec.merge(&map(vec![("replicas", Value::Integer(2))])).unwrap_err(),
        MutationError::NotFound("spec".to_string())
    );
    assert_eq!(document.snapshot(), json!({}));
}

#[test]
fn test_remove_root_is_unsupported() {
    let object_doc = Document::new(json!({"a": 1}));
    let err = ObjectMutator::root(&object_doc).unwrap().remove().unwrap_err();
    assert!(matches!(err, MutationError::UnsupportedOperation(_)));

    let sequence_doc = Document::new(json!([1]));
    let err = SequenceMutator::root(&sequence_doc)
        .unwrap()
        .remove()
        .unwrap_err();
    assert!(matches!(err, MutationError::UnsupportedOperation(_)));

    assert_eq!(object_doc.snapshot(), json!({"a": 1}));
    assert_eq!(sequence_doc.snapshot(), json!([1]));
}

// ============================================================================
// Conversion
// ============================================================================

#[test]
fn test_mutators_refuse_conversion() {
    let document = Document::new(json!({"items": []}));
    let root = ObjectMutator::root(&document).unwrap();
    let items = root.get(&key("items")).unwrap();
    let root = Value::Object(root);

    for value in [&root, &items] {
        assert!(matches!(
            value.convert_to_native(),
            Err(MutationError::UnsupportedConversion { .. })
        ));
        for target in [TypeTag::Int, TypeTag::String, TypeTag::Map, TypeTag::List] {
            assert!(matches!(
                value.convert_to_type(target),
                Err(MutationError::UnsupportedConversion { .. })
            ));
        }
        // Its own type and `type` are still fine
        assert_eq!(value.convert_to_type(value.type_tag()).unwrap(), *value);
        assert_eq!(
            value.convert_to_type(TypeTag::Type).unwrap(),
            Value::Type(value.type_tag())
        );
    }
    assert_eq!(items.type_tag(), TypeTag::SequenceMutator);
}

#[test]
fn test_mutator_inside_patch_is_refused() {
    let document = Document::new(json!({"a": {}, "b": {}}));
    let root = ObjectMutator::root(&document).unwrap();
    let a = root.get(&key("a")).unwrap();

    let err = root.merge(&map(vec![("copy", a)])).unwrap_err();
    assert!(matches!(err, MutationError::UnsupportedConversion { .. }));
    assert_eq!(document.snapshot(), json!({"a": {}, "b": {}}));
}
