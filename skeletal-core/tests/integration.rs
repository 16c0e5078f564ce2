//! Integration tests round-tripping object graphs through the encoded form.

use serde_json::json;
use skeletal_core::{
    decode, encode, iterate, Config, DecodeError, Decoder, EncodedCollection, Encoder, Flat, Graph,
    GraphError, Node, Restored, Value,
};

/// Encodes JSON documents as a tree graph and decodes them again.
fn roundtrip(docs: &[serde_json::Value]) -> serde_json::Value {
    let mut graph = Graph::new();
    let objects: Vec<Value> = docs.iter().map(|doc| graph.import(doc).unwrap()).collect();

    let collection = encode(&graph, &objects).unwrap();
    decode(&collection).unwrap().export().unwrap()
}

#[test]
fn nested_document_roundtrip() {
    let doc = json!({
        "id": 7,
        "name": "widget",
        "price": 12.5,
        "active": false,
        "owner": null,
        "tags": ["a", "b", []],
        "dims": {"w": 1, "h": {"value": 2, "unit": "cm"}},
        "history": [{"at": 1, "by": "x"}, {"at": 2, "by": "y"}]
    });

    assert_eq!(roundtrip(&[doc.clone()]), doc);
}

#[test]
fn key_order_survives() {
    let result = roundtrip(&[json!({"z": 1, "a": 2, "m": {"y": 0, "b": 0}})]);

    let keys: Vec<&str> = result.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["z", "a", "m"]);
    let nested: Vec<&str> = result["m"].as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(nested, ["y", "b"]);
}

#[test]
fn two_objects_come_back_as_list() {
    let a = json!({"a": 1, "b": 2, "c": 3});
    let b = json!({"d": 4, "e": 5, "f": 6});

    assert_eq!(roundtrip(&[a.clone(), b.clone()]), json!([a, b]));
}

#[test]
fn single_object_is_not_wrapped() {
    let mut graph = Graph::new();
    let root = graph.import(&json!({"k": "v"})).unwrap();

    let decoded = decode(&encode(&graph, &[root]).unwrap()).unwrap();

    assert!(matches!(decoded.restored, Restored::One(_)));
}

#[test]
fn empty_roundtrip() {
    let collection = encode(&Graph::new(), &[]).unwrap();
    assert!(collection.is_empty());

    let decoded = decode(&collection).unwrap();
    assert_eq!(decoded.restored, Restored::Many(vec![]));
}

#[test]
fn shared_instance_keeps_identity() {
    let mut graph = Graph::new();
    let shared = graph.object([("v", Value::from(1))]);
    let root = graph.object([("x", Value::Link(shared)), ("y", Value::Link(shared))]);

    let collection = encode(&graph, &[Value::Link(root)]).unwrap();
    assert_eq!(collection.get(r#"{"x":0,"y":1}"#).unwrap()[1], Flat::from("{x}"));

    let decoded = decode(&collection).unwrap();
    let root = decoded.restored.single().unwrap();
    let x = decoded.graph.get(root, "x").and_then(Value::as_link).unwrap();
    let y = decoded.graph.get(root, "y").and_then(Value::as_link).unwrap();
    assert_eq!(x, y);
    assert_eq!(decoded.graph.get(x, "v"), Some(&Value::from(1)));

    // Equal by value to the original, with the shared node written twice.
    assert_eq!(decoded.export().unwrap(), json!({"x": {"v": 1}, "y": {"v": 1}}));
}

#[test]
fn repeated_array_elements_keep_identity() {
    let mut graph = Graph::new();
    let item = graph.object([("n", Value::from("item"))]);
    let list = graph.array([Value::Link(item), Value::Link(item)]);
    let root = graph.object([("list", Value::Link(list))]);

    let decoded = decode(&encode(&graph, &[Value::Link(root)]).unwrap()).unwrap();

    let root = decoded.restored.single().unwrap();
    let list = decoded.graph.get(root, "list").and_then(Value::as_link).unwrap();
    let Some(Node::Array(items)) = decoded.graph.node(list) else {
        panic!("Expected array");
    };
    assert_eq!(items.len(), 2);
    assert!(items[0].is_structured());
    assert_eq!(items[0], items[1]);
}

#[test]
fn shared_array_of_objects_keeps_identity() {
    let mut graph = Graph::new();
    let first = graph.object([("v", Value::from(1))]);
    let second = graph.object([("v", Value::from(2))]);
    let list = graph.array([Value::Link(first), Value::Link(second)]);
    let root = graph.object([("list", Value::Link(list)), ("again", Value::Link(list))]);

    let collection = encode(&graph, &[Value::Link(root)]).unwrap();
    let text = collection.to_json().unwrap();
    assert_eq!(text, r#"{"{\"list\":0,\"again\":1}":[[{"v":1},{"v":2}],"{list}"]}"#);

    let decoded = decode(&collection).unwrap();
    let root = decoded.restored.single().unwrap();
    let list = decoded.graph.get(root, "list").and_then(Value::as_link).unwrap();
    assert_eq!(decoded.graph.get(root, "again"), Some(&Value::Link(list)));
    assert_eq!(
        decoded.export().unwrap(),
        json!({"list": [{"v": 1}, {"v": 2}], "again": [{"v": 1}, {"v": 2}]})
    );
}

#[test]
fn key_reused_inside_shared_object_keeps_identity() {
    let mut graph = Graph::new();
    let inner = graph.object([("w", Value::from(9))]);
    let shared = graph.object([("a", Value::Link(inner))]);
    let root = graph.object([("a", Value::Link(shared)), ("b", Value::Link(shared))]);

    let decoded = decode(&encode(&graph, &[Value::Link(root)]).unwrap()).unwrap();

    let root = decoded.restored.single().unwrap();
    let a = decoded.graph.get(root, "a").and_then(Value::as_link).unwrap();
    assert_eq!(decoded.graph.get(root, "b"), Some(&Value::Link(a)));
    assert_eq!(
        decoded.export().unwrap(),
        json!({"a": {"a": {"w": 9}}, "b": {"a": {"w": 9}}})
    );
}

#[test]
fn distinct_instances_under_one_label_stay_distinct() {
    let mut graph = Graph::new();
    let a = graph.object([("v", Value::from(1))]);
    let b = graph.object([("v", Value::from(2))]);
    let y = graph.object([("x", Value::Link(b)), ("again", Value::Link(b))]);
    let root = graph.object([
        ("x", Value::Link(a)),
        ("y", Value::Link(y)),
        ("z", Value::Link(a)),
    ]);
    let expected = graph.export(&Value::Link(root)).unwrap();

    let collection = encode(&graph, &[Value::Link(root)]).unwrap();
    let decoded = decode(&collection).unwrap();

    let graph = &decoded.graph;
    let root = decoded.restored.single().unwrap();
    let a = graph.get(root, "x").and_then(Value::as_link).unwrap();
    let y = graph.get(root, "y").and_then(Value::as_link).unwrap();
    let b = graph.get(y, "x").and_then(Value::as_link).unwrap();
    assert_ne!(a, b);
    assert_eq!(graph.get(y, "again"), Some(&Value::Link(b)));
    assert_eq!(graph.get(root, "z"), Some(&Value::Link(a)));
    assert_eq!(decoded.export().unwrap(), expected);
}

#[test]
fn cycle_roundtrip() {
    let mut graph = Graph::new();
    let node = graph.object([("name", Value::from("loop"))]);
    graph.insert(node, "next", Value::Link(node)).unwrap();
    let root = graph.object([("head", Value::Link(node))]);

    let decoded = decode(&encode(&graph, &[Value::Link(root)]).unwrap()).unwrap();

    let root = decoded.restored.single().unwrap();
    let head = decoded.graph.get(root, "head").and_then(Value::as_link).unwrap();
    assert_eq!(decoded.graph.get(head, "name"), Some(&Value::from("loop")));
    assert_eq!(decoded.graph.get(head, "next"), Some(&Value::Link(head)));
    assert!(matches!(decoded.export(), Err(GraphError::Cycle(_))));
}

#[test]
fn shared_instance_across_objects() {
    let mut graph = Graph::new();
    let shared = graph.object([("v", Value::from(1))]);
    let a = graph.object([("p", Value::Link(shared)), ("tag", Value::from("a"))]);
    let b = graph.object([("q", Value::Link(shared))]);

    let decoded = decode(&encode(&graph, &[Value::Link(a), Value::Link(b)]).unwrap()).unwrap();

    let [a, b] = decoded.roots() else {
        panic!("Expected two roots");
    };
    let p = decoded.graph.get(*a, "p").and_then(Value::as_link).unwrap();
    let q = decoded.graph.get(*b, "q").and_then(Value::as_link).unwrap();
    assert_eq!(p, q);
}

#[test]
fn same_key_set_keeps_later_object() {
    let result = roundtrip(&[json!({"k": 1}), json!({"other": true}), json!({"k": 2})]);

    // Entry order follows first insertion, values follow the last.
    assert_eq!(result, json!([{"k": 2}, {"other": true}]));
}

#[test]
fn literal_marker_text_without_target_survives() {
    let doc = json!({"note": "{not a ref}", "list": ["{}"]});

    assert_eq!(roundtrip(&[doc.clone()]), doc);
}

#[test]
fn json_text_roundtrip() {
    let mut graph = Graph::new();
    let shared = graph.array([Value::from(1), Value::from(2)]);
    let root = graph.object([("a", Value::Link(shared)), ("b", Value::Link(shared))]);

    let text = encode(&graph, &[Value::Link(root)]).unwrap().to_json().unwrap();
    assert_eq!(text, r#"{"{\"a\":0,\"b\":1}":[[1,2],"{a}"]}"#);

    let collection = EncodedCollection::from_json(&text).unwrap();
    let decoded = decode(&collection).unwrap();
    let root = decoded.restored.single().unwrap();
    assert_eq!(decoded.graph.get(root, "a"), decoded.graph.get(root, "b"));
}

#[test]
fn cbor_roundtrip() {
    let doc = json!({"z": [1, {"deep": "x"}], "a": null});
    let mut graph = Graph::new();
    let root = graph.import(&doc).unwrap();

    let bytes = encode(&graph, &[root]).unwrap().to_cbor().unwrap();
    let collection = EncodedCollection::from_cbor(&bytes).unwrap();

    assert_eq!(decode(&collection).unwrap().export().unwrap(), doc);
}

#[test]
fn iterate_yields_value_arrays() {
    let mut graph = Graph::new();
    let a = graph.import(&json!({"a": 1, "b": 2, "c": 3})).unwrap();
    let b = graph.import(&json!({"d": 4, "e": 5, "f": 6})).unwrap();
    let collection = encode(&graph, &[a, b]).unwrap();

    let values: Vec<&[Flat]> = iterate(&collection).collect();
    assert_eq!(values[0], [Flat::from(1), Flat::from(2), Flat::from(3)]);
    assert_eq!(values[1], [Flat::from(4), Flat::from(5), Flat::from(6)]);

    // A second pass starts over.
    assert_eq!(iterate(&collection).count(), 2);
}

#[test]
fn corrupt_schema_fails_decode() {
    let text = r#"{"{\"a\":0}":[1],"{broken":[2]}"#;
    let collection = EncodedCollection::from_json(text).unwrap();

    let err = decode(&collection).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedSchema { .. }));
    assert!(err.to_string().starts_with("corrupt entry"));
}

#[test]
fn import_rejects_nesting_past_limit() {
    let mut graph = Graph::with_config(Config::new().with_max_depth(1));

    assert!(graph.import(&json!({"a": []})).is_ok());
    assert!(matches!(
        graph.import(&json!({"a": [[]]})),
        Err(GraphError::DepthExceeded { limit: 1 })
    ));
}

#[test]
fn depth_limit_applies_both_ways() {
    let doc = json!({"a": [[[[1]]]]});
    let mut graph = Graph::new();
    let root = graph.import(&doc).unwrap();
    let tight = Config::new().with_max_depth(3);

    assert!(Encoder::with_config(tight).encode(&graph, &[root.clone()]).is_err());

    let collection = Encoder::new().encode(&graph, &[root]).unwrap();
    assert!(matches!(
        Decoder::with_config(tight).decode(&collection),
        Err(DecodeError::DepthExceeded { limit: 3 })
    ));
    assert_eq!(Decoder::new().decode(&collection).unwrap().export().unwrap(), doc);
}
