//! JSON builders for delayed-array containers.
//!
//! Each builder returns the JSON object for one group, laid out the way the
//! JSON container reader expects: group attributes under `"attributes"`,
//! everything else as child datasets or groups.
use serde_json::{Map, Value, json};

/// A native dense leaf holding `rows` (row-major).
pub fn dense(rows: &[&[f64]]) -> Value {
    json!({
        "attributes": {
            "delayed_type": "array",
            "delayed_array": "dense array",
        },
        "data": rows,
        "native": true,
    })
}

/// A compressed sparse column leaf.
pub fn sparse(shape: (usize, usize), data: &[f64], indices: &[i64], indptr: &[i64]) -> Value {
    json!({
        "attributes": {
            "delayed_type": "array",
            "delayed_array": "sparse matrix",
        },
        "shape": [shape.0, shape.1],
        "data": data,
        "indices": indices,
        "indptr": indptr,
    })
}

/// An operation group named `name` with the members of `operands` as children.
pub fn operation(name: &str, operands: Value) -> Value {
    let mut group = Map::new();
    group.insert(
        "attributes".to_string(),
        json!({
            "delayed_type": "operation",
            "delayed_operation": name,
        }),
    );
    if let Value::Object(operands) = operands {
        group.extend(operands);
    }
    Value::Object(group)
}

/// A list group whose entries are named `"0"`, `"1"`, ...
pub fn list(items: Vec<Value>) -> Value {
    let mut group = Map::new();
    group.insert("attributes".to_string(), json!({ "delayed_length": items.len() }));
    group.extend(items.into_iter().enumerate().map(|(i, item)| (i.to_string(), item)));
    Value::Object(group)
}

/// A container with `node` stored under `name`.
pub fn container(name: &str, node: Value) -> String {
    let mut root = Map::new();
    root.insert(name.to_string(), node);
    Value::Object(root).to_string()
}
