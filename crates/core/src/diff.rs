//! Structural diff over JSON records.
//!
//! Records are flattened to dotted-path leaves (primitives and arrays are
//! leaves, nested objects are not), compared leaf-by-leaf, and the changed
//! leaves are re-nested into a sparse record. This is the basis for
//! sending minimal update payloads instead of full snapshots.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Flatten a JSON value into a dotted-path -> leaf-value map.
///
/// Nested objects contribute their leaves under `parent.child` paths.
/// Arrays and primitives are treated as leaves. Empty objects contribute
/// no paths.
pub fn flatten(value: &Value) -> BTreeMap<String, Value> {
    let mut leaves = BTreeMap::new();
    flatten_into(value, String::new(), &mut leaves);
    leaves
}

fn flatten_into(value: &Value, prefix: String, leaves: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(child, path, leaves);
            }
        }
        leaf => {
            // The root itself may be a leaf (non-object input).
            leaves.insert(prefix, leaf.clone());
        }
    }
}

/// Rebuild a nested record from dotted-path leaves.
///
/// Each path is split on `.` and intermediate objects are created as
/// needed. Later paths overwrite earlier ones on collision.
pub fn unflatten(leaves: &BTreeMap<String, Value>) -> Value {
    let mut root = Map::new();

    for (path, value) in leaves {
        let mut current = &mut root;
        let mut parts = path.split('.').peekable();

        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                current.insert(part.to_string(), value.clone());
            } else {
                let entry = current
                    .entry(part.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !entry.is_object() {
                    *entry = Value::Object(Map::new());
                }
                current = entry.as_object_mut().unwrap();
            }
        }
    }

    Value::Object(root)
}

/// Compute the sparse record of leaves whose value differs between
/// `source` and `target`.
///
/// For each path in the union of both flattened records, the path is
/// retained with `target`'s value when the values are unequal. Paths
/// absent in `target` are dropped, modeling "no longer present".
/// `diff(x, x)` is the empty object for any `x`.
pub fn diff(source: &Value, target: &Value) -> Value {
    let flat_source = flatten(source);
    let flat_target = flatten(target);
    let mut changed = BTreeMap::new();

    for (path, target_value) in &flat_target {
        if flat_source.get(path) != Some(target_value) {
            changed.insert(path.clone(), target_value.clone());
        }
    }

    unflatten(&changed)
}

/// Whether a diff result contains no changed leaves.
pub fn is_empty(diff: &Value) -> bool {
    diff.as_object().is_none_or(Map::is_empty)
}
