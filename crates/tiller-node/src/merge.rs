//! Merge engine — reconciles desired changes with a node's current record.
//!
//! Two rules, both pure and deterministic:
//! - run lists are ordered sets: the original order survives, novel
//!   identifiers append in the order given;
//! - attribute trees deep-merge: mappings union recursively, anything else
//!   (scalars, arrays, type mismatches) is replaced wholesale by the new
//!   value.

use serde_json::Value;

use tiller_core::{Attributes, DesiredChange, NodeRecord};

/// Ordered-set union of two run lists.
///
/// The result is the original list with duplicates removed, in original
/// order, followed by every identifier of `incoming` not already present,
/// in `incoming`'s order.
pub fn union_run_list(original: &[String], incoming: &[String]) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(original.len() + incoming.len());
    for item in original.iter().chain(incoming) {
        if !result.contains(item) {
            result.push(item.clone());
        }
    }
    result
}

/// Deep-merge `incoming` into `original`.
///
/// Where both sides hold a mapping the keys union recursively; everywhere
/// else the incoming value wins. Arrays are not merged element-wise.
pub fn deep_merge(original: &mut Value, incoming: &Value) {
    match (original, incoming) {
        (Value::Object(orig), Value::Object(inc)) => {
            for (key, value) in inc {
                match orig.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        orig.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (original, incoming) => *original = incoming.clone(),
    }
}

/// Deep-merge two attribute maps, consuming neither input.
pub fn merge_attributes(original: &Attributes, incoming: &Attributes) -> Attributes {
    let mut merged = Value::Object(original.clone());
    deep_merge(&mut merged, &Value::Object(incoming.clone()));
    match merged {
        Value::Object(map) => map,
        _ => unreachable!("merging two objects yields an object"),
    }
}

/// Apply a desired change to a record's run list and normal attributes.
///
/// Every other field — environment, automatic/default/override trees,
/// pass-through metadata — is left exactly as fetched.
pub fn apply_change(record: &mut NodeRecord, change: &DesiredChange) {
    record.run_list = union_run_list(&record.run_list, &change.run_list);
    record.normal = merge_attributes(&record.normal, &change.attributes);
}
