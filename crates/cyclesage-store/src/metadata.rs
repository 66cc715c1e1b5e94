//! Metadata flattening for the vector store.
//!
//! The store accepts only string, number and boolean values. Lists become
//! comma-joined strings, empty lists become empty strings, nulls are dropped
//! and nested objects are stored as their JSON text.

use serde_json::{Map, Value};

pub fn clean_metadata(metadata: Map<String, Value>) -> Map<String, Value> {
    metadata
        .into_iter()
        .filter_map(|(key, value)| flatten(value).map(|v| (key, v)))
        .collect()
}

fn flatten(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter(|item| !item.is_null())
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join(", ");
            Some(Value::String(joined))
        }
        Value::Object(map) => Some(Value::String(Value::Object(map).to_string())),
        scalar => Some(scalar),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
