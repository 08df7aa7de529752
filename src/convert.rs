//! Conversion utilities between JSON and document values.
//!
//! Provides bidirectional conversion between serde_json::Value and [`Value`],
//! plus the argument helpers used by tool dispatch.

use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};
use crate::value::{Document, Value};

/// Convert a JSON value to a document Value.
///
/// Integers that fit in `i64` become `Int`; every other number becomes `Float`.
pub fn json_to_value(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        JsonValue::String(s) => Value::String(s),
        JsonValue::Array(arr) => Value::Array(arr.into_iter().map(json_to_value).collect()),
        JsonValue::Object(map) => Value::Object(json_to_document(map)),
    }
}

/// Convert a JSON object to a Document, keeping key order.
pub fn json_to_document(map: Map<String, JsonValue>) -> Document {
    map.into_iter().map(|(k, v)| (k, json_to_value(v))).collect()
}

/// Convert a document Value to a JSON value.
///
/// Non-finite floats have no JSON representation and become null.
pub fn value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(b),
        Value::Int(i) => JsonValue::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number),
        Value::String(s) => JsonValue::String(s),
        Value::Array(arr) => JsonValue::Array(arr.into_iter().map(value_to_json).collect()),
        Value::Object(obj) => document_to_json(obj),
    }
}

/// Convert a Document to a JSON object.
pub fn document_to_json(doc: Document) -> JsonValue {
    JsonValue::Object(doc.into_iter().map(|(k, v)| (k, value_to_json(v))).collect())
}

/// Convert a list of documents to a JSON array.
pub fn documents_to_json(docs: Vec<Document>) -> JsonValue {
    JsonValue::Array(docs.into_iter().map(document_to_json).collect())
}

/// Helper to get a required string argument from JSON arguments.
pub fn get_string_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| McpError::MissingArg(name.to_string()))
}

/// Helper to get a required object argument and convert it to a Document.
pub fn get_object_arg(args: &Map<String, JsonValue>, name: &str) -> Result<Document> {
    match args.get(name) {
        Some(JsonValue::Object(map)) => Ok(json_to_document(map.clone())),
        Some(JsonValue::Null) | None => Err(McpError::MissingArg(name.to_string())),
        Some(other) => Err(McpError::InvalidArg {
            name: name.to_string(),
            reason: format!("Expected an object, got {}", json_type_name(other)),
        }),
    }
}

/// Helper to get an optional object argument. `null` counts as absent.
pub fn get_optional_object(args: &Map<String, JsonValue>, name: &str) -> Result<Option<Document>> {
    match args.get(name) {
        Some(JsonValue::Null) | None => Ok(None),
        Some(_) => get_object_arg(args, name).map(Some),
    }
}

/// Helper to get an optional boolean argument.
pub fn get_optional_bool(args: &Map<String, JsonValue>, name: &str) -> Option<bool> {
    args.get(name).and_then(|v| v.as_bool())
}

fn json_type_name(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
