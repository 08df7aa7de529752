//! Response envelope.
//!
//! Every tool result is rendered as
//!
//! ```json
//! { "success": true, "data": ..., "message": "...", "count": 0, "error": null,
//!   "operation": "read", "timestamp": "2024-01-01T00:00:00.000000Z", "metadata": {...} }
//! ```
//!
//! `success` is `true` exactly when `error` is `null`. `error_code` is present only
//! on failures that carry one; `metadata` only when non-empty.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::manager::DbResult;

/// Keys every envelope must carry.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "success",
    "data",
    "message",
    "count",
    "error",
    "operation",
    "timestamp",
];

/// Current UTC time as ISO-8601 with a trailing `Z`.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Uniform tool response.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    /// Whether the operation succeeded
    pub success: bool,
    /// Result payload
    pub data: JsonValue,
    /// Human-readable outcome
    pub message: String,
    /// Records returned or affected
    pub count: usize,
    /// Failure description; `None` exactly when `success`
    pub error: Option<String>,
    /// Machine-readable failure kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Operation name (`create`, `read`, ...)
    pub operation: String,
    /// When the envelope was built
    pub timestamp: String,
    /// Operation context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, JsonValue>>,
}

impl ResponseEnvelope {
    /// Successful envelope.
    pub fn success(
        data: JsonValue,
        message: impl Into<String>,
        count: usize,
        operation: &str,
        metadata: Option<Map<String, JsonValue>>,
    ) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
            count,
            error: None,
            error_code: None,
            operation: operation.to_string(),
            timestamp: timestamp_now(),
            metadata: metadata.filter(|m| !m.is_empty()),
        }
    }

    /// Failed envelope; the message is `"<Operation> failed"`.
    pub fn error(
        error: impl Into<String>,
        operation: &str,
        error_code: Option<&str>,
        data: JsonValue,
        metadata: Option<Map<String, JsonValue>>,
    ) -> Self {
        Self {
            success: false,
            data,
            message: format!("{} failed", capitalize(operation)),
            count: 0,
            error: Some(error.into()),
            error_code: error_code.map(str::to_string),
            operation: operation.to_string(),
            timestamp: timestamp_now(),
            metadata: metadata.filter(|m| !m.is_empty()),
        }
    }

    /// Wrap a manager result. The manager's metadata is kept and `collection` added.
    pub fn from_db_result(result: DbResult, operation: &str, collection: &str) -> Self {
        let mut metadata = Map::new();
        metadata.insert("collection".into(), JsonValue::from(collection));
        metadata.extend(result.metadata);

        match result.error {
            None if result.success => Self::success(
                result.data,
                result.message,
                result.count,
                operation,
                Some(metadata),
            ),
            error => Self::error(
                error.unwrap_or_else(|| "Unknown error occurred".to_string()),
                operation,
                result.error_code,
                result.data,
                Some(metadata),
            ),
        }
    }

    /// Successful search over `collection` with the executed query echoed back.
    pub fn search_response(records: Vec<JsonValue>, collection: &str, query: JsonValue) -> Self {
        let count = records.len();
        let mut metadata = Map::new();
        metadata.insert("collection".into(), JsonValue::from(collection));
        metadata.insert("search_query".into(), query);
        Self::success(
            JsonValue::Array(records),
            format!(
                "Search completed: found {} matching records in {}",
                count, collection
            ),
            count,
            "search",
            Some(metadata),
        )
    }

    /// Envelope as a JSON value.
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({
                "success": false,
                "data": null,
                "message": "Serialization failed",
                "count": 0,
                "error": e.to_string(),
                "operation": self.operation,
                "timestamp": self.timestamp,
            })
        })
    }

    /// Envelope as indented JSON text.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_default()
    }
}

/// Check that `response` has every required key with the right types and that
/// `success` and `error` agree.
pub fn validate_structure(response: &JsonValue) -> bool {
    let Some(obj) = response.as_object() else {
        return false;
    };
    if !REQUIRED_FIELDS.iter().all(|f| obj.contains_key(*f)) {
        return false;
    }
    let typed = obj["success"].is_boolean()
        && obj["message"].is_string()
        && obj["count"].is_u64()
        && obj["operation"].is_string()
        && obj["timestamp"].is_string();
    if !typed {
        return false;
    }
    obj["success"].as_bool() == Some(obj["error"].is_null())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
