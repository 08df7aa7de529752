//! Record tools.
//!
//! - `create_record` : insert one validated document
//! - `read_records`  : list a collection, optionally filtered
//! - `update_record` : merge field updates into matching documents
//! - `delete_record` : remove (or soft-delete) matching documents
//! - `search_records`: query with the full expression syntax
//!
//! Argument problems are reported as error envelopes, the same way manager
//! failures are, so a client always receives the envelope shape.

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::convert::{document_to_json, get_object_arg, get_optional_bool, get_optional_object, get_string_arg};
use crate::error::{McpError, Result};
use crate::response::ResponseEnvelope;
use crate::schema;
use crate::session::McpSession;
use crate::tools::ToolDef;

type Handler = fn(&McpSession, &Map<String, JsonValue>) -> Result<ResponseEnvelope>;

/// Get all record tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "create_record",
            "Create a new record in a collection ('users', 'tasks' or 'products'). The id and \
             created_at fields are assigned automatically. Users need name and email; tasks \
             need a title; products need a name and a non-negative price.",
            schema!(object {
                required: { "collection": string, "data": object }
            }),
        ),
        ToolDef::new(
            "read_records",
            "Read records from a collection. Without filters every record is returned. Filters \
             map field names to a value (equality) or to an operator object such as \
             {\"gt\": 10} or {\"in\": [\"a\", \"b\"]}.",
            schema!(object {
                required: { "collection": string },
                optional: { "filters": object }
            }),
        ),
        ToolDef::new(
            "update_record",
            "Update every record in a collection that matches the filters. Filters must be \
             non-empty. The id and created_at fields cannot be changed. Returns the updated \
             records.",
            schema!(object {
                required: { "collection": string, "filters": object },
                optional: { "updates": object }
            }),
        ),
        ToolDef::new(
            "delete_record",
            "Delete every record in a collection that matches the filters. Filters must be \
             non-empty. With soft_delete the records are kept and marked deleted=true with a \
             deleted_at timestamp. Returns the records as they were before deletion.",
            schema!(object {
                required: { "collection": string, "filters": object },
                optional: { "soft_delete": boolean }
            }),
        ),
        ToolDef::new(
            "search_records",
            "Search a collection with a query expression. Supports the logical combinators \
             $and, $or and $not, comparison operators (eq, ne, gt, gte, lt, lte), string \
             patterns (contains, startswith, endswith), list membership (in, not_in), exists \
             and between.",
            schema!(object {
                required: { "collection": string, "query": object }
            }),
        ),
    ]
}

/// Dispatch a record tool call.
pub fn dispatch(
    session: &McpSession,
    name: &str,
    args: Map<String, JsonValue>,
) -> Result<ResponseEnvelope> {
    let (operation, handler): (&str, Handler) = match name {
        "create_record" => ("create record", dispatch_create as Handler),
        "read_records" => ("read records", dispatch_read as Handler),
        "update_record" => ("update record", dispatch_update as Handler),
        "delete_record" => ("delete record", dispatch_delete as Handler),
        "search_records" => ("search records", dispatch_search as Handler),
        _ => return Err(McpError::UnknownTool(name.to_string())),
    };
    debug!(tool = name, "Dispatching tool call");

    Ok(handler(session, &args).unwrap_or_else(|e| {
        warn!(tool = name, error = %e, "Tool call rejected");
        let collection = args
            .get("collection")
            .and_then(JsonValue::as_str)
            .unwrap_or("unknown");
        let mut metadata = Map::new();
        metadata.insert("collection".into(), JsonValue::from(collection));
        ResponseEnvelope::error(e.to_string(), operation, Some(e.code()), JsonValue::Null, Some(metadata))
    }))
}

// ── Create ───────────────────────────────────────────────────────────────

fn dispatch_create(session: &McpSession, args: &Map<String, JsonValue>) -> Result<ResponseEnvelope> {
    session.check_write_access("create_record")?;
    let collection = get_string_arg(args, "collection")?;
    let data = get_object_arg(args, "data")?;

    let result = session.manager().create(&collection, &data);
    Ok(ResponseEnvelope::from_db_result(result, "create", &collection))
}

// ── Read ─────────────────────────────────────────────────────────────────

fn dispatch_read(session: &McpSession, args: &Map<String, JsonValue>) -> Result<ResponseEnvelope> {
    let collection = get_string_arg(args, "collection")?;
    let filters = get_optional_object(args, "filters")?;

    let result = session.manager().read(&collection, filters.as_ref());
    Ok(ResponseEnvelope::from_db_result(result, "read", &collection))
}

// ── Update ───────────────────────────────────────────────────────────────

fn dispatch_update(session: &McpSession, args: &Map<String, JsonValue>) -> Result<ResponseEnvelope> {
    session.check_write_access("update_record")?;
    let collection = get_string_arg(args, "collection")?;
    let filters = get_object_arg(args, "filters")?;
    let updates = get_optional_object(args, "updates")?.unwrap_or_default();

    let result = session.manager().update(&collection, &filters, &updates);
    Ok(ResponseEnvelope::from_db_result(result, "update", &collection))
}

// ── Delete ───────────────────────────────────────────────────────────────

fn dispatch_delete(session: &McpSession, args: &Map<String, JsonValue>) -> Result<ResponseEnvelope> {
    session.check_write_access("delete_record")?;
    let collection = get_string_arg(args, "collection")?;
    let filters = get_object_arg(args, "filters")?;
    let soft = get_optional_bool(args, "soft_delete").unwrap_or(false);

    let result = session.manager().delete(&collection, &filters, soft);
    Ok(ResponseEnvelope::from_db_result(result, "delete", &collection))
}

// ── Search ───────────────────────────────────────────────────────────────

fn dispatch_search(session: &McpSession, args: &Map<String, JsonValue>) -> Result<ResponseEnvelope> {
    let collection = get_string_arg(args, "collection")?;
    let query = get_object_arg(args, "query")?;
    if query.is_empty() {
        return Err(McpError::InvalidArg {
            name: "query".to_string(),
            reason: "Query must be a non-empty object".to_string(),
        });
    }

    let result = session.manager().advanced_search(&collection, &query);
    if !result.success {
        return Ok(ResponseEnvelope::from_db_result(result, "search", &collection));
    }
    let records = match result.data {
        JsonValue::Array(records) => records,
        other => vec![other],
    };
    Ok(ResponseEnvelope::search_response(records, &collection, document_to_json(query)))
}
