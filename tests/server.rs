//! JSON-RPC round trips through the MCP server.

use std::sync::Arc;

use docstore_mcp::response::validate_structure;
use docstore_mcp::{DatabaseManager, McpServer, McpSession};
use serde_json::{json, Value as JsonValue};

fn seeded_server(dir: &tempfile::TempDir) -> McpServer {
    let manager = Arc::new(DatabaseManager::open(dir.path().join("mcp_server.json")).unwrap());
    manager.initialize_sample_data(false).unwrap();
    McpServer::new(McpSession::new(manager))
}

/// Calls a tool and returns the decoded envelope plus the isError flag.
fn call(server: &McpServer, id: u64, tool: &str, arguments: JsonValue) -> (JsonValue, bool) {
    let request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": tool, "arguments": arguments }
    });
    let line = server.handle_line(&request.to_string()).unwrap();
    let response: JsonValue = serde_json::from_str(&line).unwrap();
    assert_eq!(response["id"], id);
    let result = &response["result"];
    let text = result["content"][0]["text"].as_str().unwrap();
    let envelope: JsonValue = serde_json::from_str(text).unwrap();
    assert!(validate_structure(&envelope), "bad envelope: {}", envelope);
    (envelope, result["isError"].as_bool().unwrap())
}

#[test]
fn crud_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let server = seeded_server(&dir);

    let (env, is_error) = call(
        &server,
        1,
        "create_record",
        json!({"collection": "products", "data": {"name": "USB Hub", "price": "24.50"}}),
    );
    assert!(!is_error);
    assert_eq!(env["data"]["id"], 6);
    assert_eq!(env["data"]["price"], 24.5);
    assert_eq!(env["message"], "Record created successfully in products");

    let (env, _) = call(
        &server,
        2,
        "update_record",
        json!({"collection": "products", "filters": {"id": 6}, "updates": {"in_stock": false}}),
    );
    assert_eq!(env["count"], 1);
    assert_eq!(env["data"][0]["in_stock"], false);

    let (env, _) = call(
        &server,
        3,
        "read_records",
        json!({"collection": "products", "filters": {"in_stock": false}}),
    );
    assert_eq!(env["count"], 2);

    let (env, _) = call(
        &server,
        4,
        "delete_record",
        json!({"collection": "products", "filters": {"name": {"contains": "USB"}}}),
    );
    assert_eq!(env["count"], 1);
    assert_eq!(env["data"][0]["name"], "USB Hub");

    let (env, _) = call(&server, 5, "read_records", json!({"collection": "products"}));
    assert_eq!(env["count"], 5);
}

#[test]
fn failures_are_error_envelopes() {
    let dir = tempfile::tempdir().unwrap();
    let server = seeded_server(&dir);

    let (env, is_error) = call(
        &server,
        1,
        "update_record",
        json!({"collection": "users", "filters": {}, "updates": {"role": "Admin"}}),
    );
    assert!(is_error);
    assert_eq!(env["success"], false);
    assert_eq!(env["error_code"], "VALIDATION_ERROR");
    assert!(env["error"].as_str().unwrap().contains("Filters are required"));

    let (env, is_error) = call(
        &server,
        2,
        "search_records",
        json!({"collection": "tasks", "query": {"$or": {"status": "pending"}}}),
    );
    assert!(is_error);
    assert_eq!(env["error_code"], "QUERY_SYNTAX_ERROR");

    let (env, is_error) = call(&server, 3, "read_records", json!({"collection": 42}));
    assert!(is_error);
    assert_eq!(env["error_code"], "MISSING_ARGUMENT");
}

#[test]
fn zero_matches_are_not_errors() {
    let dir = tempfile::tempdir().unwrap();
    let server = seeded_server(&dir);
    let (env, is_error) = call(
        &server,
        1,
        "delete_record",
        json!({"collection": "tasks", "filters": {"assigned_to": 99}}),
    );
    assert!(!is_error);
    assert_eq!(env["count"], 0);
    assert_eq!(
        env["message"],
        "No records found matching the specified criteria in tasks"
    );
}

#[test]
fn read_only_server_still_reads() {
    let dir = tempfile::tempdir().unwrap();
    let manager = Arc::new(DatabaseManager::open(dir.path().join("db.json")).unwrap());
    manager.initialize_sample_data(false).unwrap();
    let server = McpServer::new(McpSession::read_only(manager));

    let (env, is_error) = call(
        &server,
        1,
        "delete_record",
        json!({"collection": "users", "filters": {"id": 1}}),
    );
    assert!(is_error);
    assert_eq!(env["error_code"], "ACCESS_DENIED");

    let (env, is_error) = call(&server, 2, "read_records", json!({"collection": "users"}));
    assert!(!is_error);
    assert_eq!(env["count"], 4);
}
