//! MCP server over stdio.
//!
//! Newline-delimited JSON-RPC 2.0: one request per line on stdin, one response
//! per line on stdout. Notifications get no response. Logging goes to stderr.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::error::{McpError, Result};
use crate::session::McpSession;
use crate::tools::ToolRegistry;

/// MCP protocol revision announced in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC error codes.
pub mod codes {
    /// Invalid JSON was received
    pub const PARSE_ERROR: i64 = -32700;
    /// Not a valid request object
    pub const INVALID_REQUEST: i64 = -32600;
    /// Method does not exist
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Invalid method parameters
    pub const INVALID_PARAMS: i64 = -32602;
}

/// An incoming JSON-RPC request or notification.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version, must be "2.0"
    pub jsonrpc: String,
    /// Request id; absent for notifications
    #[serde(default)]
    pub id: Option<JsonValue>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: Option<JsonValue>,
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i64,
    /// Error message
    pub message: String,
}

/// An outgoing JSON-RPC response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0"
    pub jsonrpc: &'static str,
    /// Id of the request being answered
    pub id: JsonValue,
    /// Result on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    /// Error on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Successful response.
    pub fn success(id: JsonValue, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response.
    pub fn error(id: JsonValue, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// MCP server bound to one session.
pub struct McpServer {
    session: McpSession,
    registry: ToolRegistry,
}

impl McpServer {
    /// Create a server for a session.
    pub fn new(session: McpSession) -> Self {
        Self {
            session,
            registry: ToolRegistry::new(),
        }
    }

    /// Serve requests from stdin until EOF.
    pub async fn run(&self) -> Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(stdin).lines();

        info!("MCP server listening on stdio");
        while let Some(line) = lines.next_line().await? {
            if let Some(reply) = self.handle_line(&line) {
                stdout.write_all(reply.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle one raw input line. Returns the serialized response, if any.
    pub fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<JsonValue>(line) {
            Err(e) => {
                warn!(error = %e, "Unparsable JSON-RPC message");
                Some(JsonRpcResponse::error(
                    JsonValue::Null,
                    codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
            Ok(raw) => {
                let id = raw.get("id").cloned().unwrap_or(JsonValue::Null);
                match serde_json::from_value::<JsonRpcRequest>(raw) {
                    Ok(request) => self.handle_request(request),
                    Err(e) => Some(JsonRpcResponse::error(
                        id,
                        codes::INVALID_REQUEST,
                        format!("Invalid request: {}", e),
                    )),
                }
            }
        };

        response.and_then(|r| serde_json::to_string(&r).ok())
    }

    /// Handle one parsed request. Notifications produce `None`.
    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "Received request");
        let Some(id) = request.id else {
            if request.method != "notifications/initialized" {
                debug!(method = %request.method, "Ignoring notification");
            }
            return None;
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                codes::INVALID_REQUEST,
                "jsonrpc must be \"2.0\"",
            ));
        }

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": self.registry.tools() })),
            "tools/call" => match self.call_tool(request.params) {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(e) => JsonRpcResponse::error(id, codes::INVALID_PARAMS, e.to_string()),
            },
            other => JsonRpcResponse::error(
                id,
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        };
        Some(response)
    }

    fn initialize_result(&self) -> JsonValue {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }
        })
    }

    fn call_tool(&self, params: Option<JsonValue>) -> Result<JsonValue> {
        let mut params = match params {
            Some(JsonValue::Object(map)) => map,
            _ => return Err(McpError::MissingArg("params".to_string())),
        };
        let name = match params.remove("name") {
            Some(JsonValue::String(name)) => name,
            _ => return Err(McpError::MissingArg("name".to_string())),
        };
        let args = match params.remove("arguments") {
            Some(JsonValue::Object(args)) => args,
            None | Some(JsonValue::Null) => Map::new(),
            Some(_) => {
                return Err(McpError::InvalidArg {
                    name: "arguments".to_string(),
                    reason: "Expected an object".to_string(),
                })
            }
        };

        let envelope = self.registry.dispatch(&self.session, &name, args)?;
        info!(tool = %name, success = envelope.success, count = envelope.count, "Tool call finished");
        Ok(json!({
            "content": [{ "type": "text", "text": envelope.to_json_string() }],
            "isError": !envelope.success,
        }))
    }
}
