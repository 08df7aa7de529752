//! Tool registry and dispatch.
//!
//! Exposes the five record tools. Every call, successful or not, produces a
//! [`ResponseEnvelope`]; only a tool name the registry does not advertise is
//! returned as an error.

pub mod records;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::error::{McpError, Result};
use crate::response::ResponseEnvelope;
use crate::session::McpSession;

/// One entry of the `tools/list` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name, e.g. `read_records`
    pub name: String,
    /// Shown to the client
    pub description: String,
    /// JSON Schema of the arguments object
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

impl ToolDef {
    pub fn new(name: &str, description: &str, input_schema: JsonValue) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// The tools a server advertises, keyed by name in listing order.
///
/// `tools/list` and `tools/call` both go through the registry, so a client can
/// only call what it was shown.
pub struct ToolRegistry {
    tools: IndexMap<String, ToolDef>,
}

impl ToolRegistry {
    /// Registry holding every record tool.
    pub fn new() -> Self {
        Self::with_tools(records::tools())
    }

    fn with_tools(defs: Vec<ToolDef>) -> Self {
        Self {
            tools: defs.into_iter().map(|def| (def.name.clone(), def)).collect(),
        }
    }

    /// Definitions in listing order.
    pub fn tools(&self) -> Vec<&ToolDef> {
        self.tools.values().collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDef> {
        self.tools.get(name)
    }

    /// Run an advertised tool. Unlisted names fail with `UNKNOWN_TOOL`.
    pub fn dispatch(
        &self,
        session: &McpSession,
        name: &str,
        args: Map<String, JsonValue>,
    ) -> Result<ResponseEnvelope> {
        if !self.tools.contains_key(name) {
            debug!(tool = name, "Tool is not registered");
            return Err(McpError::UnknownTool(name.to_string()));
        }
        records::dispatch(session, name, args)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the JSON Schema of a tool's arguments object.
///
/// ```ignore
/// schema!(object { required: { "collection": string }, optional: { "filters": object } })
/// ```
#[macro_export]
macro_rules! schema {
    (object {
        required: { $($req:literal : $req_ty:tt),* $(,)? }
        $(, optional: { $($opt:literal : $opt_ty:tt),* $(,)? })?
    }) => {{
        let mut props = serde_json::Map::new();
        $(props.insert($req.to_string(), schema!(@type $req_ty));)*
        $($(props.insert($opt.to_string(), schema!(@type $opt_ty));)*)?
        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": [$($req),*]
        })
    }};

    (@type string) => { serde_json::json!({"type": "string"}) };
    (@type boolean) => { serde_json::json!({"type": "boolean"}) };
    (@type object) => { serde_json::json!({"type": "object"}) };
}
