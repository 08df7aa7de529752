//! # docstore-mcp
//!
//! MCP (Model Context Protocol) server exposing CRUD tools over an embedded JSON
//! document store.
//!
//! The store holds three fixed collections (`users`, `tasks`, `products`) in a
//! single JSON file. Each collection has its own validation rules, integer ids
//! are assigned sequentially, and every write rewrites the file.
//!
//! ## Tools
//!
//! `create_record`, `read_records`, `update_record`, `delete_record`, `search_records`
//!
//! Filters and search queries use a small expression language: field equality,
//! operator objects (`{"price": {"gte": 100}}`) and the logical combinators
//! `$and`, `$or` and `$not`. See [`query`].
//!
//! ## Usage
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "docstore": {
//!       "command": "/path/to/docstore-mcp",
//!       "args": ["--db", "/path/to/data/mcp_server.json"]
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! ```
//! use std::sync::Arc;
//! use docstore_mcp::{DatabaseManager, McpServer, McpSession};
//!
//! let manager = Arc::new(DatabaseManager::in_memory());
//! manager.initialize_sample_data(false).unwrap();
//!
//! let server = McpServer::new(McpSession::new(manager));
//! let reply = server
//!     .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
//!     .unwrap();
//! assert!(reply.contains("\"result\""));
//! ```

#![warn(missing_docs)]

mod convert;
mod error;
pub mod manager;
pub mod query;
pub mod response;
pub mod schema;
mod server;
mod session;
pub mod store;
mod tools;
pub mod value;

pub use convert::{document_to_json, json_to_document, json_to_value, value_to_json};
pub use error::{McpError, Result};
pub use manager::{DatabaseManager, DbResult, SeedCounts};
pub use response::ResponseEnvelope;
pub use server::{JsonRpcRequest, JsonRpcResponse, McpServer};
pub use session::McpSession;
pub use tools::{ToolDef, ToolRegistry};
pub use value::{Document, Value};
