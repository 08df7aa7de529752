//! Error types for the MCP server.

use thiserror::Error;

use crate::query::QueryError;

/// Errors surfaced by the document store, the collection manager and the MCP layer.
#[derive(Debug, Error)]
pub enum McpError {
    /// Tool name not registered
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Required tool argument absent or of the wrong JSON type
    #[error("missing required argument: {0}")]
    MissingArg(String),

    /// Tool argument present but unusable
    #[error("invalid argument '{name}': {reason}")]
    InvalidArg {
        /// Argument name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Schema or safety-rule violation detected before touching the store
    #[error("{0}")]
    Validation(String),

    /// Malformed query expression
    #[error("Invalid query syntax: {0}")]
    QuerySyntax(String),

    /// Query could not be evaluated against a document (incomparable types)
    #[error("Query evaluation failed: {0}")]
    Evaluation(String),

    /// Backing file unreadable, corrupted or not writable
    #[error("storage error: {0}")]
    Storage(String),

    /// Mutating tool invoked against a read-only session
    #[error("access denied: {0} rejected, database is read-only")]
    ReadOnly(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invariant violation inside the server
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, McpError>;

impl McpError {
    /// Stable machine-readable error code, reported as `error_code` in response envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            McpError::UnknownTool(_) => "UNKNOWN_TOOL",
            McpError::MissingArg(_) => "MISSING_ARGUMENT",
            McpError::InvalidArg { .. } => "INVALID_ARGUMENT",
            McpError::Validation(_) => "VALIDATION_ERROR",
            McpError::QuerySyntax(_) => "QUERY_SYNTAX_ERROR",
            McpError::Evaluation(_) => "EVALUATION_ERROR",
            McpError::Storage(_) | McpError::Io(_) => "STORAGE_ERROR",
            McpError::ReadOnly(_) => "ACCESS_DENIED",
            McpError::Json(_) => "SERIALIZATION_ERROR",
            McpError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<QueryError> for McpError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::Syntax(msg) => McpError::QuerySyntax(msg),
            incomparable @ QueryError::Incomparable { .. } => {
                McpError::Evaluation(incomparable.to_string())
            }
        }
    }
}
