//! MCP session management.
//!
//! Wraps the shared [`DatabaseManager`] with the access mode the server was started in.

use std::sync::Arc;

use crate::error::{McpError, Result};
use crate::manager::DatabaseManager;

/// MCP session state.
///
/// The manager is shared behind an `Arc` so library callers can keep a handle
/// (for seeding or inspection) while the server owns the session.
pub struct McpSession {
    /// Collection manager
    manager: Arc<DatabaseManager>,
    /// Whether mutating tools are rejected
    read_only: bool,
}

impl McpSession {
    /// Create a read-write session.
    pub fn new(manager: Arc<DatabaseManager>) -> Self {
        Self {
            manager,
            read_only: false,
        }
    }

    /// Create a session that rejects mutating tools.
    pub fn read_only(manager: Arc<DatabaseManager>) -> Self {
        Self {
            manager,
            read_only: true,
        }
    }

    /// Returns `true` if the session was opened in read-only mode.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Reject write operations when the session is read-only.
    pub fn check_write_access(&self, operation: &str) -> Result<()> {
        if self.read_only {
            return Err(McpError::ReadOnly(operation.to_string()));
        }
        Ok(())
    }

    /// Get a reference to the underlying manager.
    pub fn manager(&self) -> &DatabaseManager {
        &self.manager
    }
}
