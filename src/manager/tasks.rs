//! Task-centric helpers built on the generic manager operations.

use indexmap::IndexMap;
use serde_json::{json, Map, Value as JsonValue};
use tracing::{info, warn};

use super::{DatabaseManager, DbResult};
use crate::convert::{document_to_json, documents_to_json};
use crate::error::{McpError, Result};
use crate::query::QueryBuilder;
use crate::schema::TASK_STATUSES;
use crate::value::{Document, Value};

impl DatabaseManager {
    /// Tasks assigned to one user, optionally narrowed to a status.
    ///
    /// An unknown user is not an error: the result is empty with an explanatory message.
    pub fn get_tasks_by_user(&self, user_id: i64, status: Option<&str>) -> DbResult {
        let result = match self.try_tasks_by_user(user_id, status) {
            Ok(None) => {
                warn!(user_id, "User does not exist");
                DbResult::ok(
                    JsonValue::Array(Vec::new()),
                    format!("User with ID {} does not exist", user_id),
                    0,
                )
            }
            Ok(Some(tasks)) => {
                let count = tasks.len();
                info!(user_id, count, status = ?status, "Found tasks for user");
                DbResult::ok(
                    documents_to_json(tasks),
                    format!(
                        "Successfully retrieved {} tasks for user {}{}",
                        count,
                        user_id,
                        status_suffix(status)
                    ),
                    count,
                )
            }
            Err(e) => DbResult::failed(
                &format!("Failed to get tasks for user {}", user_id),
                &e,
                "Failed to retrieve user tasks",
                JsonValue::Array(Vec::new()),
            ),
        };
        result
            .with_meta("user_id", user_id)
            .with_meta("status_filter", status)
    }

    /// Task counts for one user, grouped by status and by priority.
    pub fn get_user_task_summary(&self, user_id: i64) -> DbResult {
        match self.try_tasks_by_user(user_id, None) {
            Ok(None) => DbResult::ok(
                json!({
                    "user_id": user_id,
                    "user_exists": false,
                    "total_tasks": 0,
                    "by_status": {},
                    "by_priority": {}
                }),
                format!("User with ID {} does not exist", user_id),
                0,
            ),
            Ok(Some(tasks)) => {
                let total = tasks.len();
                info!(user_id, total, "Generated task summary");
                DbResult::ok(
                    json!({
                        "user_id": user_id,
                        "user_exists": true,
                        "total_tasks": total,
                        "by_status": tally(&tasks, "status"),
                        "by_priority": tally(&tasks, "priority")
                    }),
                    format!("Successfully generated task summary for user {}", user_id),
                    total,
                )
            }
            Err(e) => DbResult::failed(
                &format!("Failed to generate task summary for user {}", user_id),
                &e,
                "Failed to generate task summary",
                JsonValue::Object(Map::new()),
            ),
        }
    }

    /// Tasks assigned to any of `user_ids`, grouped per user.
    ///
    /// Every requested id appears in `tasks_by_user`, even with no tasks.
    pub fn get_tasks_by_multiple_users(&self, user_ids: &[i64], status: Option<&str>) -> DbResult {
        match self.try_tasks_by_users(user_ids, status) {
            Ok(tasks) => {
                let total = tasks.len();
                let mut grouped: IndexMap<i64, Vec<JsonValue>> =
                    user_ids.iter().map(|id| (*id, Vec::new())).collect();
                for task in tasks {
                    if let Some(id) = task.get("assigned_to").and_then(Value::as_i64) {
                        if let Some(bucket) = grouped.get_mut(&id) {
                            bucket.push(document_to_json(task));
                        }
                    }
                }
                let tasks_by_user: Map<String, JsonValue> = grouped
                    .into_iter()
                    .map(|(id, tasks)| (id.to_string(), JsonValue::Array(tasks)))
                    .collect();
                DbResult::ok(
                    json!({
                        "tasks_by_user": tasks_by_user,
                        "total_tasks": total,
                        "user_ids": user_ids,
                        "status_filter": status
                    }),
                    format!("Successfully retrieved tasks for {} users", user_ids.len()),
                    total,
                )
            }
            Err(e) => DbResult::failed(
                "Failed to get tasks for multiple users",
                &e,
                "Failed to retrieve tasks for multiple users",
                JsonValue::Object(Map::new()),
            ),
        }
    }

    /// Tasks whose `assigned_to` is absent or null.
    pub fn get_unassigned_tasks(&self, status: Option<&str>) -> DbResult {
        match self.try_unassigned_tasks(status) {
            Ok(tasks) => {
                let count = tasks.len();
                DbResult::ok(
                    documents_to_json(tasks),
                    format!(
                        "Successfully retrieved {} unassigned tasks{}",
                        count,
                        status_suffix(status)
                    ),
                    count,
                )
                .with_meta("status_filter", status)
            }
            Err(e) => DbResult::failed(
                "Failed to get unassigned tasks",
                &e,
                "Failed to retrieve unassigned tasks",
                JsonValue::Array(Vec::new()),
            ),
        }
    }

    /// `None` when the user does not exist.
    fn try_tasks_by_user(&self, user_id: i64, status: Option<&str>) -> Result<Option<Vec<Document>>> {
        check_user_id(user_id)?;
        check_status(status)?;
        if !self.user_exists(user_id)? {
            return Ok(None);
        }
        let mut filter = QueryBuilder::field("assigned_to").equals(user_id);
        if let Some(status) = status {
            filter.insert("status".into(), Value::from(status));
        }
        self.find("tasks", Some(&filter)).map(Some)
    }

    fn try_tasks_by_users(&self, user_ids: &[i64], status: Option<&str>) -> Result<Vec<Document>> {
        if user_ids.is_empty() {
            return Err(McpError::Validation("user_ids must be a non-empty list".into()));
        }
        if user_ids.iter().any(|id| *id <= 0) {
            return Err(McpError::Validation(
                "All user_ids must be positive integers".into(),
            ));
        }
        check_status(status)?;

        let assigned = match user_ids {
            [single] => QueryBuilder::field("assigned_to").equals(*single),
            many => QueryBuilder::field("assigned_to")
                .in_list(many.iter().map(|id| Value::Int(*id)).collect()),
        };
        self.search_documents("tasks", &with_status(assigned, status))
    }

    fn try_unassigned_tasks(&self, status: Option<&str>) -> Result<Vec<Document>> {
        check_status(status)?;
        let unassigned = QueryBuilder::or(vec![
            QueryBuilder::field("assigned_to").exists(false),
            QueryBuilder::field("assigned_to").equals(Value::Null),
        ]);
        self.search_documents("tasks", &with_status(unassigned, status))
    }

    fn user_exists(&self, user_id: i64) -> Result<bool> {
        let filter = QueryBuilder::field("id").equals(user_id);
        Ok(!self.find("users", Some(&filter))?.is_empty())
    }
}

fn check_user_id(user_id: i64) -> Result<()> {
    if user_id <= 0 {
        return Err(McpError::Validation("user_id must be a positive integer".into()));
    }
    Ok(())
}

fn check_status(status: Option<&str>) -> Result<()> {
    match status {
        Some(s) if !TASK_STATUSES.contains(&s) => Err(McpError::Validation(format!(
            "Invalid status filter. Must be one of: {}",
            TASK_STATUSES.join(", ")
        ))),
        _ => Ok(()),
    }
}

fn with_status(query: Document, status: Option<&str>) -> Document {
    match status {
        Some(status) => QueryBuilder::and(vec![query, QueryBuilder::field("status").equals(status)]),
        None => query,
    }
}

fn status_suffix(status: Option<&str>) -> String {
    status
        .map(|s| format!(" with status '{}'", s))
        .unwrap_or_default()
}

/// Count documents per value of `field`; missing values count as "unknown".
fn tally(docs: &[Document], field: &str) -> Map<String, JsonValue> {
    let mut counts: IndexMap<String, u64> = IndexMap::new();
    for doc in docs {
        let key = doc
            .get(field)
            .and_then(Value::to_text)
            .unwrap_or_else(|| "unknown".to_string());
        *counts.entry(key).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(k, n)| (k, JsonValue::from(n)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> DatabaseManager {
        let manager = DatabaseManager::in_memory();
        manager.initialize_sample_data(false).unwrap();
        manager
    }

    #[test]
    fn tasks_by_user_with_status() {
        let manager = seeded();
        let r = manager.get_tasks_by_user(2, None);
        assert!(r.success);
        assert_eq!(r.count, 2);

        let r = manager.get_tasks_by_user(2, Some("pending"));
        assert_eq!(r.count, 1);
        assert_eq!(r.data[0]["title"], "Performance optimization");
        assert_eq!(r.metadata["status_filter"], "pending");
        assert!(r.message.ends_with("with status 'pending'"));
    }

    #[test]
    fn unknown_user_is_empty_success() {
        let r = seeded().get_tasks_by_user(99, None);
        assert!(r.success);
        assert_eq!(r.count, 0);
        assert_eq!(r.message, "User with ID 99 does not exist");
    }

    #[test]
    fn invalid_inputs_fail() {
        let manager = seeded();
        assert!(!manager.get_tasks_by_user(0, None).success);
        assert!(!manager.get_tasks_by_user(1, Some("done")).success);
        assert!(!manager.get_tasks_by_multiple_users(&[], None).success);
        assert!(!manager.get_tasks_by_multiple_users(&[1, -2], None).success);
        assert!(!manager.get_unassigned_tasks(Some("nope")).success);
    }

    #[test]
    fn summary_groups_by_status_and_priority() {
        let r = seeded().get_user_task_summary(1);
        assert!(r.success);
        assert_eq!(r.data["total_tasks"], 2);
        assert_eq!(r.data["by_status"]["completed"], 1);
        assert_eq!(r.data["by_status"]["pending"], 1);
        assert_eq!(r.data["by_priority"]["high"], 1);
        assert_eq!(r.data["by_priority"]["low"], 1);

        let missing = seeded().get_user_task_summary(42);
        assert_eq!(missing.data["user_exists"], false);
    }

    #[test]
    fn multiple_users_are_grouped() {
        let r = seeded().get_tasks_by_multiple_users(&[1, 2, 9], None);
        assert!(r.success);
        assert_eq!(r.count, 4);
        assert_eq!(r.data["tasks_by_user"]["1"].as_array().unwrap().len(), 2);
        assert_eq!(r.data["tasks_by_user"]["2"].as_array().unwrap().len(), 2);
        assert!(r.data["tasks_by_user"]["9"].as_array().unwrap().is_empty());

        let r = seeded().get_tasks_by_multiple_users(&[1, 2], Some("pending"));
        assert_eq!(r.count, 2);
    }

    #[test]
    fn unassigned_covers_missing_and_null() {
        let manager = seeded();
        assert_eq!(manager.get_unassigned_tasks(None).count, 0);

        let mut a = Document::new();
        a.insert("title".into(), Value::from("orphan"));
        manager.create("tasks", &a);
        let mut b = a.clone();
        b.insert("assigned_to".into(), Value::Null);
        b.insert("status".into(), Value::from("archived"));
        manager.create("tasks", &b);

        assert_eq!(manager.get_unassigned_tasks(None).count, 2);
        assert_eq!(manager.get_unassigned_tasks(Some("archived")).count, 1);
    }
}
