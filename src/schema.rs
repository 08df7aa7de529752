//! Collection names and per-collection validation rules.

use std::fmt;
use std::str::FromStr;

use crate::error::{McpError, Result};
use crate::value::{Document, Value};

/// Allowed task `status` values.
pub const TASK_STATUSES: [&str; 5] = ["pending", "in_progress", "completed", "cancelled", "archived"];

/// Allowed task `priority` values.
pub const TASK_PRIORITIES: [&str; 4] = ["low", "medium", "high", "urgent"];

/// Fields owned by the manager; never accepted in an update payload.
pub const PROTECTED_FIELDS: [&str; 2] = ["id", "created_at"];

/// One of the fixed collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// `users`
    Users,
    /// `tasks`
    Tasks,
    /// `products`
    Products,
}

impl Collection {
    /// All collections, in storage order.
    pub const ALL: [Collection; 3] = [Collection::Users, Collection::Tasks, Collection::Products];

    /// Collection name as stored and as accepted on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Tasks => "tasks",
            Collection::Products => "products",
        }
    }

    /// Validate a new document and fill defaults. Returns the document to store.
    pub fn validate_create(self, data: &Document) -> Result<Document> {
        if data.is_empty() {
            return Err(invalid("Data cannot be empty"));
        }
        let mut doc = data.clone();

        match data.get("id") {
            None | Some(Value::Null) => {}
            Some(Value::Int(id)) if *id > 0 => {}
            Some(_) => return Err(invalid("id must be a positive integer")),
        }

        match self {
            Collection::Users => {
                require_truthy(&doc, &["name", "email"])?;
                check_email(&doc["email"])?;
                if !doc.get("role").is_some_and(Value::is_truthy) {
                    doc.insert("role".into(), Value::from("User"));
                }
            }
            Collection::Tasks => {
                require_truthy(&doc, &["title"])?;
                doc.entry("status".to_string())
                    .or_insert_with(|| Value::from("pending"));
                doc.entry("priority".to_string())
                    .or_insert_with(|| Value::from("medium"));
                check_task_fields(&doc)?;
            }
            Collection::Products => {
                for field in ["name", "price"] {
                    if doc.get(field).map_or(true, Value::is_null) {
                        return Err(invalid(format!(
                            "Required field '{}' is missing or None",
                            field
                        )));
                    }
                }
                let price = normalize_price(&doc["price"])?;
                doc.insert("price".into(), Value::Float(price));
                doc.entry("in_stock".to_string())
                    .or_insert(Value::Bool(true));
                doc.entry("category".to_string())
                    .or_insert_with(|| Value::from("General"));
            }
        }
        Ok(doc)
    }

    /// Validate an update payload. Any protected field rejects the whole payload.
    pub fn validate_update(self, updates: &Document) -> Result<Document> {
        if updates.is_empty() {
            return Err(invalid("Updates cannot be empty"));
        }
        for field in PROTECTED_FIELDS {
            if updates.contains_key(field) {
                return Err(invalid(format!("Cannot update the '{}' field", field)));
            }
        }
        let mut patch = updates.clone();

        match self {
            Collection::Users => {
                if let Some(email) = patch.get("email").filter(|e| e.is_truthy()) {
                    check_email(email)?;
                }
            }
            Collection::Tasks => check_task_fields(&patch)?,
            Collection::Products => {
                if let Some(price) = patch.get("price") {
                    let price = normalize_price(price)?;
                    patch.insert("price".into(), Value::Float(price));
                }
            }
        }
        Ok(patch)
    }
}

impl FromStr for Collection {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self> {
        Collection::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| {
                invalid(format!(
                    "Invalid collection name: {}. Valid options: users, tasks, products",
                    s
                ))
            })
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn invalid(msg: impl Into<String>) -> McpError {
    McpError::Validation(msg.into())
}

fn require_truthy(doc: &Document, fields: &[&str]) -> Result<()> {
    for field in fields {
        if !doc.get(*field).is_some_and(Value::is_truthy) {
            return Err(invalid(format!(
                "Required field '{}' is missing or empty",
                field
            )));
        }
    }
    Ok(())
}

fn check_email(email: &Value) -> Result<()> {
    let valid = email.as_str().is_some_and(|e| {
        e.contains('@') && e.rsplit('@').next().is_some_and(|domain| domain.contains('.'))
    });
    if valid {
        Ok(())
    } else {
        Err(invalid("Invalid email format"))
    }
}

/// Checks status, priority and assigned_to where present.
fn check_task_fields(doc: &Document) -> Result<()> {
    if let Some(status) = doc.get("status") {
        if !status.as_str().is_some_and(|s| TASK_STATUSES.contains(&s)) {
            return Err(invalid(format!(
                "Invalid status. Must be one of: {}",
                TASK_STATUSES.join(", ")
            )));
        }
    }
    if let Some(priority) = doc.get("priority") {
        if !priority.as_str().is_some_and(|p| TASK_PRIORITIES.contains(&p)) {
            return Err(invalid(format!(
                "Invalid priority. Must be one of: {}",
                TASK_PRIORITIES.join(", ")
            )));
        }
    }
    match doc.get("assigned_to") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Int(id)) if *id > 0 => Ok(()),
        Some(_) => Err(invalid("assigned_to must be a positive integer (user ID)")),
    }
}

/// Accepts numbers and numeric strings; the stored price is always a float.
fn normalize_price(price: &Value) -> Result<f64> {
    let parsed = match price {
        Value::Int(_) | Value::Float(_) => price.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let price = parsed
        .filter(|p| p.is_finite())
        .ok_or_else(|| invalid("Price must be a valid number"))?;
    if price < 0.0 {
        return Err(invalid("Price cannot be negative"));
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::json_to_value;
    use serde_json::json;

    fn doc(json: serde_json::Value) -> Document {
        match json_to_value(json) {
            Value::Object(o) => o,
            other => panic!("expected object, got {:?}", other),
        }
    }

    fn rejection(result: Result<Document>) -> String {
        match result {
            Err(McpError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn collection_names() {
        assert_eq!("tasks".parse::<Collection>().unwrap(), Collection::Tasks);
        let err = "orders".parse::<Collection>().unwrap_err();
        assert!(err.to_string().contains("Invalid collection name"));
    }

    #[test]
    fn user_defaults_and_email() {
        let user = Collection::Users
            .validate_create(&doc(json!({"name": "Eve", "email": "eve@example.com"})))
            .unwrap();
        assert_eq!(user["role"], Value::from("User"));

        let msg = rejection(
            Collection::Users.validate_create(&doc(json!({"name": "Eve", "email": "eve@example"}))),
        );
        assert_eq!(msg, "Invalid email format");
        let msg = rejection(Collection::Users.validate_create(&doc(json!({"name": "", "email": "a@b.c"}))));
        assert!(msg.contains("'name'"));
    }

    #[test]
    fn task_defaults_and_enums() {
        let task = Collection::Tasks
            .validate_create(&doc(json!({"title": "Ship it"})))
            .unwrap();
        assert_eq!(task["status"], Value::from("pending"));
        assert_eq!(task["priority"], Value::from("medium"));

        rejection(Collection::Tasks.validate_create(&doc(json!({"title": "x", "status": "done"}))));
        rejection(Collection::Tasks.validate_create(&doc(json!({"title": "x", "priority": "p0"}))));
        rejection(Collection::Tasks.validate_create(&doc(json!({"title": "x", "assigned_to": 0}))));
        rejection(Collection::Tasks.validate_create(&doc(json!({"title": "x", "assigned_to": "1"}))));
        assert!(Collection::Tasks
            .validate_create(&doc(json!({"title": "x", "assigned_to": null})))
            .is_ok());
    }

    #[test]
    fn product_price_rules() {
        let product = Collection::Products
            .validate_create(&doc(json!({"name": "Pen", "price": "2.50"})))
            .unwrap();
        assert_eq!(product["price"], Value::Float(2.5));
        assert_eq!(product["in_stock"], Value::Bool(true));
        assert_eq!(product["category"], Value::from("General"));

        let free = Collection::Products
            .validate_create(&doc(json!({"name": "Sticker", "price": 0})))
            .unwrap();
        assert_eq!(free["price"], Value::Float(0.0));

        assert_eq!(
            rejection(Collection::Products.validate_create(&doc(json!({"name": "Pen", "price": -1})))),
            "Price cannot be negative"
        );
        assert_eq!(
            rejection(Collection::Products.validate_create(&doc(json!({"name": "Pen", "price": "abc"})))),
            "Price must be a valid number"
        );
        rejection(Collection::Products.validate_create(&doc(json!({"name": "Pen"}))));
    }

    #[test]
    fn explicit_id_must_be_positive() {
        rejection(Collection::Tasks.validate_create(&doc(json!({"title": "x", "id": -3}))));
        assert!(Collection::Tasks
            .validate_create(&doc(json!({"title": "x", "id": 7})))
            .is_ok());
    }

    #[test]
    fn updates_reject_protected_fields() {
        let msg = rejection(Collection::Users.validate_update(&doc(json!({"name": "X", "id": 9}))));
        assert_eq!(msg, "Cannot update the 'id' field");
        let msg = rejection(
            Collection::Tasks.validate_update(&doc(json!({"created_at": "2024-01-01T00:00:00Z"}))),
        );
        assert_eq!(msg, "Cannot update the 'created_at' field");
        rejection(Collection::Tasks.validate_update(&Document::new()));
    }

    #[test]
    fn updates_validate_present_fields_only() {
        assert!(Collection::Tasks
            .validate_update(&doc(json!({"description": "more"})))
            .is_ok());
        rejection(Collection::Tasks.validate_update(&doc(json!({"status": "done"}))));
        let patch = Collection::Products
            .validate_update(&doc(json!({"price": 5})))
            .unwrap();
        assert_eq!(patch["price"], Value::Float(5.0));
        rejection(Collection::Users.validate_update(&doc(json!({"email": "nope"}))));
    }
}
