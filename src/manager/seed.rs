//! Sample data for a fresh database.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tracing::info;

use super::DatabaseManager;
use crate::convert::json_to_value;
use crate::error::Result;
use crate::schema::Collection;
use crate::value::{Document, Value};

/// Documents inserted per collection by [`DatabaseManager::initialize_sample_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedCounts {
    /// Users inserted
    pub users: usize,
    /// Tasks inserted
    pub tasks: usize,
    /// Products inserted
    pub products: usize,
}

impl DatabaseManager {
    /// Insert sample documents into every empty collection.
    ///
    /// Collections that already hold data are left alone unless `force_reset`
    /// is set, in which case all three are cleared first.
    pub fn initialize_sample_data(&self, force_reset: bool) -> Result<SeedCounts> {
        let mut store = self.store.write();
        if force_reset {
            for c in Collection::ALL {
                store.truncate(c.name())?;
            }
            info!("Cleared existing data from all collections");
        }

        let mut counts = SeedCounts::default();
        for c in Collection::ALL {
            if !store.is_empty(c.name()) {
                info!(collection = c.name(), "Collection already has data, skipping seed");
                continue;
            }
            let docs = sample_documents(c);
            let n = docs.len();
            store.insert_many(c.name(), docs)?;
            info!(collection = c.name(), count = n, "Inserted sample records");
            match c {
                Collection::Users => counts.users = n,
                Collection::Tasks => counts.tasks = n,
                Collection::Products => counts.products = n,
            }
        }
        Ok(counts)
    }
}

/// Sample documents for one collection, with fixed ids and timestamps.
pub fn sample_documents(c: Collection) -> Vec<Document> {
    let rows = match c {
        Collection::Users => sample_users(),
        Collection::Tasks => sample_tasks(),
        Collection::Products => sample_products(),
    };
    rows.into_iter()
        .filter_map(|row| match json_to_value(row) {
            Value::Object(doc) => Some(doc),
            _ => None,
        })
        .collect()
}

fn sample_users() -> Vec<JsonValue> {
    vec![
        json!({"id": 1, "name": "Alice Johnson", "email": "alice.johnson@example.com",
               "role": "Project Manager", "created_at": "2024-01-15T09:00:00Z"}),
        json!({"id": 2, "name": "Bob Smith", "email": "bob.smith@example.com",
               "role": "Software Developer", "created_at": "2024-01-16T10:30:00Z"}),
        json!({"id": 3, "name": "Carol Davis", "email": "carol.davis@example.com",
               "role": "QA Engineer", "created_at": "2024-01-17T14:15:00Z"}),
        json!({"id": 4, "name": "David Wilson", "email": "david.wilson@example.com",
               "role": "DevOps Engineer", "created_at": "2024-01-18T11:45:00Z"}),
    ]
}

fn sample_tasks() -> Vec<JsonValue> {
    vec![
        json!({"id": 1, "title": "Implement user authentication",
               "description": "Create login and registration functionality with JWT tokens",
               "assigned_to": 2, "status": "in_progress", "priority": "high",
               "created_at": "2024-01-20T09:00:00Z", "due_date": "2024-02-15T17:00:00Z"}),
        json!({"id": 2, "title": "Design database schema",
               "description": "Create comprehensive database design for the application",
               "assigned_to": 1, "status": "completed", "priority": "high",
               "created_at": "2024-01-18T10:00:00Z", "due_date": "2024-01-25T17:00:00Z"}),
        json!({"id": 3, "title": "Write unit tests for API endpoints",
               "description": "Create comprehensive test suite for all REST API endpoints",
               "assigned_to": 3, "status": "pending", "priority": "medium",
               "created_at": "2024-01-22T11:30:00Z", "due_date": "2024-02-20T17:00:00Z"}),
        json!({"id": 4, "title": "Set up CI/CD pipeline",
               "description": "Configure automated testing and deployment pipeline",
               "assigned_to": 4, "status": "in_progress", "priority": "medium",
               "created_at": "2024-01-21T14:00:00Z", "due_date": "2024-02-10T17:00:00Z"}),
        json!({"id": 5, "title": "Create user documentation",
               "description": "Write comprehensive user guide and API documentation",
               "assigned_to": 1, "status": "pending", "priority": "low",
               "created_at": "2024-01-23T16:00:00Z", "due_date": "2024-03-01T17:00:00Z"}),
        json!({"id": 6, "title": "Performance optimization",
               "description": "Optimize database queries and API response times",
               "assigned_to": 2, "status": "pending", "priority": "medium",
               "created_at": "2024-01-24T13:00:00Z", "due_date": "2024-02-28T17:00:00Z"}),
    ]
}

fn sample_products() -> Vec<JsonValue> {
    vec![
        json!({"id": 1, "name": "Wireless Bluetooth Headphones",
               "description": "High-quality wireless headphones with noise cancellation",
               "price": 199.99, "category": "Electronics", "in_stock": true,
               "created_at": "2024-01-10T12:00:00Z"}),
        json!({"id": 2, "name": "Ergonomic Office Chair",
               "description": "Comfortable office chair with lumbar support and adjustable height",
               "price": 349.99, "category": "Furniture", "in_stock": true,
               "created_at": "2024-01-11T15:30:00Z"}),
        json!({"id": 3, "name": "Mechanical Keyboard",
               "description": "RGB backlit mechanical keyboard with blue switches",
               "price": 129.99, "category": "Electronics", "in_stock": false,
               "created_at": "2024-01-12T10:15:00Z"}),
        json!({"id": 4, "name": "Standing Desk Converter",
               "description": "Adjustable standing desk converter for healthier work habits",
               "price": 299.99, "category": "Furniture", "in_stock": true,
               "created_at": "2024-01-13T14:45:00Z"}),
        json!({"id": 5, "name": "4K Webcam",
               "description": "Ultra HD webcam with auto-focus and built-in microphone",
               "price": 89.99, "category": "Electronics", "in_stock": true,
               "created_at": "2024-01-14T11:20:00Z"}),
    ]
}
