//! Manager behaviour against a file-backed store.

use docstore_mcp::query::QueryBuilder;
use docstore_mcp::{json_to_value, DatabaseManager, Document, Value};
use serde_json::json;

fn doc(json: serde_json::Value) -> Document {
    match json_to_value(json) {
        Value::Object(o) => o,
        other => panic!("expected object, got {:?}", other),
    }
}

#[test]
fn writes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("mcp_server.json");

    {
        let manager = DatabaseManager::open(&path).unwrap();
        let r = manager.create("tasks", &doc(json!({"title": "persist me", "priority": "urgent"})));
        assert!(r.success);
        let r = manager.update(
            "tasks",
            &doc(json!({"title": "persist me"})),
            &doc(json!({"status": "completed"})),
        );
        assert_eq!(r.count, 1);
        manager.close().unwrap();
    }

    let manager = DatabaseManager::open(&path).unwrap();
    let tasks = manager.find("tasks", None).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["status"], Value::from("completed"));
    assert_eq!(tasks[0]["id"], Value::Int(1));

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["tasks"][0]["title"], "persist me");
}

#[test]
fn seeded_database_queries() {
    let dir = tempfile::tempdir().unwrap();
    let manager = DatabaseManager::open(dir.path().join("db.json")).unwrap();
    manager.initialize_sample_data(false).unwrap();

    let query = QueryBuilder::and(vec![
        QueryBuilder::field("category").equals("Furniture"),
        QueryBuilder::field("price").less_than(300),
    ]);
    let r = manager.advanced_search("products", &query);
    assert_eq!(r.count, 1);
    assert_eq!(r.data[0]["name"], "Standing Desk Converter");

    let r = manager.read("users", Some(&doc(json!({"email": {"endswith": "example.com"}}))));
    assert_eq!(r.count, 4);

    let r = manager.read("tasks", Some(&doc(json!({"due_date": {"between": ["2024-02-01", "2024-02-16"]}}))));
    assert_eq!(r.count, 2);

    let r = manager.read("tasks", Some(&doc(json!({"$not": {"status": {"in": ["pending", "completed"]}}}))));
    let titles: Vec<&str> = r.data.as_array().unwrap().iter().map(|t| t["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["Implement user authentication", "Set up CI/CD pipeline"]);
}

#[test]
fn missing_fields_never_match_comparisons() {
    let manager = DatabaseManager::in_memory();
    manager.create("tasks", &doc(json!({"title": "a", "estimate": 3})));
    manager.create("tasks", &doc(json!({"title": "b"})));

    assert_eq!(manager.read("tasks", Some(&doc(json!({"estimate": {"ne": 5}})))).count, 1);
    assert_eq!(manager.read("tasks", Some(&doc(json!({"estimate": {"exists": false}})))).count, 1);
    assert_eq!(manager.read("tasks", Some(&doc(json!({"$not": {"estimate": {"gt": 1}}})))).count, 1);
}

#[test]
fn failed_validation_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    let manager = DatabaseManager::open(&path).unwrap();
    manager.initialize_sample_data(false).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    assert!(!manager.create("products", &doc(json!({"name": "Bad", "price": -5}))).success);
    assert!(!manager
        .update("users", &doc(json!({"id": 1})), &doc(json!({"role": "Admin", "created_at": "x"})))
        .success);
    assert!(!manager.delete("users", &Document::new(), false).success);

    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn corrupted_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(&path, "[1, 2").unwrap();
    let err = DatabaseManager::open(&path).err().unwrap();
    assert_eq!(err.code(), "STORAGE_ERROR");
}

#[test]
fn failed_write_does_not_leave_ghost_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    let manager = DatabaseManager::open(&path).unwrap();
    assert!(manager.create("tasks", &doc(json!({"title": "kept"}))).success);

    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    assert!(!manager.create("tasks", &doc(json!({"title": "ghost"}))).success);
    assert!(!manager
        .update("tasks", &doc(json!({"title": "kept"})), &doc(json!({"status": "completed"})))
        .success);
    assert!(!manager.delete("tasks", &doc(json!({"title": "kept"})), false).success);

    let tasks = manager.find("tasks", None).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], Value::from("kept"));
    assert!(tasks[0].get("status").map_or(true, |s| s != &Value::from("completed")));
}

#[test]
fn logical_operator_wins_over_sibling_fields() {
    let manager = DatabaseManager::in_memory();
    manager.create("tasks", &doc(json!({"title": "a", "status": "pending"})));
    manager.create("tasks", &doc(json!({"title": "b", "status": "completed"})));

    let r = manager.read("tasks", Some(&doc(json!({"$or": [{"title": "b"}], "status": "pending"}))));
    assert!(r.success);
    assert_eq!(r.count, 1);
    assert_eq!(r.data[0]["title"], "b");
}
