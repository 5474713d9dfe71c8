//! Tests for JSON dispatch through the RPC handler.

use serde_json::{Value, json};
use std::sync::Arc;
use taskboard::db::Database;
use taskboard::error::ErrorCode;
use taskboard::rpc::{PROCEDURES, RpcHandler};

fn setup() -> RpcHandler {
    let db = Database::open_in_memory().expect("Failed to create in-memory database");
    RpcHandler::new(Arc::new(db))
}

fn create(rpc: &RpcHandler, title: &str, category_id: Option<i64>) -> Value {
    let mut input = json!({"title": title, "description": "d"});
    if let Some(id) = category_id {
        input["categoryId"] = json!(id);
    }
    rpc.call("task.create", input).unwrap()
}

#[test]
fn every_listed_procedure_dispatches() {
    let rpc = setup();
    for procedure in PROCEDURES {
        if let Err(e) = rpc.call(procedure.name, json!({})) {
            assert_ne!(
                e.message,
                format!("Unknown procedure: {}", procedure.name),
                "{} is listed but not dispatched",
                procedure.name
            );
        }
    }
}

#[test]
fn unknown_procedure_is_not_found() {
    let rpc = setup();
    let err = rpc.call("task.explode", Value::Null).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[test]
fn query_procedures_accept_missing_input() {
    let rpc = setup();
    assert_eq!(rpc.call("task.getAll", Value::Null).unwrap(), json!([]));
    assert_eq!(rpc.call("category.getAll", Value::Null).unwrap(), json!([]));
    assert_eq!(rpc.call("task.search", Value::Null).unwrap(), json!([]));
}

#[test]
fn created_task_uses_camel_case_fields() {
    let rpc = setup();
    let task = create(&rpc, "Buy milk", None);
    assert_eq!(task["title"], "Buy milk");
    assert_eq!(task["completed"], false);
    assert!(task["createdAt"].is_i64());
    assert!(task["categoryId"].is_null());
    assert!(task["category"].is_null());
}

#[test]
fn category_create_normalizes_and_conflicts() {
    let rpc = setup();
    let category = rpc
        .call("category.create", json!({"name": " groceries "}))
        .unwrap();
    assert_eq!(category["name"], "Groceries");

    let err = rpc
        .call("category.create", json!({"name": "GROCERIES"}))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Conflict);

    let err = rpc.call("category.create", json!({"name": ""})).unwrap_err();
    assert_eq!(err.code, ErrorCode::BadRequest);
}

#[test]
fn update_distinguishes_omitted_and_null_category() {
    let rpc = setup();
    let category = rpc.call("category.create", json!({"name": "home"})).unwrap();
    let category_id = category["id"].as_i64().unwrap();
    let task = create(&rpc, "t", Some(category_id));
    let id = task["id"].clone();

    let kept = rpc
        .call(
            "task.update",
            json!({"id": id, "title": "t2", "description": "d2"}),
        )
        .unwrap();
    assert_eq!(kept["categoryId"], json!(category_id));
    assert_eq!(kept["category"]["name"], "Home");

    let cleared = rpc
        .call(
            "task.update",
            json!({"id": id, "title": "t3", "description": "d3", "categoryId": null}),
        )
        .unwrap();
    assert!(cleared["categoryId"].is_null());
    assert!(cleared["category"].is_null());
}

#[test]
fn delete_returns_deleted_id() {
    let rpc = setup();
    let task = create(&rpc, "t", None);
    let output = rpc
        .call("task.delete", json!({"id": task["id"]}))
        .unwrap();
    assert_eq!(output, json!({"success": true, "deletedId": task["id"]}));

    let err = rpc.call("task.getById", json!({"id": task["id"]})).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[test]
fn update_order_reports_success_and_failure() {
    let rpc = setup();
    let a = create(&rpc, "a", None)["id"].as_i64().unwrap();
    let b = create(&rpc, "b", None)["id"].as_i64().unwrap();

    let ok = rpc
        .call("task.updateOrder", json!({"orderedIds": [b, a]}))
        .unwrap();
    assert_eq!(ok, json!({"success": true}));

    let all = rpc.call("task.getAll", Value::Null).unwrap();
    assert_eq!(all[0]["id"], json!(b));
    assert_eq!(all[0]["order"], json!(1.0));

    let err = rpc
        .call("task.updateOrder", json!({"orderedIds": [a, 12345]}))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InternalServerError);
}

#[test]
fn wrong_input_shape_is_bad_request() {
    let rpc = setup();
    let err = rpc
        .call("task.toggleComplete", json!({"id": "seven", "completed": true}))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BadRequest);

    let err = rpc.call("task.getById", json!({})).unwrap_err();
    assert_eq!(err.code, ErrorCode::BadRequest);
}
