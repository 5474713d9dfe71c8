//! Remote procedure surface.
//!
//! Procedures are addressed by dotted name (`task.getAll`, `category.create`)
//! and take and return JSON. [`RpcHandler::call`] is the single dispatch
//! point used by the HTTP server; the typed functions in [`tasks`] and
//! [`categories`] back the in-process client transport.

pub mod categories;
pub mod tasks;

use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Whether a procedure reads or mutates state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureKind {
    Query,
    Mutation,
}

/// Description of one procedure, listed by `GET /api`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Procedure {
    pub name: &'static str,
    pub kind: ProcedureKind,
    pub description: &'static str,
}

const fn query(name: &'static str, description: &'static str) -> Procedure {
    Procedure {
        name,
        kind: ProcedureKind::Query,
        description,
    }
}

const fn mutation(name: &'static str, description: &'static str) -> Procedure {
    Procedure {
        name,
        kind: ProcedureKind::Mutation,
        description,
    }
}

/// Every procedure the server answers.
pub const PROCEDURES: &[Procedure] = &[
    query("category.getAll", "List categories ordered by name."),
    mutation(
        "category.create",
        "Create a category from {name}. The name is normalized; duplicates are rejected.",
    ),
    query("task.getAll", "List tasks in display order, with their category."),
    query("task.search", "List tasks whose title contains {query}, ignoring case."),
    query("task.getById", "Get one task by {id}."),
    mutation(
        "task.create",
        "Create a task from {title, description, categoryId?}. New tasks sort last.",
    ),
    mutation(
        "task.update",
        "Update {id, title, description}. categoryId: omitted keeps, null clears, number sets.",
    ),
    mutation("task.toggleComplete", "Set {completed} on task {id}."),
    mutation("task.delete", "Permanently delete task {id}."),
    mutation(
        "task.updateOrder",
        "Reassign positions 1..n following {orderedIds}, all or nothing.",
    ),
];

/// RPC handler that processes procedure calls against the store.
#[derive(Clone)]
pub struct RpcHandler {
    pub db: Arc<Database>,
}

impl RpcHandler {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get all available procedures.
    pub fn procedures(&self) -> &'static [Procedure] {
        PROCEDURES
    }

    /// Call a procedure by name.
    pub fn call(&self, name: &str, input: Value) -> ApiResult<Value> {
        debug!(procedure = name, "RPC call");

        let result = self.dispatch(name, input);
        if let Err(ref e) = result {
            warn!(procedure = name, code = ?e.code, "RPC call failed: {}", e);
        }
        result
    }

    fn dispatch(&self, name: &str, input: Value) -> ApiResult<Value> {
        match name {
            // Category procedures
            "category.getAll" => to_output(categories::get_all(&self.db)?),
            "category.create" => to_output(categories::create(&self.db, parse_input(input)?)?),

            // Task procedures
            "task.getAll" => to_output(tasks::get_all(&self.db)?),
            "task.search" => to_output(tasks::search(&self.db, parse_input(input)?)?),
            "task.getById" => to_output(tasks::get_by_id(&self.db, parse_input(input)?)?),
            "task.create" => to_output(tasks::create(&self.db, parse_input(input)?)?),
            "task.update" => to_output(tasks::update(&self.db, parse_input(input)?)?),
            "task.toggleComplete" => {
                to_output(tasks::toggle_complete(&self.db, parse_input(input)?)?)
            }
            "task.delete" => to_output(tasks::delete(&self.db, parse_input(input)?)?),
            "task.updateOrder" => to_output(tasks::update_order(&self.db, parse_input(input)?)?),

            _ => Err(ApiError::unknown_procedure(name)),
        }
    }
}

/// Deserialize a procedure input. A missing body is treated as an empty object.
pub fn parse_input<T: DeserializeOwned>(input: Value) -> ApiResult<T> {
    let input = match input {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    Ok(serde_json::from_value(input)?)
}

fn to_output<T: Serialize>(value: T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(ApiError::internal)
}
