//! Task CRUD and ordering operations.

use super::categories::get_category_internal;
use super::{Database, now_ms};
use crate::error::{ApiError, ErrorCode};
use crate::types::{Category, CreateTaskInput, Task, UpdateTaskInput};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashSet;
use tracing::{debug, info};

const TASK_SELECT: &str = "SELECT t.id, t.title, t.description, t.completed, t.sort_order,
        t.category_id, t.created_at, c.name AS category_name
     FROM tasks t
     LEFT JOIN categories c ON c.id = t.category_id";

const TASK_ORDER: &str = "ORDER BY t.sort_order ASC, t.created_at ASC, t.id ASC";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let category_id: Option<i64> = row.get("category_id")?;
    let category_name: Option<String> = row.get("category_name")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        completed: row.get("completed")?,
        order: row.get("sort_order")?,
        category_id,
        category: category_id
            .zip(category_name)
            .map(|(id, name)| Category { id, name }),
        created_at: row.get("created_at")?,
    })
}

/// Trim a required text field, rejecting blank values.
fn validate_text(field: &str, value: &str) -> std::result::Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::missing_field(field));
    }
    Ok(trimmed.to_string())
}

/// Sort key for a new task: the creation timestamp, bumped past the current
/// maximum so new tasks always sort last.
fn next_order(now: i64, current_max: Option<f64>) -> f64 {
    let now = now as f64;
    match current_max {
        Some(max) if max >= now => max + 1.0,
        _ => now,
    }
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let sql = format!("{} WHERE t.id = ?1", TASK_SELECT);
    let task = conn
        .query_row(&sql, params![task_id], parse_task_row)
        .optional()?;
    Ok(task)
}

fn require_task(conn: &Connection, task_id: i64) -> Result<Task> {
    get_task_internal(conn, task_id)?.ok_or_else(|| ApiError::task_not_found(task_id).into())
}

fn require_category(conn: &Connection, category_id: i64) -> Result<()> {
    match get_category_internal(conn, category_id)? {
        Some(_) => Ok(()),
        None => Err(ApiError::category_not_found(category_id).into()),
    }
}

impl Database {
    /// Create a new task, sorted after every existing one.
    pub fn create_task(&self, input: &CreateTaskInput) -> Result<Task> {
        let title = validate_text("title", &input.title)?;
        let description = validate_text("description", &input.description)?;
        let now = now_ms();

        self.with_transaction(|tx| {
            if let Some(category_id) = input.category_id {
                require_category(tx, category_id)?;
            }

            let current_max: Option<f64> =
                tx.query_row("SELECT MAX(sort_order) FROM tasks", [], |row| row.get(0))?;
            let order = next_order(now, current_max);

            tx.execute(
                "INSERT INTO tasks (title, description, completed, sort_order, category_id, created_at)
                 VALUES (?1, ?2, 0, ?3, ?4, ?5)",
                params![title, description, order, input.category_id, now],
            )?;
            let id = tx.last_insert_rowid();
            let task = get_task_internal(tx, id)?
                .ok_or_else(|| anyhow!("Task {} missing right after insert", id))?;
            debug!(id, order, "Created task");
            Ok(task)
        })
    }

    /// List all tasks in display order.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let sql = format!("{} {}", TASK_SELECT, TASK_ORDER);
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map([], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// List tasks whose title contains `query`, ignoring case.
    pub fn search_tasks(&self, query: &str) -> Result<Vec<Task>> {
        let tasks = self.list_tasks()?;
        Ok(tasks
            .into_iter()
            .filter(|task| task.matches_search(query))
            .collect())
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Set the completion flag. Setting the current value again is a no-op success.
    pub fn toggle_complete(&self, task_id: i64, completed: bool) -> Result<Task> {
        self.with_conn(|conn| {
            let task = require_task(conn, task_id)?;
            if task.completed == completed {
                return Ok(task);
            }

            conn.execute(
                "UPDATE tasks SET completed = ?1 WHERE id = ?2",
                params![completed, task_id],
            )?;
            require_task(conn, task_id)
        })
    }

    /// Update title, description and (depending on the patch) category.
    pub fn update_task(&self, input: &UpdateTaskInput) -> Result<Task> {
        let title = validate_text("title", &input.title)?;
        let description = validate_text("description", &input.description)?;

        self.with_conn(|conn| {
            let task = require_task(conn, input.id)?;
            let category_id = input.category_id.apply(task.category_id);
            if let Some(category_id) = category_id
                && task.category_id != Some(category_id)
            {
                require_category(conn, category_id)?;
            }

            conn.execute(
                "UPDATE tasks SET title = ?1, description = ?2, category_id = ?3 WHERE id = ?4",
                params![title, description, category_id, input.id],
            )?;
            require_task(conn, input.id)
        })
    }

    /// Permanently delete a task. Returns the deleted id.
    pub fn delete_task(&self, task_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            require_task(conn, task_id)?;
            conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            debug!(task_id, "Deleted task");
            Ok(task_id)
        })
    }

    /// Assign dense 1-based positions following `ordered_ids`.
    ///
    /// Runs as one transaction: if any id fails to update, nothing is kept.
    pub fn update_order(&self, ordered_ids: &[i64]) -> Result<()> {
        let mut seen = HashSet::with_capacity(ordered_ids.len());
        if let Some(dup) = ordered_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(ApiError::invalid_input(
                "orderedIds",
                format!("Task id {} appears more than once", dup),
            )
            .into());
        }

        self.with_transaction(|tx| {
            let mut stmt = tx.prepare("UPDATE tasks SET sort_order = ?1 WHERE id = ?2")?;
            for (index, task_id) in ordered_ids.iter().enumerate() {
                let position = (index + 1) as f64;
                let changed = stmt.execute(params![position, task_id]).map_err(|e| {
                    ApiError::new(
                        ErrorCode::InternalServerError,
                        format!("Failed to update order of task {}: {}", task_id, e),
                    )
                })?;
                if changed == 0 {
                    // Returning an error rolls back the rows already updated.
                    return Err(ApiError::new(
                        ErrorCode::InternalServerError,
                        format!("Failed to update order: task {} not found", task_id),
                    )
                    .into());
                }
            }
            info!(count = ordered_ids.len(), "Task order updated");
            Ok(())
        })
    }
}
