//! Task procedures.

use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::types::{
    CreateTaskInput, DeleteOutput, IdInput, SearchInput, SuccessOutput, Task,
    ToggleCompleteInput, UpdateOrderInput, UpdateTaskInput,
};

pub fn get_all(db: &Database) -> ApiResult<Vec<Task>> {
    Ok(db.list_tasks()?)
}

pub fn search(db: &Database, input: SearchInput) -> ApiResult<Vec<Task>> {
    Ok(db.search_tasks(&input.query)?)
}

pub fn get_by_id(db: &Database, input: IdInput) -> ApiResult<Task> {
    db.get_task(input.id)?
        .ok_or_else(|| ApiError::task_not_found(input.id))
}

pub fn create(db: &Database, input: CreateTaskInput) -> ApiResult<Task> {
    Ok(db.create_task(&input)?)
}

pub fn update(db: &Database, input: UpdateTaskInput) -> ApiResult<Task> {
    Ok(db.update_task(&input)?)
}

pub fn toggle_complete(db: &Database, input: ToggleCompleteInput) -> ApiResult<Task> {
    Ok(db.toggle_complete(input.id, input.completed)?)
}

pub fn delete(db: &Database, input: IdInput) -> ApiResult<DeleteOutput> {
    let deleted_id = db.delete_task(input.id)?;
    Ok(DeleteOutput {
        success: true,
        deleted_id,
    })
}

pub fn update_order(db: &Database, input: UpdateOrderInput) -> ApiResult<SuccessOutput> {
    db.update_order(&input.ordered_ids)?;
    Ok(SuccessOutput { success: true })
}
