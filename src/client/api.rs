//! Typed view of the RPC surface used by the client.

use super::ClientResult;
use crate::rpc::{self, RpcHandler};
use crate::types::{
    Category, CreateCategoryInput, CreateTaskInput, DeleteOutput, IdInput, SearchInput,
    SuccessOutput, Task, ToggleCompleteInput, UpdateOrderInput, UpdateTaskInput,
};
use async_trait::async_trait;

/// The remote procedures, one method each.
///
/// Implemented by [`super::HttpApi`] for a running server and by
/// [`RpcHandler`] for in-process use.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_categories(&self) -> ClientResult<Vec<Category>>;

    async fn create_category(&self, name: &str) -> ClientResult<Category>;

    async fn list_tasks(&self) -> ClientResult<Vec<Task>>;

    async fn search_tasks(&self, query: &str) -> ClientResult<Vec<Task>>;

    async fn get_task(&self, id: i64) -> ClientResult<Task>;

    async fn create_task(&self, input: CreateTaskInput) -> ClientResult<Task>;

    async fn update_task(&self, input: UpdateTaskInput) -> ClientResult<Task>;

    async fn toggle_complete(&self, id: i64, completed: bool) -> ClientResult<Task>;

    async fn delete_task(&self, id: i64) -> ClientResult<DeleteOutput>;

    async fn update_order(&self, ordered_ids: Vec<i64>) -> ClientResult<SuccessOutput>;
}

#[async_trait]
impl TaskApi for RpcHandler {
    async fn list_categories(&self) -> ClientResult<Vec<Category>> {
        Ok(rpc::categories::get_all(&self.db)?)
    }

    async fn create_category(&self, name: &str) -> ClientResult<Category> {
        let input = CreateCategoryInput {
            name: name.to_string(),
        };
        Ok(rpc::categories::create(&self.db, input)?)
    }

    async fn list_tasks(&self) -> ClientResult<Vec<Task>> {
        Ok(rpc::tasks::get_all(&self.db)?)
    }

    async fn search_tasks(&self, query: &str) -> ClientResult<Vec<Task>> {
        let input = SearchInput {
            query: query.to_string(),
        };
        Ok(rpc::tasks::search(&self.db, input)?)
    }

    async fn get_task(&self, id: i64) -> ClientResult<Task> {
        Ok(rpc::tasks::get_by_id(&self.db, IdInput { id })?)
    }

    async fn create_task(&self, input: CreateTaskInput) -> ClientResult<Task> {
        Ok(rpc::tasks::create(&self.db, input)?)
    }

    async fn update_task(&self, input: UpdateTaskInput) -> ClientResult<Task> {
        Ok(rpc::tasks::update(&self.db, input)?)
    }

    async fn toggle_complete(&self, id: i64, completed: bool) -> ClientResult<Task> {
        let input = ToggleCompleteInput { id, completed };
        Ok(rpc::tasks::toggle_complete(&self.db, input)?)
    }

    async fn delete_task(&self, id: i64) -> ClientResult<DeleteOutput> {
        Ok(rpc::tasks::delete(&self.db, IdInput { id })?)
    }

    async fn update_order(&self, ordered_ids: Vec<i64>) -> ClientResult<SuccessOutput> {
        Ok(rpc::tasks::update_order(
            &self.db,
            UpdateOrderInput { ordered_ids },
        )?)
    }
}
