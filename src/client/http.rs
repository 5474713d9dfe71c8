//! HTTP transport for [`TaskApi`].

use super::api::TaskApi;
use super::{ClientError, ClientResult};
use crate::error::ApiError;
use crate::types::{
    Category, CreateCategoryInput, CreateTaskInput, DeleteOutput, IdInput, SearchInput,
    SuccessOutput, Task, ToggleCompleteInput, UpdateOrderInput, UpdateTaskInput,
};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Response envelope written by the server.
#[derive(serde::Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    error: Option<ApiError>,
}

/// Client for a running taskboard server.
pub struct HttpApi {
    /// Server URL
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
    /// Request timeout
    timeout: Duration,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<I, O>(&self, procedure: &str, input: &I) -> ClientResult<O>
    where
        I: Serialize + Sync + ?Sized,
        O: DeserializeOwned,
    {
        let url = format!("{}/rpc/{}", self.base_url, procedure);
        debug!(%url, "RPC request");

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(input)
            .send()
            .await?;
        let status = response.status();
        let envelope: Envelope<O> = response.json().await.map_err(|e| {
            ClientError::Protocol(format!(
                "{} answered {} with an unreadable body: {}",
                procedure, status, e
            ))
        })?;

        match (envelope.result, envelope.error) {
            (_, Some(error)) => Err(ClientError::Api(error)),
            (Some(result), None) => Ok(result),
            (None, None) => Err(ClientError::Protocol(format!(
                "{} answered {} without result or error",
                procedure, status
            ))),
        }
    }
}

/// Body for procedures that take no input.
#[derive(Serialize)]
struct NoInput {}

#[async_trait]
impl TaskApi for HttpApi {
    async fn list_categories(&self) -> ClientResult<Vec<Category>> {
        self.call("category.getAll", &NoInput {}).await
    }

    async fn create_category(&self, name: &str) -> ClientResult<Category> {
        let input = CreateCategoryInput {
            name: name.to_string(),
        };
        self.call("category.create", &input).await
    }

    async fn list_tasks(&self) -> ClientResult<Vec<Task>> {
        self.call("task.getAll", &NoInput {}).await
    }

    async fn search_tasks(&self, query: &str) -> ClientResult<Vec<Task>> {
        let input = SearchInput {
            query: query.to_string(),
        };
        self.call("task.search", &input).await
    }

    async fn get_task(&self, id: i64) -> ClientResult<Task> {
        self.call("task.getById", &IdInput { id }).await
    }

    async fn create_task(&self, input: CreateTaskInput) -> ClientResult<Task> {
        self.call("task.create", &input).await
    }

    async fn update_task(&self, input: UpdateTaskInput) -> ClientResult<Task> {
        self.call("task.update", &input).await
    }

    async fn toggle_complete(&self, id: i64, completed: bool) -> ClientResult<Task> {
        self.call("task.toggleComplete", &ToggleCompleteInput { id, completed })
            .await
    }

    async fn delete_task(&self, id: i64) -> ClientResult<DeleteOutput> {
        self.call("task.delete", &IdInput { id }).await
    }

    async fn update_order(&self, ordered_ids: Vec<i64>) -> ClientResult<SuccessOutput> {
        self.call("task.updateOrder", &UpdateOrderInput { ordered_ids })
            .await
    }
}
