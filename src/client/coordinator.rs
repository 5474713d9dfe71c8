//! Optimistic mutation coordinator.
//!
//! Every mutation runs the same protocol against the cache:
//!
//! 1. Cancel: abort spawned refreshes, bump the cache epoch and mark the
//!    mutation pending.
//! 2. Snapshot and apply: in one cache step, write the expected
//!    post-mutation list and capture an [`Undo`] from the list it replaced.
//! 3. Reconcile: on failure revert only this mutation, keeping the optimistic
//!    writes of others, and push a notification. Then mark the mutation
//!    settled; the last one to settle refreshes in the background.
//!
//! The cache actor drops refresh results while any mutation is pending, so no
//! refresh can overwrite an optimistic value the server has not answered yet.

use super::api::TaskApi;
use super::cache::{CacheHandle, TaskCache};
use super::notifications::{MutationKind, NotificationCenter};
use super::optimistic::{self, Undo};
use super::{ClientError, ClientResult};
use crate::db::categories::normalize_category_name;
use crate::error::ErrorCode;
use crate::types::{Category, CreateTaskInput, Task, UpdateTaskInput};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct Inner {
    api: Arc<dyn TaskApi>,
    cache: CacheHandle,
    notifications: NotificationCenter,
    /// Last fetched category list, used to fill in optimistic category edits.
    categories: Mutex<Vec<Category>>,
    refreshes: Mutex<Vec<JoinHandle<()>>>,
}

/// Runs mutations against a [`TaskApi`] with optimistic cache updates.
#[derive(Clone)]
pub struct MutationCoordinator {
    inner: Arc<Inner>,
}

impl MutationCoordinator {
    pub fn new(
        api: Arc<dyn TaskApi>,
        cache: CacheHandle,
        notifications: NotificationCenter,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                cache,
                notifications,
                categories: Mutex::new(Vec::new()),
                refreshes: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Fetch the task and category lists and start a cache holding them.
    pub async fn connect(
        api: Arc<dyn TaskApi>,
        notifications: NotificationCenter,
    ) -> ClientResult<Self> {
        let tasks = api.list_tasks().await?;
        let categories = api.list_categories().await?;
        debug!(tasks = tasks.len(), categories = categories.len(), "Loaded board");
        let coordinator = Self::new(api, TaskCache::spawn(tasks), notifications);
        *coordinator.inner.categories.lock().unwrap() = categories;
        Ok(coordinator)
    }

    pub fn cache(&self) -> &CacheHandle {
        &self.inner.cache
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.inner.notifications
    }

    pub fn api(&self) -> &Arc<dyn TaskApi> {
        &self.inner.api
    }

    /// Fetch the task list and store it unless a mutation started meanwhile.
    /// Returns whether the result reached the cache.
    pub async fn refresh(&self) -> ClientResult<bool> {
        let epoch = self.inner.cache.begin_refresh().await?;
        let tasks = self.inner.api.list_tasks().await?;
        self.inner.cache.apply_refresh(epoch, tasks).await
    }

    /// Refresh in a background task.
    pub fn spawn_refresh(&self) {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = this.refresh().await {
                warn!("Background refresh failed: {}", e);
            }
        });
        let mut refreshes = self.inner.refreshes.lock().unwrap();
        refreshes.retain(|h| !h.is_finished());
        refreshes.push(handle);
    }

    fn abort_refreshes(&self) {
        for handle in self.inner.refreshes.lock().unwrap().drain(..) {
            handle.abort();
        }
    }

    /// Abort spawned refreshes and invalidate any that are still running.
    pub async fn cancel_refreshes(&self) -> ClientResult<()> {
        self.abort_refreshes();
        self.inner.cache.cancel_in_flight_reads().await?;
        Ok(())
    }

    /// Wait for every spawned refresh to finish.
    pub async fn settled(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> =
                self.inner.refreshes.lock().unwrap().drain(..).collect();
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                // Aborted refreshes end with a cancellation error.
                let _ = handle.await;
            }
        }
    }

    async fn run_optimistic<T, F, Fut>(
        &self,
        kind: MutationKind,
        transform: F,
        remote: Fut,
    ) -> ClientResult<T>
    where
        F: FnOnce(&[Task]) -> (Vec<Task>, Undo) + Send + 'static,
        Fut: Future<Output = ClientResult<T>>,
    {
        self.abort_refreshes();
        self.inner.cache.begin_mutation().await?;
        let undo = self.inner.cache.modify(transform).await?;

        let result = remote.await;
        match &result {
            Ok(_) => debug!(%kind, "Mutation confirmed"),
            Err(e) => {
                warn!(%kind, "Mutation failed, rolling back: {}", e);
                self.inner
                    .cache
                    .modify(move |tasks| (optimistic::revert(tasks, &undo), ()))
                    .await?;
                self.inner.notifications.push(kind, e);
            }
        }

        let remaining = self.inner.cache.end_mutation().await?;
        if remaining == 0 {
            self.spawn_refresh();
        } else {
            debug!(%kind, remaining, "Refresh left to the last pending mutation");
        }
        result
    }

    pub async fn toggle_complete(&self, id: i64, completed: bool) -> ClientResult<Task> {
        let api = Arc::clone(&self.inner.api);
        self.run_optimistic(
            MutationKind::ToggleComplete,
            move |tasks| {
                let undo = Undo::completed(tasks, id);
                (optimistic::apply_toggle(tasks, id, completed), undo)
            },
            async move { api.toggle_complete(id, completed).await },
        )
        .await
    }

    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        let api = Arc::clone(&self.inner.api);
        self.run_optimistic(
            MutationKind::Delete,
            move |tasks| {
                let undo = Undo::reinsert(tasks, id);
                (optimistic::apply_delete(tasks, id), undo)
            },
            async move { api.delete_task(id).await.map(|_| ()) },
        )
        .await
    }

    pub async fn update(&self, input: UpdateTaskInput) -> ClientResult<Task> {
        let api = Arc::clone(&self.inner.api);
        let categories = self.categories();
        let remote_input = input.clone();
        self.run_optimistic(
            MutationKind::Update,
            move |tasks| {
                let undo = Undo::fields(tasks, input.id);
                (optimistic::apply_update(tasks, &input, &categories), undo)
            },
            async move { api.update_task(remote_input).await },
        )
        .await
    }

    /// Persist a full ordering of task ids.
    pub async fn reorder(&self, ordered_ids: Vec<i64>) -> ClientResult<()> {
        let api = Arc::clone(&self.inner.api);
        let remote_ids = ordered_ids.clone();
        self.run_optimistic(
            MutationKind::Reorder,
            move |tasks| {
                let undo = Undo::order(tasks);
                (optimistic::apply_reorder(tasks, &ordered_ids), undo)
            },
            async move { api.update_order(remote_ids).await.map(|_| ()) },
        )
        .await
    }

    /// Create a task on the server, then refresh. Not optimistic: the id and
    /// order are only known once the server answers.
    pub async fn create_task(&self, input: CreateTaskInput) -> ClientResult<Task> {
        let task = self.inner.api.create_task(input).await?;
        info!(task_id = task.id, "Created task");
        self.spawn_refresh();
        Ok(task)
    }

    /// Fetch categories from the server and remember them.
    pub async fn list_categories(&self) -> ClientResult<Vec<Category>> {
        let categories = self.inner.api.list_categories().await?;
        *self.inner.categories.lock().unwrap() = categories.clone();
        Ok(categories)
    }

    pub async fn create_category(&self, name: &str) -> ClientResult<Category> {
        let category = self.inner.api.create_category(name).await?;
        info!(category_id = category.id, name = %category.name, "Created category");
        self.list_categories().await?;
        Ok(category)
    }

    /// Categories from the last fetch.
    pub fn categories(&self) -> Vec<Category> {
        self.inner.categories.lock().unwrap().clone()
    }

    /// Find a category by name, creating it when it does not exist yet.
    pub async fn resolve_category(&self, name: &str) -> ClientResult<Category> {
        let wanted = normalize_category_name(name);
        let find = |categories: Vec<Category>| {
            categories
                .into_iter()
                .find(|c| c.name.eq_ignore_ascii_case(&wanted))
        };

        if let Some(category) = find(self.list_categories().await?) {
            return Ok(category);
        }

        match self.create_category(name).await {
            Ok(category) => Ok(category),
            // Someone else created it between the fetch and the create.
            Err(ClientError::Api(e)) if e.code == ErrorCode::Conflict => {
                find(self.list_categories().await?).ok_or(ClientError::Api(e))
            }
            Err(e) => Err(e),
        }
    }
}
