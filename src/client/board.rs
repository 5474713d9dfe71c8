//! View-model for a task list screen: search text, drag state and the
//! coordinator behind them.

use super::coordinator::MutationCoordinator;
use super::reorder::{GrabRegion, GrabSource, ReorderHandler, ReorderOutcome, filter_tasks};
use super::ClientResult;
use crate::types::Task;

pub struct TaskBoard {
    coordinator: MutationCoordinator,
    search: String,
    reorder: ReorderHandler,
}

impl TaskBoard {
    pub fn new(coordinator: MutationCoordinator) -> Self {
        Self {
            coordinator,
            search: String::new(),
            reorder: ReorderHandler::new(),
        }
    }

    pub fn coordinator(&self) -> &MutationCoordinator {
        &self.coordinator
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Tasks to display: the cached list filtered by the search text.
    pub fn visible(&self) -> Vec<Task> {
        filter_tasks(&self.coordinator.cache().current(), &self.search)
    }

    pub fn reorder_handler(&self) -> &ReorderHandler {
        &self.reorder
    }

    pub fn grab(&mut self, task_id: i64, region: GrabRegion, source: GrabSource) -> bool {
        let tasks = self.coordinator.cache().current();
        self.reorder.grab(&tasks, task_id, region, source)
    }

    pub fn cancel_drag(&mut self) {
        self.reorder.cancel();
    }

    /// Release the current drag over `over`. A move is persisted through the
    /// coordinator; a no-op touches neither the cache nor the server.
    pub async fn drop_on(&mut self, over: Option<i64>) -> ClientResult<ReorderOutcome> {
        let tasks = self.coordinator.cache().current();
        let outcome = self.reorder.release(&tasks, over);
        if let ReorderOutcome::Moved { ordered_ids, .. } = &outcome {
            self.coordinator.reorder(ordered_ids.clone()).await?;
        }
        Ok(outcome)
    }
}
