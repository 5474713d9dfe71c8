//! Drag-to-reorder interaction.
//!
//! A drag starts only from an item's handle. Checkboxes, action buttons and
//! the body keep their own click behavior and never start a drag. Releasing
//! over another item moves the dragged task to that item's index in the full
//! list; releasing over the origin or outside any item does nothing.

use crate::types::Task;
use tracing::debug;

/// The part of a list item a gesture started on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabRegion {
    Handle,
    Checkbox,
    ActionButton,
    Body,
}

/// Input device driving the drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabSource {
    Pointer,
    Keyboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        task_id: i64,
        origin_index: usize,
        source: GrabSource,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// Nothing to persist.
    NoOp,
    Moved {
        task_id: i64,
        from: usize,
        to: usize,
        /// Every task id in the new order.
        ordered_ids: Vec<i64>,
    },
}

/// Remove the element at `from` and insert it at `to`.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from == to || from >= items.len() {
        return;
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
}

/// Tasks whose title contains `query`, case-insensitively. A blank query
/// returns the whole list.
pub fn filter_tasks(tasks: &[Task], query: &str) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| t.matches_search(query))
        .cloned()
        .collect()
}

#[derive(Debug, Default)]
pub struct ReorderHandler {
    state: DragState,
}

impl ReorderHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Start a drag of `task_id`. Returns `true` if a drag started.
    pub fn grab(
        &mut self,
        tasks: &[Task],
        task_id: i64,
        region: GrabRegion,
        source: GrabSource,
    ) -> bool {
        if region != GrabRegion::Handle {
            return false;
        }
        let Some(origin_index) = tasks.iter().position(|t| t.id == task_id) else {
            return false;
        };
        debug!(task_id, origin_index, ?source, "Drag started");
        self.state = DragState::Dragging {
            task_id,
            origin_index,
            source,
        };
        true
    }

    /// Abandon the current drag.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Finish the drag over `over` (or outside any item).
    ///
    /// Positions are looked up in `tasks` at release time so a refresh during
    /// the drag is taken into account.
    pub fn release(&mut self, tasks: &[Task], over: Option<i64>) -> ReorderOutcome {
        let state = std::mem::take(&mut self.state);
        let DragState::Dragging { task_id, .. } = state else {
            return ReorderOutcome::NoOp;
        };
        let Some(over) = over else {
            return ReorderOutcome::NoOp;
        };
        if over == task_id {
            return ReorderOutcome::NoOp;
        }

        let position = |id: i64| tasks.iter().position(|t| t.id == id);
        let (Some(from), Some(to)) = (position(task_id), position(over)) else {
            return ReorderOutcome::NoOp;
        };

        let mut ordered_ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        array_move(&mut ordered_ids, from, to);
        debug!(task_id, from, to, "Drag released");
        ReorderOutcome::Moved {
            task_id,
            from,
            to,
            ordered_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, title: &str) -> Task {
        Task {
            id,
            title: title.into(),
            description: String::new(),
            completed: false,
            order: id as f64,
            category_id: None,
            category: None,
            created_at: 0,
        }
    }

    fn list() -> Vec<Task> {
        vec![
            task(1, "Buy milk"),
            task(2, "Write report"),
            task(3, "Call mom"),
            task(4, "Milk the cow"),
        ]
    }

    #[test]
    fn test_array_move() {
        let mut v = vec!['a', 'b', 'c', 'd'];
        array_move(&mut v, 0, 2);
        assert_eq!(v, vec!['b', 'c', 'a', 'd']);
        array_move(&mut v, 3, 0);
        assert_eq!(v, vec!['d', 'b', 'c', 'a']);
        array_move(&mut v, 9, 0);
        assert_eq!(v, vec!['d', 'b', 'c', 'a']);
    }

    #[test]
    fn test_only_handle_starts_drag() {
        let tasks = list();
        let mut handler = ReorderHandler::new();
        for region in [GrabRegion::Checkbox, GrabRegion::ActionButton, GrabRegion::Body] {
            assert!(!handler.grab(&tasks, 1, region, GrabSource::Pointer));
            assert!(!handler.is_dragging());
        }
        assert!(handler.grab(&tasks, 1, GrabRegion::Handle, GrabSource::Keyboard));
        assert_eq!(
            handler.state(),
            DragState::Dragging {
                task_id: 1,
                origin_index: 0,
                source: GrabSource::Keyboard
            }
        );
    }

    #[test]
    fn test_release_on_origin_is_noop() {
        let tasks = list();
        let mut handler = ReorderHandler::new();
        handler.grab(&tasks, 2, GrabRegion::Handle, GrabSource::Pointer);
        assert_eq!(handler.release(&tasks, Some(2)), ReorderOutcome::NoOp);
        assert!(!handler.is_dragging());
    }

    #[test]
    fn test_release_outside_is_noop() {
        let tasks = list();
        let mut handler = ReorderHandler::new();
        handler.grab(&tasks, 2, GrabRegion::Handle, GrabSource::Pointer);
        assert_eq!(handler.release(&tasks, None), ReorderOutcome::NoOp);
    }

    #[test]
    fn test_release_without_grab_is_noop() {
        let mut handler = ReorderHandler::new();
        assert_eq!(handler.release(&list(), Some(3)), ReorderOutcome::NoOp);
    }

    #[test]
    fn test_release_moves_within_full_list() {
        let tasks = list();
        let mut handler = ReorderHandler::new();
        handler.grab(&tasks, 1, GrabRegion::Handle, GrabSource::Pointer);
        let outcome = handler.release(&tasks, Some(3));
        assert_eq!(
            outcome,
            ReorderOutcome::Moved {
                task_id: 1,
                from: 0,
                to: 2,
                ordered_ids: vec![2, 3, 1, 4],
            }
        );
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let tasks = list();
        let mut handler = ReorderHandler::new();
        handler.grab(&tasks, 4, GrabRegion::Handle, GrabSource::Keyboard);
        handler.cancel();
        assert_eq!(handler.state(), DragState::Idle);
        assert_eq!(handler.release(&tasks, Some(1)), ReorderOutcome::NoOp);
    }

    #[test]
    fn test_filter_tasks() {
        let tasks = list();
        let ids = |v: Vec<Task>| v.iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids(filter_tasks(&tasks, "  MILK ")), vec![1, 4]);
        assert_eq!(ids(filter_tasks(&tasks, "")), vec![1, 2, 3, 4]);
        assert_eq!(ids(filter_tasks(&tasks, "   ")), vec![1, 2, 3, 4]);
        assert!(filter_tasks(&tasks, "zebra").is_empty());
    }
}
