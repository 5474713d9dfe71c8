//! Pure list transforms applied before the server confirms a mutation.
//!
//! Each function returns the list the server is expected to produce. Ids that
//! are not in the list are left alone; the reconcile refresh sorts it out.
//!
//! An [`Undo`] captured from the list a transform replaced reverts only that
//! transform, so a failed mutation can be rolled back without discarding the
//! optimistic writes of other mutations still waiting on the server.

use crate::types::{Category, CategoryPatch, Task, UpdateTaskInput};
use std::collections::HashMap;

pub fn apply_toggle(tasks: &[Task], id: i64, completed: bool) -> Vec<Task> {
    tasks
        .iter()
        .cloned()
        .map(|mut task| {
            if task.id == id {
                task.completed = completed;
            }
            task
        })
        .collect()
}

pub fn apply_delete(tasks: &[Task], id: i64) -> Vec<Task> {
    tasks.iter().filter(|t| t.id != id).cloned().collect()
}

/// Merge an edit into the matching task.
///
/// `categories` resolves the joined category for `CategoryPatch::Set`. An id
/// that is not known yet keeps `category_id` but leaves the object empty until
/// the next refresh.
pub fn apply_update(
    tasks: &[Task],
    input: &UpdateTaskInput,
    categories: &[Category],
) -> Vec<Task> {
    tasks
        .iter()
        .cloned()
        .map(|mut task| {
            if task.id != input.id {
                return task;
            }
            task.title = input.title.trim().to_string();
            task.description = input.description.trim().to_string();
            match input.category_id {
                CategoryPatch::Unchanged => {}
                CategoryPatch::Cleared => {
                    task.category_id = None;
                    task.category = None;
                }
                CategoryPatch::Set(category_id) => {
                    task.category_id = Some(category_id);
                    task.category = categories.iter().find(|c| c.id == category_id).cloned();
                }
            }
            task
        })
        .collect()
}

/// Rebuild the list in `ordered_ids` order with dense 1-based orders.
/// Ids missing from `tasks` are dropped.
pub fn apply_reorder(tasks: &[Task], ordered_ids: &[i64]) -> Vec<Task> {
    let by_id: HashMap<i64, &Task> = tasks.iter().map(|t| (t.id, t)).collect();
    ordered_ids
        .iter()
        .filter_map(|id| by_id.get(id))
        .enumerate()
        .map(|(index, task)| {
            let mut task = (*task).clone();
            task.order = (index + 1) as f64;
            task
        })
        .collect()
}

/// What a rollback puts back.
#[derive(Debug, Clone, PartialEq)]
pub enum Undo {
    /// The target was not in the list; nothing to revert.
    Nothing,
    Completed { id: i64, completed: bool },
    /// Previous editable fields of one task.
    Fields(Task),
    /// A deleted task and the index it had.
    Reinsert { index: usize, task: Task },
    /// Previous position and order value of every task.
    Order(Vec<(i64, f64)>),
}

impl Undo {
    pub fn completed(tasks: &[Task], id: i64) -> Self {
        match tasks.iter().find(|t| t.id == id) {
            Some(task) => Undo::Completed {
                id,
                completed: task.completed,
            },
            None => Undo::Nothing,
        }
    }

    pub fn fields(tasks: &[Task], id: i64) -> Self {
        match tasks.iter().find(|t| t.id == id) {
            Some(task) => Undo::Fields(task.clone()),
            None => Undo::Nothing,
        }
    }

    pub fn reinsert(tasks: &[Task], id: i64) -> Self {
        match tasks.iter().position(|t| t.id == id) {
            Some(index) => Undo::Reinsert {
                index,
                task: tasks[index].clone(),
            },
            None => Undo::Nothing,
        }
    }

    pub fn order(tasks: &[Task]) -> Self {
        Undo::Order(tasks.iter().map(|t| (t.id, t.order)).collect())
    }
}

/// Revert one transform on the current list, keeping every other change.
pub fn revert(tasks: &[Task], undo: &Undo) -> Vec<Task> {
    match undo {
        Undo::Nothing => tasks.to_vec(),
        Undo::Completed { id, completed } => apply_toggle(tasks, *id, *completed),
        Undo::Fields(previous) => tasks
            .iter()
            .cloned()
            .map(|mut task| {
                if task.id == previous.id {
                    task.title = previous.title.clone();
                    task.description = previous.description.clone();
                    task.category_id = previous.category_id;
                    task.category = previous.category.clone();
                }
                task
            })
            .collect(),
        Undo::Reinsert { index, task } => {
            let mut next = tasks.to_vec();
            if !next.iter().any(|t| t.id == task.id) {
                next.insert((*index).min(next.len()), task.clone());
            }
            next
        }
        Undo::Order(previous) => {
            let position: HashMap<i64, (usize, f64)> = previous
                .iter()
                .enumerate()
                .map(|(index, (id, order))| (*id, (index, *order)))
                .collect();
            let mut next = tasks.to_vec();
            for task in &mut next {
                if let Some((_, order)) = position.get(&task.id) {
                    task.order = *order;
                }
            }
            // Stable: tasks unknown to the previous order keep their relative place at the end
            next.sort_by_key(|t| position.get(&t.id).map_or(usize::MAX, |(index, _)| *index));
            next
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, category: Option<Category>) -> Task {
        Task {
            id,
            title: format!("task {}", id),
            description: "desc".into(),
            completed: false,
            order: (id * 10) as f64,
            category_id: category.as_ref().map(|c| c.id),
            category,
            created_at: 0,
        }
    }

    fn work() -> Category {
        Category {
            id: 1,
            name: "Work".into(),
        }
    }

    fn home() -> Category {
        Category {
            id: 2,
            name: "Home".into(),
        }
    }

    fn ids(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_toggle_touches_only_target() {
        let tasks = vec![task(1, None), task(2, None)];
        let next = apply_toggle(&tasks, 2, true);
        assert!(!next[0].completed);
        assert!(next[1].completed);
        assert_eq!(ids(&next), vec![1, 2]);
    }

    #[test]
    fn test_delete_keeps_order_of_rest() {
        let tasks = vec![task(1, None), task(2, None), task(3, None)];
        assert_eq!(ids(&apply_delete(&tasks, 2)), vec![1, 3]);
        assert_eq!(ids(&apply_delete(&tasks, 99)), vec![1, 2, 3]);
    }

    #[test]
    fn test_update_category_patch() {
        let tasks = vec![task(1, Some(work()))];
        let mut input = UpdateTaskInput {
            id: 1,
            title: "  renamed ".into(),
            description: "new".into(),
            category_id: CategoryPatch::Unchanged,
        };

        let kept = apply_update(&tasks, &input, &[work(), home()]);
        assert_eq!(kept[0].title, "renamed");
        assert_eq!(kept[0].category, Some(work()));

        input.category_id = CategoryPatch::Cleared;
        let cleared = apply_update(&tasks, &input, &[work(), home()]);
        assert_eq!(cleared[0].category_id, None);
        assert_eq!(cleared[0].category, None);

        input.category_id = CategoryPatch::Set(2);
        let set = apply_update(&tasks, &input, &[work(), home()]);
        assert_eq!(set[0].category_id, Some(2));
        assert_eq!(set[0].category, Some(home()));

        let unknown = apply_update(&tasks, &input, &[]);
        assert_eq!(unknown[0].category_id, Some(2));
        assert_eq!(unknown[0].category, None);
    }

    #[test]
    fn test_reorder_drops_unknown_ids_and_renumbers() {
        let tasks = vec![task(1, None), task(2, None), task(3, None)];
        let next = apply_reorder(&tasks, &[3, 42, 1, 2]);
        assert_eq!(ids(&next), vec![3, 1, 2]);
        let orders: Vec<f64> = next.iter().map(|t| t.order).collect();
        assert_eq!(orders, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_revert_toggle_keeps_other_changes() {
        let tasks = vec![task(1, None), task(2, None)];
        let undo = Undo::completed(&tasks, 1);
        let toggled = apply_toggle(&tasks, 1, true);
        // Another pending mutation deletes task 2 meanwhile
        let current = apply_delete(&toggled, 2);

        let reverted = revert(&current, &undo);
        assert_eq!(ids(&reverted), vec![1]);
        assert!(!reverted[0].completed);
    }

    #[test]
    fn test_revert_delete_reinserts_at_original_index() {
        let tasks = vec![task(1, None), task(2, None), task(3, None)];
        let undo = Undo::reinsert(&tasks, 2);
        let current = apply_toggle(&apply_delete(&tasks, 2), 3, true);

        let reverted = revert(&current, &undo);
        assert_eq!(ids(&reverted), vec![1, 2, 3]);
        assert!(reverted[2].completed);
        // Already back (e.g. restored by a refresh): no duplicate
        assert_eq!(ids(&revert(&reverted, &undo)), vec![1, 2, 3]);
    }

    #[test]
    fn test_revert_update_restores_only_edited_fields() {
        let tasks = vec![task(1, Some(work()))];
        let undo = Undo::fields(&tasks, 1);
        let input = UpdateTaskInput {
            id: 1,
            title: "renamed".into(),
            description: "new".into(),
            category_id: CategoryPatch::Cleared,
        };
        let current = apply_toggle(&apply_update(&tasks, &input, &[]), 1, true);

        let reverted = revert(&current, &undo);
        assert_eq!(reverted[0].title, "task 1");
        assert_eq!(reverted[0].category, Some(work()));
        assert!(reverted[0].completed);
    }

    #[test]
    fn test_revert_reorder_restores_positions() {
        let tasks = vec![task(1, None), task(2, None), task(3, None)];
        let undo = Undo::order(&tasks);
        let current = apply_toggle(&apply_reorder(&tasks, &[3, 1, 2]), 2, true);

        let reverted = revert(&current, &undo);
        assert_eq!(ids(&reverted), vec![1, 2, 3]);
        let orders: Vec<f64> = reverted.iter().map(|t| t.order).collect();
        assert_eq!(orders, vec![10.0, 20.0, 30.0]);
        assert!(reverted[1].completed);
    }

    #[test]
    fn test_undo_for_missing_task_is_nothing() {
        let tasks = vec![task(1, None)];
        assert_eq!(Undo::completed(&tasks, 9), Undo::Nothing);
        assert_eq!(Undo::reinsert(&tasks, 9), Undo::Nothing);
        assert_eq!(ids(&revert(&tasks, &Undo::Nothing)), vec![1]);
    }
}
