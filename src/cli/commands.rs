//! Client subcommands.
//!
//! Each command connects a [`MutationCoordinator`] to the server, performs
//! one operation and waits for the follow-up refresh before returning.

use super::{Command, EditArgs};
use crate::client::{
    GrabRegion, GrabSource, HttpApi, MutationCoordinator, NotificationCenter, ReorderOutcome,
    TaskApi, TaskBoard,
};
use crate::config::ClientConfig;
use crate::types::{Category, CategoryPatch, CreateTaskInput, Task, UpdateTaskInput};
use anyhow::{Result, anyhow, bail};
use std::sync::Arc;

/// One line per task: `[x] 3  Title (Category)`.
pub fn format_task(task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    match &task.category {
        Some(category) => format!("[{}] {:<4} {} ({})", mark, task.id, task.title, category.name),
        None => format!("[{}] {:<4} {}", mark, task.id, task.title),
    }
}

pub fn format_category(category: &Category) -> String {
    format!("{:<4} {}", category.id, category.name)
}

/// Connect to the server named in `config`.
pub async fn connect(config: &ClientConfig) -> Result<MutationCoordinator> {
    let api: Arc<dyn TaskApi> =
        Arc::new(HttpApi::new(&config.server_url).with_timeout(config.request_timeout()));
    let notifications = NotificationCenter::new(config.notification_ttl());
    Ok(MutationCoordinator::connect(api, notifications).await?)
}

/// Run a client subcommand against `coordinator` and return the lines to print.
pub async fn run(coordinator: &MutationCoordinator, command: Command) -> Result<Vec<String>> {
    let lines: Vec<String> = match command {
        Command::Serve { .. } => bail!("serve is not a client command"),
        Command::List { search } => {
            let mut board = TaskBoard::new(coordinator.clone());
            if let Some(query) = search {
                board.set_search(query);
            }
            board.visible().iter().map(format_task).collect()
        }
        Command::Add {
            title,
            description,
            category,
        } => {
            let category_id = match category {
                Some(name) => Some(coordinator.resolve_category(&name).await?.id),
                None => None,
            };
            let task = coordinator
                .create_task(CreateTaskInput {
                    title,
                    description,
                    category_id,
                })
                .await?;
            vec![format_task(&task)]
        }
        Command::Done { id } => vec![format_task(&coordinator.toggle_complete(id, true).await?)],
        Command::Undone { id } => {
            vec![format_task(&coordinator.toggle_complete(id, false).await?)]
        }
        Command::Edit(args) => vec![format_task(&edit(coordinator, args).await?)],
        Command::Rm { id } => {
            coordinator.delete(id).await?;
            vec![format!("Deleted task {}", id)]
        }
        Command::Move { id, position } => move_task(coordinator, id, position).await?,
        Command::Categories => coordinator
            .list_categories()
            .await?
            .iter()
            .map(format_category)
            .collect(),
        Command::CategoryAdd { name } => {
            vec![format_category(&coordinator.create_category(&name).await?)]
        }
    };
    coordinator.settled().await;
    Ok(lines)
}

async fn edit(coordinator: &MutationCoordinator, args: EditArgs) -> Result<Task> {
    let current = coordinator.api().get_task(args.id).await?;
    let category_id = match (args.category, args.no_category) {
        (Some(name), _) => CategoryPatch::Set(coordinator.resolve_category(&name).await?.id),
        (None, true) => CategoryPatch::Cleared,
        (None, false) => CategoryPatch::Unchanged,
    };
    let input = UpdateTaskInput {
        id: args.id,
        title: args.title.unwrap_or(current.title),
        description: args.description.unwrap_or(current.description),
        category_id,
    };
    Ok(coordinator.update(input).await?)
}

/// Move a task by dragging it onto whatever sits at `position` (1-based,
/// clamped to the list).
async fn move_task(
    coordinator: &MutationCoordinator,
    id: i64,
    position: usize,
) -> Result<Vec<String>> {
    let tasks = coordinator.cache().current();
    if tasks.is_empty() {
        bail!("No tasks to move");
    }
    let index = position.clamp(1, tasks.len()) - 1;
    let target = tasks[index].id;

    let mut board = TaskBoard::new(coordinator.clone());
    if !board.grab(id, GrabRegion::Handle, GrabSource::Keyboard) {
        return Err(anyhow!("Task {} not found", id));
    }
    let line = match board.drop_on(Some(target)).await? {
        ReorderOutcome::NoOp => format!("Task {} is already at position {}", id, index + 1),
        ReorderOutcome::Moved { from, to, .. } => {
            format!("Moved task {} from position {} to {}", id, from + 1, to + 1)
        }
    };
    Ok(vec![line])
}
