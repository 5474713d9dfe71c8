//! Transient failure notifications.
//!
//! Each failed optimistic mutation pushes one notification with a message
//! specific to the operation. Notifications expire after a TTL and can be
//! dismissed early; neither blocks further mutations.

use super::ClientError;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// The optimistic mutations the coordinator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    ToggleComplete,
    Delete,
    Update,
    Reorder,
}

impl MutationKind {
    /// User-facing message shown when this mutation fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            MutationKind::ToggleComplete => "Failed to update the task status.",
            MutationKind::Delete => "Failed to delete the task.",
            MutationKind::Update => "Failed to save your changes.",
            MutationKind::Reorder => "Failed to save the new order.",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationKind::ToggleComplete => write!(f, "toggle-complete"),
            MutationKind::Delete => write!(f, "delete"),
            MutationKind::Update => write!(f, "update"),
            MutationKind::Reorder => write!(f, "reorder"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub kind: MutationKind,
    pub message: &'static str,
    /// The underlying error text.
    pub detail: String,
    pub created_at: Instant,
}

struct State {
    next_id: u64,
    active: Vec<Notification>,
}

impl State {
    fn prune(&mut self, ttl: Duration) {
        self.active.retain(|n| n.created_at.elapsed() < ttl);
    }
}

/// Shared store of active notifications.
#[derive(Clone)]
pub struct NotificationCenter {
    state: Arc<Mutex<State>>,
    ttl: Duration,
    tx: broadcast::Sender<Notification>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        let (tx, _) = broadcast::channel(32);
        Self {
            state: Arc::new(Mutex::new(State {
                next_id: 1,
                active: Vec::new(),
            })),
            ttl,
            tx,
        }
    }

    /// Record a failure and return the notification id.
    pub fn push(&self, kind: MutationKind, error: &ClientError) -> u64 {
        let notification = {
            let mut state = self.state.lock().unwrap();
            state.prune(self.ttl);
            let id = state.next_id;
            state.next_id += 1;
            let notification = Notification {
                id,
                kind,
                message: kind.failure_message(),
                detail: error.to_string(),
                created_at: Instant::now(),
            };
            state.active.push(notification.clone());
            notification
        };
        // No subscribers is fine.
        let _ = self.tx.send(notification.clone());
        notification.id
    }

    /// Dismiss a notification. Returns `false` if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut state = self.state.lock().unwrap();
        let before = state.active.len();
        state.active.retain(|n| n.id != id);
        state.active.len() != before
    }

    /// Notifications that are neither dismissed nor expired, oldest first.
    pub fn active(&self) -> Vec<Notification> {
        let mut state = self.state.lock().unwrap();
        state.prune(self.ttl);
        state.active.clone()
    }

    /// Receive notifications as they are pushed.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}
