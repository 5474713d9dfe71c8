//! Client-side synchronization core.
//!
//! The [`cache`] actor owns the canonical ordered task list. The
//! [`coordinator`] wraps every mutation in cancel/snapshot/apply/reconcile so
//! the list reflects a change before the server confirms it and rolls back
//! when it does not. [`reorder`] turns drag gestures into reorder mutations and
//! [`board`] ties the pieces together for a UI.

pub mod api;
pub mod board;
pub mod cache;
pub mod coordinator;
pub mod http;
pub mod notifications;
pub mod optimistic;
pub mod reorder;

use crate::error::ApiError;
use thiserror::Error;

pub use api::TaskApi;
pub use board::TaskBoard;
pub use cache::{CacheHandle, TaskCache};
pub use coordinator::MutationCoordinator;
pub use http::HttpApi;
pub use notifications::{MutationKind, Notification, NotificationCenter};
pub use reorder::{DragState, GrabRegion, GrabSource, ReorderHandler, ReorderOutcome};

/// Errors surfaced by the client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the call.
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with something that is not an RPC envelope.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The cache actor has shut down.
    #[error("Task cache is closed")]
    CacheClosed,
}

impl ClientError {
    /// The structured server error, if this is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(e) => Some(e),
            _ => None,
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
