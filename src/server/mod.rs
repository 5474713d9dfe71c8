//! HTTP server module.
//!
//! Serves the RPC surface over JSON-over-HTTP for browser and CLI clients.

mod http;

pub use http::{AppState, ServerHandle, build_router, start_server};
