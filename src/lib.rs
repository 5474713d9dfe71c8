//! taskboard library
//!
//! This module exports the core components for testing and integration.

pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod rpc;
pub mod server;
pub mod types;
