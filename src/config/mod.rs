//! Configuration.
//!
//! Tiers, merged field-by-field (later wins):
//! 1. **Defaults** - compiled in
//! 2. **Project** - `$CWD/taskboard/config.yaml`
//! 3. **User** - `~/.taskboard/config.yaml`
//! 4. **Environment** - see below
//!
//! CLI flags are applied on top by the binary.
//!
//! ## Environment Variables
//! - `TASKBOARD_CONFIG_PATH` - Explicit config file (replaces tiers 1-3)
//! - `TASKBOARD_DB_PATH` - Database path
//! - `TASKBOARD_HOST` - Bind address
//! - `TASKBOARD_PORT` - Bind port
//! - `TASKBOARD_SERVER_URL` - Server URL for client subcommands

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
