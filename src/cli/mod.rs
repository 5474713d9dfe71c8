//! CLI command definitions for taskboard
//!
//! This module defines the CLI structure using clap's derive macros.
//! `serve` runs the server; every other subcommand is a client of a running
//! server and goes through the optimistic client core.

pub mod commands;

use clap::{Args, Parser, Subcommand};

/// Personal task tracker server and client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Server URL for client commands (overrides config)
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the RPC server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List tasks in display order
    List {
        /// Only show tasks whose title contains this text
        #[arg(long)]
        search: Option<String>,
    },

    /// Create a task
    Add {
        title: String,
        description: String,
        /// Category name, created if it does not exist
        #[arg(long)]
        category: Option<String>,
    },

    /// Mark a task complete
    Done { id: i64 },

    /// Mark a task not complete
    Undone { id: i64 },

    /// Edit a task
    Edit(EditArgs),

    /// Delete a task
    Rm { id: i64 },

    /// Move a task to a 1-based position in the list
    Move { id: i64, position: usize },

    /// List categories
    Categories,

    /// Create a category
    CategoryAdd { name: String },
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: i64,

    /// New title (defaults to the current one)
    #[arg(long)]
    pub title: Option<String>,

    /// New description (defaults to the current one)
    #[arg(long)]
    pub description: Option<String>,

    /// Assign a category by name, created if it does not exist
    #[arg(long, conflicts_with = "no_category")]
    pub category: Option<String>,

    /// Remove the task's category
    #[arg(long)]
    pub no_category: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_edit_flags() {
        let cli = Cli::parse_from(["taskboard", "edit", "3", "--no-category", "--title", "x"]);
        match cli.command {
            Command::Edit(args) => {
                assert_eq!(args.id, 3);
                assert!(args.no_category);
                assert_eq!(args.title.as_deref(), Some("x"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_category_flags_conflict() {
        let result =
            Cli::try_parse_from(["taskboard", "edit", "3", "--no-category", "--category", "Work"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_server_flag() {
        let cli = Cli::parse_from(["taskboard", "list", "--server", "http://h:1"]);
        assert_eq!(cli.server.as_deref(), Some("http://h:1"));
        assert_eq!(cli.log, "2");
    }
}
