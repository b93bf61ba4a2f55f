//! CLI argument definitions using clap
//!
//! Commands:
//! - feedstore init
//! - feedstore journal <list|read|exists|append|copy|delete>
//! - feedstore content <get|get-all|keys|put|delete|delete-prefix>
//! - feedstore stats

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// feedstore - inspect and edit journal and content stores
#[derive(Parser, Debug)]
#[command(name = "feedstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./feedstore.json")]
    pub config: PathBuf,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory and its store directories
    Init,

    /// Journal store operations
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },

    /// Content store operations
    Content {
        #[command(subcommand)]
        action: ContentAction,
    },

    /// Journal and key counts
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum JournalAction {
    /// List every journal
    List,
    /// Print a journal's records
    Read { name: String },
    /// Check whether a journal exists
    Exists { name: String },
    /// Append records to a journal
    Append {
        name: String,
        #[arg(required = true)]
        records: Vec<String>,
    },
    /// Copy a journal into a new journal
    Copy { from: String, to: String },
    /// Delete a journal
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum ContentAction {
    /// Print the values of the given keys
    Get {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print every entry whose key starts with the prefix
    GetAll {
        #[arg(default_value = "")]
        prefix: String,
    },
    /// List every key
    Keys,
    /// Insert or replace a value
    Put { key: String, value: String },
    /// Delete a key
    Delete { key: String },
    /// Delete every key starting with the prefix
    DeletePrefix { prefix: String },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
