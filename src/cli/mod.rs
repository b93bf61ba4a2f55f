//! CLI module for feedstore
//!
//! Provides command-line access to a configured store:
//! - init: create the store directories
//! - journal: list / read / exists / append / copy / delete
//! - content: get / get-all / keys / put / delete / delete-prefix
//! - stats: counts and backend dumps

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, ContentAction, JournalAction};
pub use commands::{content, init, journal, run, run_command, stats};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
