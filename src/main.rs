//! feedstore CLI entry point
//!
//! Parses arguments, dispatches to the CLI module, reports failures as a
//! JSON error object and exits non-zero.

use feedstore::cli;

fn main() {
    if let Err(e) = cli::run() {
        let _ = cli::write_error(e.code_str(), e.message());
        std::process::exit(1);
    }
}
