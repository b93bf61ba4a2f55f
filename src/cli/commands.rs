//! CLI command implementations
//!
//! Each command loads the configuration, opens the store it needs on the
//! current thread (which becomes the store's main thread), runs one
//! operation and prints one JSON response.

use std::path::Path;

use serde_json::json;

use super::args::{Cli, Command, ContentAction, JournalAction};
use super::errors::{CliError, CliResult};
use super::io::{entries_to_json, records_to_json, write_response};
use crate::commit::CommitResult;
use crate::config::StoreConfig;
use crate::content::ContentMutation;
use crate::directory::{LazyDirectory, CONTENT_DIR, JOURNAL_DIR};
use crate::journal::JournalMutation;
use crate::observability::init_logging;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_logging(cli.json_logs);
    run_command(&cli.config, cli.command)
}

/// Run a parsed command
pub fn run_command(config_path: &Path, cmd: Command) -> CliResult<()> {
    let config = StoreConfig::load(config_path)?;
    match cmd {
        Command::Init => init(&config),
        Command::Journal { action } => journal(&config, action),
        Command::Content { action } => content(&config, action),
        Command::Stats => stats(&config),
    }
}

/// Create `<data_dir>/content` and `<data_dir>/journal`
pub fn init(config: &StoreConfig) -> CliResult<()> {
    for name in [CONTENT_DIR, JOURNAL_DIR] {
        LazyDirectory::new(&config.data_dir, name).get()?;
    }

    write_response(json!({
        "initialized": true,
        "data_dir": config.data_dir.display().to_string(),
    }))
}

pub fn journal(config: &StoreConfig, action: JournalAction) -> CliResult<()> {
    let storage = config.open_journal_storage()?;

    let data = match action {
        JournalAction::List => json!({ "journals": storage.get_all_journals().wait()? }),
        JournalAction::Read { name } => {
            let records = storage.read(&name).wait()?;
            json!({ "journal": name, "records": records_to_json(&records) })
        }
        JournalAction::Exists { name } => {
            json!({ "journal": name, "exists": storage.exists(&name).wait()? })
        }
        JournalAction::Append { name, records } => {
            let count = records.len();
            let mutation = records
                .into_iter()
                .fold(JournalMutation::builder(name.clone()), |builder, record| {
                    builder.append(record)
                })
                .build();
            expect_success(storage.commit(mutation).wait(), &name)?;
            json!({ "journal": name, "appended": count })
        }
        JournalAction::Copy { from, to } => {
            let mutation = JournalMutation::builder(from.clone()).copy(to.clone()).build();
            expect_success(storage.commit(mutation).wait(), &from)?;
            json!({ "from": from, "to": to })
        }
        JournalAction::Delete { name } => {
            let mutation = JournalMutation::builder(name.clone()).delete().build();
            expect_success(storage.commit(mutation).wait(), &name)?;
            json!({ "journal": name, "deleted": true })
        }
    };
    write_response(data)
}

pub fn content(config: &StoreConfig, action: ContentAction) -> CliResult<()> {
    let storage = config.open_content_storage()?;

    let data = match action {
        ContentAction::Get { keys } => {
            json!({ "entries": entries_to_json(&storage.get(&keys).wait()?) })
        }
        ContentAction::GetAll { prefix } => {
            json!({ "entries": entries_to_json(&storage.get_all(&prefix).wait()?) })
        }
        ContentAction::Keys => json!({ "keys": storage.get_all_keys().wait()? }),
        ContentAction::Put { key, value } => {
            let mutation = ContentMutation::builder().upsert(key.clone(), value).build();
            expect_success(storage.commit(mutation).wait(), &key)?;
            json!({ "key": key, "stored": true })
        }
        ContentAction::Delete { key } => {
            let mutation = ContentMutation::builder().delete(key.clone()).build();
            expect_success(storage.commit(mutation).wait(), &key)?;
            json!({ "key": key, "deleted": true })
        }
        ContentAction::DeletePrefix { prefix } => {
            let mutation = ContentMutation::builder().delete_by_prefix(prefix.clone()).build();
            expect_success(storage.commit(mutation).wait(), &prefix)?;
            json!({ "prefix": prefix, "deleted": true })
        }
    };
    write_response(data)
}

pub fn stats(config: &StoreConfig) -> CliResult<()> {
    let journals = config.open_journal_storage()?;
    let content = config.open_content_storage()?;

    let journal_names = journals.get_all_journals().wait()?;
    let keys = content.get_all_keys().wait()?;

    write_response(json!({
        "backend": config.backend.as_str(),
        "journals": journal_names.len(),
        "keys": keys.len(),
        "journal_store": journals.dump(),
        "content_store": content.dump(),
    }))
}

fn expect_success(result: CommitResult, target: &str) -> CliResult<()> {
    match result {
        CommitResult::Success => Ok(()),
        CommitResult::Failure => Err(CliError::commit_failed(target)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_file(temp: &TempDir) -> std::path::PathBuf {
        let path = temp.path().join("feedstore.json");
        let data_dir = temp.path().join("data");
        fs::write(
            &path,
            json!({ "data_dir": data_dir.display().to_string() }).to_string(),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_init_creates_store_directories() {
        let temp = TempDir::new().unwrap();
        run_command(&config_file(&temp), Command::Init).unwrap();

        assert!(temp.path().join("data").join("content").is_dir());
        assert!(temp.path().join("data").join("journal").is_dir());
    }

    #[test]
    fn test_journal_append_then_copy() {
        let temp = TempDir::new().unwrap();
        let config_path = config_file(&temp);

        run_command(
            &config_path,
            Command::Journal {
                action: JournalAction::Append {
                    name: "j1".into(),
                    records: vec!["a".into(), "b".into()],
                },
            },
        )
        .unwrap();
        run_command(
            &config_path,
            Command::Journal {
                action: JournalAction::Copy {
                    from: "j1".into(),
                    to: "j2".into(),
                },
            },
        )
        .unwrap();

        // A second copy onto the same target is refused.
        let err = run_command(
            &config_path,
            Command::Journal {
                action: JournalAction::Copy {
                    from: "j1".into(),
                    to: "j2".into(),
                },
            },
        )
        .unwrap_err();
        assert_eq!(err.code_str(), "FEED_CLI_COMMIT_FAILED");

        let config = StoreConfig::load(&config_path).unwrap();
        let storage = config.open_journal_storage().unwrap();
        assert_eq!(
            storage.read("j2").wait().unwrap(),
            vec![b"a".to_vec(), b"b".to_vec()]
        );
    }

    #[test]
    fn test_content_put_rejects_empty_value() {
        let temp = TempDir::new().unwrap();
        let err = run_command(
            &config_file(&temp),
            Command::Content {
                action: ContentAction::Put {
                    key: "k".into(),
                    value: String::new(),
                },
            },
        )
        .unwrap_err();
        assert_eq!(err.code_str(), "FEED_CLI_COMMIT_FAILED");
    }

    #[test]
    fn test_missing_config_is_config_error() {
        let temp = TempDir::new().unwrap();
        let err = run_command(&temp.path().join("absent.json"), Command::Stats).unwrap_err();
        assert_eq!(err.code_str(), "FEED_CLI_CONFIG_ERROR");
    }
}
