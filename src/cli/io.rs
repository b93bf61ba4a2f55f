//! JSON output for CLI commands
//!
//! - Output: one JSON object per command on stdout
//! - UTF-8 only; stored bytes are printed lossily

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde_json::{json, Value};

use super::errors::CliResult;
use crate::content::ContentMap;

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_value(&mut io::stdout(), &success(data))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_value(&mut io::stdout(), &failure(code, message))
}

pub(crate) fn success(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

pub(crate) fn failure(code: &str, message: &str) -> Value {
    json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

fn write_value<W: Write>(writer: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Stored bytes as text
pub fn bytes_to_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Records as a JSON array of strings
pub fn records_to_json(records: &[Vec<u8>]) -> Value {
    Value::from(
        records
            .iter()
            .map(|record| bytes_to_text(record))
            .collect::<Vec<_>>(),
    )
}

/// Entries as a JSON object with sorted keys
pub fn entries_to_json(entries: &ContentMap) -> Value {
    let sorted: BTreeMap<&str, String> = entries
        .iter()
        .map(|(key, value)| (key.as_str(), bytes_to_text(value)))
        .collect();
    json!(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shapes() {
        let ok = success(json!({"journals": []}));
        assert_eq!(ok["status"], "ok");
        assert!(ok["data"]["journals"].is_array());

        let err = failure("FEED_CLI_IO_ERROR", "boom");
        assert_eq!(err["status"], "error");
        assert_eq!(err["code"], "FEED_CLI_IO_ERROR");
    }

    #[test]
    fn test_write_value_is_one_line() {
        let mut buffer = Vec::new();
        write_value(&mut buffer, &success(json!("x"))).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.matches('\n').count(), 1);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_entries_are_sorted_and_lossy() {
        let mut entries = ContentMap::new();
        entries.insert("b".to_string(), b"2".to_vec());
        entries.insert("a".to_string(), vec![0xff]);

        let json = entries_to_json(&entries);
        assert_eq!(json["a"], "\u{fffd}");
        assert_eq!(json["b"], "2");
        assert!(json.to_string().starts_with("{\"a\""));
        assert_eq!(records_to_json(&[b"x".to_vec()]), json!(["x"]));
    }
}
