//! Journal name ↔ file name mapping
//!
//! Names are form-urlencoded (alphanumerics and `*-._` kept, space becomes
//! `+`, every other byte `%XX`). Form encoding leaves `*` alone, so it is
//! then replaced with [`ASTERISK_MARKER`]. The mapping is reversible.

use percent_encoding::percent_decode_str;

use crate::errors::{StorageError, StorageResult};

/// Stands in for `*` in file names
pub const ASTERISK_MARKER: &str = "_ATK_";

/// File name for a journal
pub fn sanitize(journal_name: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(journal_name.as_bytes()).collect();
    encoded.replace('*', ASTERISK_MARKER)
}

/// Journal name for a file produced by [`sanitize`]
///
/// # Errors
///
/// Returns `StorageError::InvalidJournalFileName` if the decoded bytes are
/// not UTF-8.
pub fn desanitize(file_name: &str) -> StorageResult<String> {
    let encoded = file_name.replace(ASTERISK_MARKER, "*").replace('+', " ");
    percent_decode_str(&encoded)
        .decode_utf8()
        .map(|name| name.into_owned())
        .map_err(|_| StorageError::InvalidJournalFileName(file_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_are_unchanged() {
        assert_eq!(sanitize("session-1.journal_a"), "session-1.journal_a");
    }

    #[test]
    fn test_special_characters() {
        assert_eq!(sanitize("a b"), "a+b");
        assert_eq!(sanitize("a/b"), "a%2Fb");
        assert_eq!(sanitize("a*b"), "a_ATK_b");
        assert_eq!(sanitize("a+b"), "a%2Bb");
        assert_eq!(sanitize("é"), "%C3%A9");
    }

    #[test]
    fn test_round_trip() {
        for name in [
            "",
            "simple",
            "with space",
            "star*name**",
            "slash/and\\back",
            "plus+percent%",
            "..",
            "ünïcödé 日本",
        ] {
            let file_name = sanitize(name);
            assert!(!file_name.contains('/'));
            assert!(!file_name.contains('*'));
            assert_eq!(desanitize(&file_name).unwrap(), name, "file name {}", file_name);
        }
    }

    #[test]
    fn test_literal_marker_does_not_round_trip() {
        // The marker is made of unreserved characters, so a name that already
        // contains it decodes with a `*` in its place.
        assert_eq!(sanitize("x_ATK_y"), "x_ATK_y");
        assert_eq!(desanitize("x_ATK_y").unwrap(), "x*y");
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        assert!(matches!(
            desanitize("%FF%FE"),
            Err(StorageError::InvalidJournalFileName(_))
        ));
    }
}
