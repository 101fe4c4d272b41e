//! Offset-to-key addressing
//!
//! Offsets are zero-padded to 20 decimal digits, enough for `u64::MAX`, so
//! lexicographic key order equals numeric offset order.
//!
//! Example: prefix "wal", offset 42 → "wal/00000000000000000042"

use crate::error::{Result, WalError};
use regex::Regex;
use std::fmt;

/// Digits in the offset component of a key
pub const OFFSET_DIGITS: usize = 20;

/// Longest object key accepted by common object stores
pub const MAX_KEY_LEN: usize = 1024;

/// Build the store key for `offset` under `prefix`
pub fn object_key(prefix: &str, offset: u64) -> String {
    format!("{}/{:020}", prefix, offset)
}

/// Parse a store key back into its offset
///
/// Only keys of the exact form `prefix/` + 20 ASCII digits are accepted.
pub fn parse_key(prefix: &str, key: &str) -> Option<u64> {
    let digits = key.strip_prefix(prefix)?.strip_prefix('/')?;
    if digits.len() != OFFSET_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Validated key prefix identifying one log within a store
///
/// # Rules
/// - Non-empty, no leading or trailing `/`, no empty segments
/// - Characters safe in object keys: `A-Z a-z 0-9 ! - _ . * ' ( ) /`
/// - No `.` or `..` segments, and no segment starting with `.tmp-`, so the
///   prefix maps onto a directory tree without escaping it
/// - Full keys under the prefix must fit in 1024 bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    /// Pattern for slash-separated segments of safe characters
    const PATTERN: &'static str = r"^[A-Za-z0-9!_.*'()\-]+(/[A-Za-z0-9!_.*'()\-]+)*$";

    /// Segment prefix reserved for in-flight temporary files
    const RESERVED_SEGMENT_PREFIX: &'static str = ".tmp-";

    /// Longest prefix that still leaves room for "/" and the offset digits
    pub const MAX_LENGTH: usize = MAX_KEY_LEN - 1 - OFFSET_DIGITS;

    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        Self::validate_prefix(&prefix)?;
        Ok(Namespace(prefix))
    }

    fn validate_prefix(prefix: &str) -> Result<()> {
        if prefix.is_empty() {
            return Err(WalError::InvalidNamespace(
                "prefix cannot be empty".to_string(),
            ));
        }

        if prefix.len() > Self::MAX_LENGTH {
            return Err(WalError::InvalidNamespace(format!(
                "prefix too long: {} bytes (max {})",
                prefix.len(),
                Self::MAX_LENGTH
            )));
        }

        let re = Regex::new(Self::PATTERN)
            .map_err(|e| WalError::InvalidNamespace(format!("pattern error: {}", e)))?;
        if !re.is_match(prefix) {
            return Err(WalError::InvalidNamespace(format!(
                "prefix '{}' must be '/'-separated segments of letters, digits and !-_.*'()",
                prefix
            )));
        }

        if let Some(segment) = prefix.split('/').find(|s| {
            *s == "." || *s == ".." || s.starts_with(Self::RESERVED_SEGMENT_PREFIX)
        }) {
            return Err(WalError::InvalidNamespace(format!(
                "prefix '{}' contains reserved segment '{}'",
                prefix, segment
            )));
        }

        Ok(())
    }

    /// Store key for `offset` in this namespace
    pub fn key(&self, offset: u64) -> String {
        object_key(&self.0, offset)
    }

    /// Offset encoded in `key`, if it belongs to this namespace
    pub fn offset_of(&self, key: &str) -> Option<u64> {
        parse_key(&self.0, key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(object_key("wal", 42), "wal/00000000000000000042");
        assert_eq!(object_key("log", 1), "log/00000000000000000001");
        assert_eq!(object_key("wal", u64::MAX), "wal/18446744073709551615");
    }

    #[test]
    fn test_key_ordering() {
        let offsets = [0u64, 1, 9, 10, 99, 100, 1 << 32, u64::MAX - 1, u64::MAX];
        for pair in offsets.windows(2) {
            assert!(object_key("wal", pair[0]) < object_key("wal", pair[1]));
        }
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("wal", "wal/00000000000000000042"), Some(42));
        assert_eq!(parse_key("a/b", &object_key("a/b", u64::MAX)), Some(u64::MAX));

        assert_eq!(parse_key("wal", "wal/42"), None);
        assert_eq!(parse_key("wal", "other/00000000000000000042"), None);
        assert_eq!(parse_key("wal", "wal00000000000000000042"), None);
        assert_eq!(parse_key("wal", "wal/0000000000000000004x"), None);
        assert_eq!(parse_key("wal", "wal/+0000000000000000042"), None);
        // 20 digits above u64::MAX
        assert_eq!(parse_key("wal", "wal/99999999999999999999"), None);
    }

    #[test]
    fn test_namespace_validation() {
        assert!(Namespace::new("wal").is_ok());
        assert!(Namespace::new("tenants/acme/wal-01").is_ok());
        assert!(Namespace::new("my_log.v2").is_ok());

        assert!(Namespace::new("").is_err());
        assert!(Namespace::new("/wal").is_err());
        assert!(Namespace::new("wal/").is_err());
        assert!(Namespace::new("a//b").is_err());
        assert!(Namespace::new("has space").is_err());
        assert!(Namespace::new("a".repeat(Namespace::MAX_LENGTH)).is_ok());
        assert!(Namespace::new("a".repeat(Namespace::MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_namespace_rejects_dot_segments() {
        for prefix in ["..", ".", "wal/..", "./wal", "a/./b", "a/.tmp-x", ".tmp-", "wal/../other"] {
            assert!(
                matches!(Namespace::new(prefix), Err(WalError::InvalidNamespace(_))),
                "prefix {:?} should be rejected",
                prefix
            );
        }

        // Dots inside a segment are fine
        assert!(Namespace::new("...").is_ok());
        assert!(Namespace::new("a/.hidden").is_ok());
        assert!(Namespace::new("wal/v1..2").is_ok());
        assert!(Namespace::new("tmp-x/.tmp").is_ok());
    }

    #[test]
    fn test_longest_key_fits() {
        let ns = Namespace::new("a".repeat(Namespace::MAX_LENGTH)).unwrap();
        assert_eq!(ns.key(u64::MAX).len(), MAX_KEY_LEN);
        assert_eq!(ns.offset_of(&ns.key(77)), Some(77));
    }
}
