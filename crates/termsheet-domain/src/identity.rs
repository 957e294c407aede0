//! Document and record identity

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 digest of raw document bytes as 64 lowercase hex characters
///
/// Advisory only: identical bytes produce identical hashes, which lets a
/// caller detect a resubmission. Nothing enforces uniqueness on it.
///
/// # Examples
///
/// ```
/// use termsheet_domain::content_hash;
///
/// let hash = content_hash(b"%PDF-1.7");
/// assert_eq!(hash.len(), 64);
/// ```
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Identity of a persisted extraction (the summary row's key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Wrap a raw row id
    pub fn from_value(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw row id
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_is_stable_and_content_sensitive() {
        let a = content_hash(b"contract v1");
        assert_eq!(a, content_hash(b"contract v1"));
        assert_ne!(a, content_hash(b"contract v2"));
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_record_id_parse_and_display() {
        let id: RecordId = " 42 ".parse().unwrap();
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<RecordId>().is_err());
    }
}
