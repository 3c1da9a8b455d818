use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{NameError, NameKind};
use crate::reserved;

const MIN_LEN: usize = 2;
const MAX_LEN: usize = 63;

/// A validated collection name.
///
/// Letter-initial, alphanumeric/underscore, length 2-63, not a reserved
/// endpoint name, not a reserved SQL keyword, not prefixed with `moon`.
/// Checks run in that order and the first failure is reported.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionName(String);

impl CollectionName {
    /// Validates and wraps a collection name.
    pub fn new(s: impl Into<String>) -> Result<Self, NameError> {
        let s = s.into();
        if s.is_empty() {
            return Err(NameError::Empty {
                kind: NameKind::Collection,
            });
        }
        if !(MIN_LEN..=MAX_LEN).contains(&s.len()) {
            return Err(NameError::LengthOutOfRange {
                kind: NameKind::Collection,
                len: s.len(),
                name: s,
                min: MIN_LEN,
                max: MAX_LEN,
            });
        }
        if reserved::is_reserved_endpoint(&s) {
            return Err(NameError::ReservedEndpoint { name: s });
        }
        if !matches_pattern(&s) {
            return Err(NameError::InvalidPattern {
                kind: NameKind::Collection,
                name: s,
            });
        }
        if reserved::is_reserved_keyword(&s) {
            return Err(NameError::ReservedKeyword { name: s });
        }
        if reserved::has_system_prefix(&s) {
            return Err(NameError::SystemPrefix { name: s });
        }
        Ok(Self(s))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn matches_pattern(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for CollectionName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CollectionName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
