use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{NameError, NameKind};
use crate::reserved;

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 63;

/// A validated user column name.
///
/// Starts with a lowercase letter, lowercase alphanumeric/underscore,
/// length 3-63, not a system column, not a reserved SQL keyword. Checks run
/// in that order and the first failure is reported.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnName(String);

impl ColumnName {
    /// Validates and wraps a column name.
    pub fn new(s: impl Into<String>) -> Result<Self, NameError> {
        let s = s.into();
        if s.is_empty() {
            return Err(NameError::Empty {
                kind: NameKind::Column,
            });
        }
        if !(MIN_LEN..=MAX_LEN).contains(&s.len()) {
            return Err(NameError::LengthOutOfRange {
                kind: NameKind::Column,
                len: s.len(),
                name: s,
                min: MIN_LEN,
                max: MAX_LEN,
            });
        }
        if reserved::is_system_column(&s) {
            return Err(NameError::SystemColumn { name: s });
        }
        if !matches_pattern(&s) {
            return Err(NameError::InvalidPattern {
                kind: NameKind::Column,
                name: s,
            });
        }
        if reserved::is_reserved_keyword(&s) {
            return Err(NameError::ReservedKeyword { name: s });
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
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ColumnName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ColumnName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_names() {
        for name in ["email", "full_name", "price2", "abc"] {
            assert!(ColumnName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(ColumnName::new(""), Err(NameError::Empty { .. })));
    }

    #[test]
    fn boundary_lengths() {
        // 2 and 64 rejected; 3 and 63 accepted.
        assert!(matches!(
            ColumnName::new("ab"),
            Err(NameError::LengthOutOfRange { .. })
        ));
        assert!(ColumnName::new("abc").is_ok());
        assert!(ColumnName::new("a".repeat(63)).is_ok());
        assert!(matches!(
            ColumnName::new("a".repeat(64)),
            Err(NameError::LengthOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_system_columns() {
        assert!(matches!(
            ColumnName::new("pkid"),
            Err(NameError::SystemColumn { .. })
        ));
        // "id" is length 2: the length check fires before the system check.
        assert!(matches!(
            ColumnName::new("id"),
            Err(NameError::LengthOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_uppercase_and_bad_patterns() {
        for name in ["Email", "fullName", "1abc", "_abc", "has-dash"] {
            assert!(
                matches!(
                    ColumnName::new(name),
                    Err(NameError::InvalidPattern { .. })
                ),
                "{name} should fail the pattern check"
            );
        }
    }

    #[test]
    fn rejects_reserved_keywords() {
        for name in ["select", "update", "values", "offset"] {
            assert!(
                matches!(
                    ColumnName::new(name),
                    Err(NameError::ReservedKeyword { .. })
                ),
                "{name} should be a reserved keyword"
            );
        }
    }

    #[test]
    fn serde_roundtrip() {
        let name = ColumnName::new("email").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        let back: ColumnName = serde_json::from_str(&json).unwrap();
        assert_eq!(name, back);
    }

    #[test]
    fn serde_rejects_invalid() {
        let result: Result<ColumnName, _> = serde_json::from_str("\"pkid\"");
        assert!(result.is_err());
    }
}
