use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ulid::Ulid;

/// The externally visible record identifier: a 26-character
/// Crockford-base32 ULID. Lexicographic order equals generation order,
/// which keyset pagination depends on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(String);

/// Error for malformed record ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecordId {
    pub value: String,
}

impl fmt::Display for InvalidRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid record id '{}': expected a 26-character ULID",
            self.value
        )
    }
}

impl std::error::Error for InvalidRecordId {}

impl RecordId {
    /// Parses a record id, validating ULID length and alphabet.
    pub fn parse(s: &str) -> Result<Self, InvalidRecordId> {
        Ulid::from_string(s)
            .map(|u| Self(u.to_string()))
            .map_err(|_| InvalidRecordId {
                value: s.to_string(),
            })
    }

    /// Wraps a freshly generated ULID.
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid.to_string())
    }

    /// Returns the canonical 26-character string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Process-wide monotonic ULID source.
///
/// Wraps `ulid::Generator`, which bumps the random component when two ids
/// land in the same millisecond, so ids are strictly increasing within a
/// process. The mutex is held only for the generation itself.
pub struct IdFactory {
    generator: Mutex<ulid::Generator>,
}

impl std::fmt::Debug for IdFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdFactory").finish_non_exhaustive()
    }
}

impl Default for IdFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl IdFactory {
    pub fn new() -> Self {
        Self {
            generator: Mutex::new(ulid::Generator::new()),
        }
    }

    /// Generates the next id. On random-component overflow (astronomically
    /// rare: 2^80 ids in one millisecond) waits for the next tick.
    pub fn next_id(&self) -> RecordId {
        let mut generator = match self.generator.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        loop {
            match generator.generate() {
                Ok(ulid) => return RecordId::from_ulid(ulid),
                Err(_) => std::thread::yield_now(),
            }
        }
    }
}
