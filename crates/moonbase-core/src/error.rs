use std::fmt;

/// Which identifier family a name error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Collection,
    Column,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection => write!(f, "collection"),
            Self::Column => write!(f, "column"),
        }
    }
}

/// Errors produced by collection and column name validation.
///
/// Validation checks run in a fixed order (nonempty, length, reserved
/// endpoint / system column, pattern, reserved keyword, system prefix) and
/// the first failing check wins.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NameError {
    /// The name was empty.
    Empty { kind: NameKind },
    /// The name length is outside the allowed bounds.
    LengthOutOfRange {
        kind: NameKind,
        name: String,
        len: usize,
        min: usize,
        max: usize,
    },
    /// The collection name collides with a fixed endpoint path.
    ReservedEndpoint { name: String },
    /// The column name collides with an implicit system column.
    SystemColumn { name: String },
    /// The name does not match the identifier pattern.
    InvalidPattern { kind: NameKind, name: String },
    /// The name is a reserved SQL keyword.
    ReservedKeyword { name: String },
    /// The collection name begins with the system prefix.
    SystemPrefix { name: String },
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { kind } => write!(f, "{kind} name must not be empty"),
            Self::LengthOutOfRange {
                kind,
                name,
                len,
                min,
                max,
            } => {
                write!(
                    f,
                    "{kind} name '{name}' has length {len}, must be between {min} and {max}"
                )
            }
            Self::ReservedEndpoint { name } => {
                write!(f, "collection name '{name}' is a reserved endpoint name")
            }
            Self::SystemColumn { name } => {
                write!(f, "column name '{name}' is a system column and cannot be used")
            }
            Self::InvalidPattern { kind, name } => match kind {
                NameKind::Collection => write!(
                    f,
                    "invalid collection name '{name}': must start with a letter and contain only letters, digits, and underscores"
                ),
                NameKind::Column => write!(
                    f,
                    "invalid column name '{name}': must start with a lowercase letter and contain only lowercase letters, digits, and underscores"
                ),
            },
            Self::ReservedKeyword { name } => {
                write!(f, "name '{name}' is a reserved SQL keyword")
            }
            Self::SystemPrefix { name } => {
                write!(
                    f,
                    "collection name '{name}' is reserved: the 'moon' prefix is used by system tables"
                )
            }
        }
    }
}

impl std::error::Error for NameError {}

/// Errors that occur when constructing a collection or its columns.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// A name failed validation.
    Name(NameError),
    /// Duplicate column name within one collection.
    DuplicateColumn { name: String },
    /// Collection has no user columns.
    NoColumns,
    /// A default value was supplied for a NOT NULL column.
    DefaultOnNotNull { column: String },
    /// A default value does not match the declared column type.
    InvalidDefault {
        column: String,
        column_type: String,
        value: String,
        reason: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(e) => write!(f, "{e}"),
            Self::DuplicateColumn { name } => write!(f, "duplicate column name '{name}'"),
            Self::NoColumns => write!(f, "collection must declare at least one column"),
            Self::DefaultOnNotNull { column } => {
                write!(
                    f,
                    "column '{column}' is NOT NULL: default values are only permitted on nullable columns"
                )
            }
            Self::InvalidDefault {
                column,
                column_type,
                value,
                reason,
            } => {
                write!(
                    f,
                    "invalid default '{value}' for {column_type} column '{column}': {reason}"
                )
            }
        }
    }
}

impl std::error::Error for SchemaError {}

impl From<NameError> for SchemaError {
    fn from(e: NameError) -> Self {
        Self::Name(e)
    }
}

/// A configured resource limit was exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LimitError {
    TooManyCollections { count: usize, max: usize },
    TooManyColumns { count: usize, max: usize },
    TooManyFilters { count: usize, max: usize },
    TooManySortFields { count: usize, max: usize },
    BatchTooLarge { count: usize, max: usize },
    PayloadTooLarge { bytes: u64, max: u64 },
}

impl fmt::Display for LimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyCollections { count, max } => {
                write!(f, "server holds {count} collections, limit is {max}")
            }
            Self::TooManyColumns { count, max } => {
                write!(
                    f,
                    "collection would have {count} columns (system columns included), limit is {max}"
                )
            }
            Self::TooManyFilters { count, max } => {
                write!(f, "request carries {count} filters, limit is {max}")
            }
            Self::TooManySortFields { count, max } => {
                write!(f, "request carries {count} sort fields, limit is {max}")
            }
            Self::BatchTooLarge { count, max } => {
                write!(f, "batch holds {count} items, limit is {max}")
            }
            Self::PayloadTooLarge { bytes, max } => {
                write!(f, "payload is {bytes} bytes, limit is {max}")
            }
        }
    }
}

impl std::error::Error for LimitError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_error_display() {
        let cases = vec![
            (
                NameError::Empty {
                    kind: NameKind::Collection,
                },
                "collection name must not be empty",
            ),
            (
                NameError::ReservedEndpoint {
                    name: "users".into(),
                },
                "collection name 'users' is a reserved endpoint name",
            ),
            (
                NameError::SystemColumn { name: "pkid".into() },
                "column name 'pkid' is a system column and cannot be used",
            ),
            (
                NameError::ReservedKeyword {
                    name: "select".into(),
                },
                "name 'select' is a reserved SQL keyword",
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn reserved_endpoint_message_mentions_reserved() {
        let err = NameError::ReservedEndpoint {
            name: "apikeys".into(),
        };
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn length_error_carries_bounds() {
        let err = NameError::LengthOutOfRange {
            kind: NameKind::Column,
            name: "ab".into(),
            len: 2,
            min: 3,
            max: 63,
        };
        let msg = err.to_string();
        assert!(msg.contains("length 2"));
        assert!(msg.contains("between 3 and 63"));
    }

    #[test]
    fn schema_error_from_name_error() {
        let err: SchemaError = NameError::Empty {
            kind: NameKind::Column,
        }
        .into();
        assert!(matches!(err, SchemaError::Name(_)));
    }

    #[test]
    fn limit_error_messages_carry_counts() {
        let err = LimitError::TooManyFilters { count: 25, max: 20 };
        let msg = err.to_string();
        assert!(msg.contains("25"));
        assert!(msg.contains("20"));
    }

    #[test]
    fn errors_are_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(SchemaError::NoColumns);
        assert!(err.to_string().contains("at least one column"));
    }
}
