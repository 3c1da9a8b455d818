use std::fmt;

use moonbase_core::changeset::ChangeError;
use moonbase_core::error::{LimitError, NameError, SchemaError};
use moonbase_core::types::ValueError;
use moonbase_sql::{DdlError, QueryParseError};

use crate::driver::DriverError;

/// Errors surfaced by the schema manager, data engine, and batch executor.
///
/// The HTTP layer maps each variant to a status code; variants carry enough
/// context to render the error envelope without further lookups.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Request failed validation before touching the store.
    Validation { message: String },
    /// Collection not registered.
    CollectionNotFound { name: String },
    /// Collection name already registered.
    CollectionExists { name: String },
    /// Record not found by id.
    RecordNotFound { collection: String, id: String },
    /// Unique-constraint clash from the store.
    Conflict { message: String },
    /// A configured limit was exceeded.
    Limit(LimitError),
    /// A DDL statement failed mid-sequence. The registry kept its snapshot;
    /// the physical store may have absorbed earlier statements.
    Ddl {
        statement_index: usize,
        message: String,
    },
    /// Driver failure outside DDL.
    Driver(DriverError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { message } => write!(f, "{message}"),
            Self::CollectionNotFound { name } => {
                write!(f, "collection '{name}' not found")
            }
            Self::CollectionExists { name } => {
                write!(f, "collection '{name}' already exists")
            }
            Self::RecordNotFound { collection, id } => {
                write!(f, "record '{id}' not found in collection '{collection}'")
            }
            Self::Conflict { message } => write!(f, "{message}"),
            Self::Limit(e) => write!(f, "{e}"),
            Self::Ddl {
                statement_index,
                message,
            } => {
                write!(
                    f,
                    "schema change failed at statement {statement_index}: {message}"
                )
            }
            Self::Driver(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<SchemaError> for EngineError {
    fn from(e: SchemaError) -> Self {
        Self::validation(e.to_string())
    }
}

impl From<NameError> for EngineError {
    fn from(e: NameError) -> Self {
        Self::validation(e.to_string())
    }
}

impl From<ChangeError> for EngineError {
    fn from(e: ChangeError) -> Self {
        Self::validation(e.to_string())
    }
}

impl From<ValueError> for EngineError {
    fn from(e: ValueError) -> Self {
        Self::validation(e.to_string())
    }
}

impl From<DdlError> for EngineError {
    fn from(e: DdlError) -> Self {
        Self::validation(e.to_string())
    }
}

impl From<LimitError> for EngineError {
    fn from(e: LimitError) -> Self {
        Self::Limit(e)
    }
}

impl From<QueryParseError> for EngineError {
    fn from(e: QueryParseError) -> Self {
        match e {
            QueryParseError::Limit(limit) => Self::Limit(limit),
            other => Self::validation(other.to_string()),
        }
    }
}

impl From<DriverError> for EngineError {
    fn from(e: DriverError) -> Self {
        if e.is_unique_violation() {
            Self::Conflict {
                message: e.to_string(),
            }
        } else {
            Self::Driver(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_becomes_conflict() {
        let err: EngineError = DriverError::unique_violation("email taken").into();
        assert!(matches!(err, EngineError::Conflict { .. }));
    }

    #[test]
    fn io_error_stays_driver() {
        let err: EngineError = DriverError::io("connection reset").into();
        assert!(matches!(err, EngineError::Driver(_)));
    }

    #[test]
    fn limit_parse_error_keeps_limit_shape() {
        let err: EngineError =
            QueryParseError::Limit(LimitError::TooManyFilters { count: 9, max: 5 }).into();
        assert!(matches!(err, EngineError::Limit(_)));
    }

    #[test]
    fn ddl_error_names_statement_index() {
        let err = EngineError::Ddl {
            statement_index: 2,
            message: "column exists".into(),
        };
        assert!(err.to_string().contains("statement 2"));
    }
}
