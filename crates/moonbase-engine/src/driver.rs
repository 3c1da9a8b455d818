use std::fmt;
use std::future::Future;

use moonbase_sql::{Dialect, SqlParam, SqlRow};

// ---------------------------------------------------------------------------
// DriverError
// ---------------------------------------------------------------------------

/// Classification of driver failures the engine reacts to differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DriverErrorKind {
    /// A UNIQUE constraint was violated.
    UniqueViolation,
    /// Connection or transport failure.
    Io,
    /// The request context was cancelled mid-call.
    Cancelled,
    /// Anything else the underlying driver reported.
    Other,
}

/// An error surfaced by a SQL driver.
///
/// Carries a kind for dispatch and the driver's message for diagnostics.
/// `String` payload keeps the type `Clone + Eq` across driver backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub message: String,
}

impl DriverError {
    pub fn unique_violation(message: impl Into<String>) -> Self {
        Self {
            kind: DriverErrorKind::UniqueViolation,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: DriverErrorKind::Io,
            message: message.into(),
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self {
            kind: DriverErrorKind::Cancelled,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: DriverErrorKind::Other,
            message: message.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.kind == DriverErrorKind::UniqueViolation
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DriverErrorKind::UniqueViolation => {
                write!(f, "unique constraint violated: {}", self.message)
            }
            DriverErrorKind::Io => write!(f, "driver I/O error: {}", self.message),
            DriverErrorKind::Cancelled => write!(f, "request cancelled: {}", self.message),
            DriverErrorKind::Other => write!(f, "driver error: {}", self.message),
        }
    }
}

impl std::error::Error for DriverError {}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// An open transaction on the underlying store.
///
/// Dropping an uncommitted transaction must roll it back; `commit` and
/// `rollback` consume the value so a finished transaction cannot be reused.
pub trait SqlTransaction: Send {
    /// Executes a statement inside the transaction, returning rows affected.
    fn execute(
        &mut self,
        sql: &str,
        params: &[SqlParam],
    ) -> impl Future<Output = Result<u64, DriverError>> + Send;

    /// Fetches at most one row inside the transaction.
    fn fetch_optional(
        &mut self,
        sql: &str,
        params: &[SqlParam],
    ) -> impl Future<Output = Result<Option<SqlRow>, DriverError>> + Send;

    /// Commits the transaction.
    fn commit(self) -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Rolls the transaction back.
    fn rollback(self) -> impl Future<Output = Result<(), DriverError>> + Send;
}

/// The capability set a concrete SQL store must provide.
///
/// The engine is written entirely against this trait plus the pure SQL
/// builders in `moonbase-sql`; nothing else depends on the driver crate.
///
/// Uses RPITIT for async methods, avoiding the `async-trait` crate.
pub trait SqlDriver: Send + Sync {
    type Tx: SqlTransaction + 'static;

    /// The SQL flavor of the backing store.
    fn dialect(&self) -> Dialect;

    /// Executes a statement, returning rows affected.
    fn execute(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> impl Future<Output = Result<u64, DriverError>> + Send;

    /// Fetches all rows of a query.
    fn fetch_all(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> impl Future<Output = Result<Vec<SqlRow>, DriverError>> + Send;

    /// Fetches at most one row.
    fn fetch_optional(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> impl Future<Output = Result<Option<SqlRow>, DriverError>> + Send;

    /// Opens a transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, DriverError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time bound checks; never called.
    fn _assert_driver_send_sync<T: SqlDriver>() {}
    fn _assert_tx_send<T: SqlTransaction>() {}

    #[test]
    fn error_constructors_set_kind() {
        assert!(DriverError::unique_violation("dup").is_unique_violation());
        assert_eq!(DriverError::io("x").kind, DriverErrorKind::Io);
        assert_eq!(DriverError::cancelled("x").kind, DriverErrorKind::Cancelled);
        assert_eq!(DriverError::other("x").kind, DriverErrorKind::Other);
    }

    #[test]
    fn error_display_includes_message() {
        let err = DriverError::unique_violation("customers.email");
        assert!(err.to_string().contains("customers.email"));
        assert!(err.to_string().contains("unique"));
    }
}
