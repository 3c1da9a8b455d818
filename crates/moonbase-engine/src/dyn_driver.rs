//! Object-safe wrappers over the RPITIT driver traits.
//!
//! RPITIT traits cannot be used as `dyn Trait`. These wrappers use boxed
//! futures to enable dynamic dispatch for handler state; the blanket impls
//! make every concrete driver usable as `Arc<dyn DynSqlDriver>` for free.

use std::future::Future;
use std::pin::Pin;

use moonbase_sql::{Dialect, SqlParam, SqlRow};

use crate::driver::{DriverError, SqlDriver, SqlTransaction};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe form of [`SqlTransaction`].
pub trait DynSqlTransaction: Send {
    fn execute<'a>(
        &'a mut self,
        sql: &'a str,
        params: &'a [SqlParam],
    ) -> BoxFuture<'a, Result<u64, DriverError>>;

    fn fetch_optional<'a>(
        &'a mut self,
        sql: &'a str,
        params: &'a [SqlParam],
    ) -> BoxFuture<'a, Result<Option<SqlRow>, DriverError>>;

    fn commit(self: Box<Self>) -> BoxFuture<'static, Result<(), DriverError>>;

    fn rollback(self: Box<Self>) -> BoxFuture<'static, Result<(), DriverError>>;
}

impl<T: SqlTransaction + 'static> DynSqlTransaction for T {
    fn execute<'a>(
        &'a mut self,
        sql: &'a str,
        params: &'a [SqlParam],
    ) -> BoxFuture<'a, Result<u64, DriverError>> {
        Box::pin(SqlTransaction::execute(self, sql, params))
    }

    fn fetch_optional<'a>(
        &'a mut self,
        sql: &'a str,
        params: &'a [SqlParam],
    ) -> BoxFuture<'a, Result<Option<SqlRow>, DriverError>> {
        Box::pin(SqlTransaction::fetch_optional(self, sql, params))
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, Result<(), DriverError>> {
        Box::pin(SqlTransaction::commit(*self))
    }

    fn rollback(self: Box<Self>) -> BoxFuture<'static, Result<(), DriverError>> {
        Box::pin(SqlTransaction::rollback(*self))
    }
}

/// Object-safe form of [`SqlDriver`].
pub trait DynSqlDriver: Send + Sync {
    fn dialect(&self) -> Dialect;

    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [SqlParam],
    ) -> BoxFuture<'a, Result<u64, DriverError>>;

    fn fetch_all<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [SqlParam],
    ) -> BoxFuture<'a, Result<Vec<SqlRow>, DriverError>>;

    fn fetch_optional<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [SqlParam],
    ) -> BoxFuture<'a, Result<Option<SqlRow>, DriverError>>;

    fn begin(&self) -> BoxFuture<'_, Result<Box<dyn DynSqlTransaction>, DriverError>>;
}

impl<D: SqlDriver + 'static> DynSqlDriver for D {
    fn dialect(&self) -> Dialect {
        SqlDriver::dialect(self)
    }

    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [SqlParam],
    ) -> BoxFuture<'a, Result<u64, DriverError>> {
        Box::pin(SqlDriver::execute(self, sql, params))
    }

    fn fetch_all<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [SqlParam],
    ) -> BoxFuture<'a, Result<Vec<SqlRow>, DriverError>> {
        Box::pin(SqlDriver::fetch_all(self, sql, params))
    }

    fn fetch_optional<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [SqlParam],
    ) -> BoxFuture<'a, Result<Option<SqlRow>, DriverError>> {
        Box::pin(SqlDriver::fetch_optional(self, sql, params))
    }

    fn begin(&self) -> BoxFuture<'_, Result<Box<dyn DynSqlTransaction>, DriverError>> {
        Box::pin(async move {
            let tx = SqlDriver::begin(self).await?;
            Ok(Box::new(tx) as Box<dyn DynSqlTransaction>)
        })
    }
}
