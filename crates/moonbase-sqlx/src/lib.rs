//! sqlx-backed SQL driver for moonbase.
//!
//! One driver covers all three dialects through sqlx's `Any` layer; the
//! dialect is derived from the connection URL. This crate is the only place
//! that touches sqlx: it binds [`SqlParam`]s, decodes rows into
//! [`SqlRow`]s, and classifies sqlx errors into [`DriverError`]s.

pub mod reflect;

use chrono::{DateTime, Utc};
use moonbase_engine::driver::{DriverError, SqlDriver, SqlTransaction};
use moonbase_sql::{Dialect, SqlParam, SqlRow, SqlScalar};
use sqlx::any::{Any, AnyArguments, AnyPoolOptions, AnyRow, AnyTypeInfoKind};
use sqlx::pool::PoolOptions;
use sqlx::query::Query;
use sqlx::{AnyPool, Column, Row, ValueRef};

/// A pooled connection to one of the supported stores.
pub struct SqlxDriver {
    pool: AnyPool,
    dialect: Dialect,
}

impl SqlxDriver {
    /// Connects with default pool settings.
    pub async fn connect(url: &str) -> Result<Self, DriverError> {
        Self::connect_with(url, AnyPoolOptions::new().max_connections(10)).await
    }

    /// Connects with caller-supplied pool options.
    pub async fn connect_with(
        url: &str,
        options: PoolOptions<Any>,
    ) -> Result<Self, DriverError> {
        sqlx::any::install_default_drivers();
        let dialect = dialect_from_url(url)?;
        let pool = options.connect(url).await.map_err(map_sqlx_error)?;
        Ok(Self { pool, dialect })
    }

    /// The underlying pool, for shutdown.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

/// Derives the dialect from a connection URL scheme.
pub fn dialect_from_url(url: &str) -> Result<Dialect, DriverError> {
    let scheme = url.split(':').next().unwrap_or("");
    match scheme {
        "postgres" | "postgresql" => Ok(Dialect::Postgres),
        "mysql" => Ok(Dialect::MySql),
        "sqlite" => Ok(Dialect::Sqlite),
        other => Err(DriverError::other(format!(
            "unsupported database URL scheme '{other}'"
        ))),
    }
}

impl SqlDriver for SqlxDriver {
    type Tx = SqlxTransaction;

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<u64, DriverError> {
        let query = bind_params(sqlx::query(sql), params, self.dialect);
        let result = query.execute(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<SqlRow>, DriverError> {
        let query = bind_params(sqlx::query(sql), params, self.dialect);
        let rows = query.fetch_all(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn fetch_optional(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Option<SqlRow>, DriverError> {
        let query = bind_params(sqlx::query(sql), params, self.dialect);
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.as_ref().map(decode_row))
    }

    async fn begin(&self) -> Result<Self::Tx, DriverError> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(SqlxTransaction {
            tx,
            dialect: self.dialect,
        })
    }
}

/// An open sqlx transaction. Dropping without commit rolls back (sqlx
/// guarantee), which is the cancellation path for atomic batches.
pub struct SqlxTransaction {
    tx: sqlx::Transaction<'static, Any>,
    dialect: Dialect,
}

impl SqlTransaction for SqlxTransaction {
    async fn execute(&mut self, sql: &str, params: &[SqlParam]) -> Result<u64, DriverError> {
        let query = bind_params(sqlx::query(sql), params, self.dialect);
        let result = query
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn fetch_optional(
        &mut self,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Option<SqlRow>, DriverError> {
        let query = bind_params(sqlx::query(sql), params, self.dialect);
        let row = query
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.as_ref().map(decode_row))
    }

    async fn commit(self) -> Result<(), DriverError> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self) -> Result<(), DriverError> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

// ---------------------------------------------------------------------------
// Binding and decoding
// ---------------------------------------------------------------------------

fn bind_params<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    params: &[SqlParam],
    dialect: Dialect,
) -> Query<'q, Any, AnyArguments<'q>> {
    let mut query = query;
    for param in params {
        query = match param {
            SqlParam::Null => query.bind(Option::<String>::None),
            SqlParam::Text(s) => query.bind(s.clone()),
            SqlParam::Int(i) => query.bind(*i),
            SqlParam::Bool(b) => query.bind(*b),
            // Decimals travel as text; Postgres statements carry an explicit
            // CAST around the placeholder.
            SqlParam::Decimal(s) => query.bind(s.clone()),
            SqlParam::DateTime(dt) => query.bind(format_datetime(dialect, dt)),
        };
    }
    query
}

/// Datetime wire format per dialect. MySQL's DATETIME accepts no timezone
/// suffix; the others take RFC 3339.
fn format_datetime(dialect: Dialect, dt: &DateTime<Utc>) -> String {
    match dialect {
        Dialect::MySql => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Dialect::Postgres | Dialect::Sqlite => dt.to_rfc3339(),
    }
}

fn decode_row(row: &AnyRow) -> SqlRow {
    let pairs = row
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| (column.name().to_string(), decode_scalar(row, index)))
        .collect();
    SqlRow::from_pairs(pairs)
}

fn decode_scalar(row: &AnyRow, index: usize) -> SqlScalar {
    let raw = match row.try_get_raw(index) {
        Ok(raw) => raw,
        Err(_) => return SqlScalar::Null,
    };
    if raw.is_null() {
        return SqlScalar::Null;
    }
    let kind = raw.type_info().kind();
    match kind {
        AnyTypeInfoKind::SmallInt | AnyTypeInfoKind::Integer | AnyTypeInfoKind::BigInt => row
            .try_get::<i64, _>(index)
            .map(SqlScalar::Int)
            .unwrap_or(SqlScalar::Null),
        AnyTypeInfoKind::Real | AnyTypeInfoKind::Double => row
            .try_get::<f64, _>(index)
            .map(SqlScalar::Float)
            .unwrap_or(SqlScalar::Null),
        AnyTypeInfoKind::Bool => row
            .try_get::<bool, _>(index)
            .map(SqlScalar::Bool)
            .unwrap_or(SqlScalar::Null),
        AnyTypeInfoKind::Blob => row
            .try_get::<Vec<u8>, _>(index)
            .map(SqlScalar::Bytes)
            .unwrap_or(SqlScalar::Null),
        AnyTypeInfoKind::Text => row
            .try_get::<String, _>(index)
            .map(SqlScalar::Text)
            .unwrap_or(SqlScalar::Null),
        AnyTypeInfoKind::Null => SqlScalar::Null,
    }
}

fn map_sqlx_error(error: sqlx::Error) -> DriverError {
    match &error {
        sqlx::Error::Database(db) => {
            if db.is_unique_violation() {
                DriverError::unique_violation(db.message().to_string())
            } else {
                DriverError::other(db.message().to_string())
            }
        }
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            DriverError::io(error.to_string())
        }
        _ => DriverError::other(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_scheme_detection() {
        assert_eq!(
            dialect_from_url("postgres://u@localhost/db").unwrap(),
            Dialect::Postgres
        );
        assert_eq!(
            dialect_from_url("postgresql://u@localhost/db").unwrap(),
            Dialect::Postgres
        );
        assert_eq!(
            dialect_from_url("mysql://u@localhost/db").unwrap(),
            Dialect::MySql
        );
        assert_eq!(dialect_from_url("sqlite:data.db").unwrap(), Dialect::Sqlite);
        assert!(dialect_from_url("oracle://x").is_err());
    }

    #[test]
    fn mysql_datetime_has_no_timezone_suffix() {
        let dt = DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            format_datetime(Dialect::MySql, &dt),
            "2024-01-15 10:30:00"
        );
        assert_eq!(
            format_datetime(Dialect::Sqlite, &dt),
            "2024-01-15T10:30:00+00:00"
        );
    }
}
