//! Startup schema reflection: rebuilds the collection registry from the
//! physical store.
//!
//! System tables (the `moon_` prefix) and dialect-internal tables are
//! skipped; so is any table or column whose name does not survive moonbase
//! identifier validation, since it cannot have been created through the
//! API. Reflected columns carry no default values: defaults are a
//! creation-time concern and their stored form is dialect-noisy.

use moonbase_core::types::{Collection, CollectionName, Column, ColumnName, ColumnType};
use moonbase_engine::driver::DriverError;
use moonbase_engine::dyn_driver::DynSqlDriver;
use moonbase_sql::{Dialect, SqlParam, SqlRow, SqlScalar};
use tracing::{debug, warn};

/// Reads every user table from the store and rebuilds its logical schema.
pub async fn reflect_collections(
    driver: &dyn DynSqlDriver,
) -> Result<Vec<Collection>, DriverError> {
    let mut collections = Vec::new();
    for table in list_tables(driver).await? {
        let name = match CollectionName::new(table.clone()) {
            Ok(name) => name,
            Err(e) => {
                debug!(table = %table, reason = %e, "skipping non-collection table");
                continue;
            }
        };
        match reflect_table(driver, &table).await? {
            Some(columns) => match Collection::new(name, columns) {
                Ok(collection) => collections.push(collection),
                Err(e) => warn!(table = %table, reason = %e, "skipping malformed table"),
            },
            None => debug!(table = %table, "skipping table without user columns"),
        }
    }
    collections.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
    Ok(collections)
}

async fn list_tables(driver: &dyn DynSqlDriver) -> Result<Vec<String>, DriverError> {
    let sql = match driver.dialect() {
        Dialect::Postgres => {
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
             ORDER BY table_name"
        }
        Dialect::MySql => {
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' \
             ORDER BY table_name"
        }
        Dialect::Sqlite => {
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name"
        }
    };
    let rows = driver.fetch_all(sql, &[]).await?;
    Ok(rows.iter().filter_map(first_text).collect())
}

async fn reflect_table(
    driver: &dyn DynSqlDriver,
    table: &str,
) -> Result<Option<Vec<Column>>, DriverError> {
    let unique = unique_columns(driver, table).await?;
    let raw_columns = match driver.dialect() {
        Dialect::Postgres => {
            let sql = "SELECT column_name, data_type, is_nullable \
                       FROM information_schema.columns \
                       WHERE table_schema = 'public' AND table_name = $1 \
                       ORDER BY ordinal_position";
            info_schema_columns(driver, sql, table).await?
        }
        Dialect::MySql => {
            let sql = "SELECT column_name, data_type, is_nullable \
                       FROM information_schema.columns \
                       WHERE table_schema = DATABASE() AND table_name = ? \
                       ORDER BY ordinal_position";
            info_schema_columns(driver, sql, table).await?
        }
        Dialect::Sqlite => sqlite_columns(driver, table).await?,
    };

    let mut columns = Vec::new();
    for (name, native_type, nullable) in raw_columns {
        if name == "pkid" || name == "id" {
            continue;
        }
        let column_name = match ColumnName::new(name.clone()) {
            Ok(column_name) => column_name,
            Err(e) => {
                warn!(table = %table, column = %name, reason = %e, "skipping unreflectable column");
                continue;
            }
        };
        let column_type = logical_type(&native_type, driver.dialect());
        let is_unique = unique.contains(&name);
        columns.push(Column {
            name: column_name,
            column_type,
            nullable,
            unique: is_unique,
            default_value: None,
        });
    }
    Ok(if columns.is_empty() { None } else { Some(columns) })
}

async fn info_schema_columns(
    driver: &dyn DynSqlDriver,
    sql: &str,
    table: &str,
) -> Result<Vec<(String, String, bool)>, DriverError> {
    let rows = driver
        .fetch_all(sql, &[SqlParam::Text(table.to_string())])
        .await?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let name = text(row, "column_name")?;
            let native = text(row, "data_type")?;
            let nullable = text(row, "is_nullable")
                .map(|v| v.eq_ignore_ascii_case("yes"))
                .unwrap_or(true);
            Some((name, native, nullable))
        })
        .collect())
}

async fn sqlite_columns(
    driver: &dyn DynSqlDriver,
    table: &str,
) -> Result<Vec<(String, String, bool)>, DriverError> {
    // PRAGMA takes no bound parameters; the table name came from
    // sqlite_master and is still emitted quoted.
    let sql = format!("PRAGMA table_info({})", Dialect::Sqlite.quote(table));
    let rows = driver.fetch_all(&sql, &[]).await?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let name = text(row, "name")?;
            let native = text(row, "type").unwrap_or_default();
            let not_null = matches!(row.get("notnull"), Some(SqlScalar::Int(1)));
            Some((name, native, !not_null))
        })
        .collect())
}

async fn unique_columns(
    driver: &dyn DynSqlDriver,
    table: &str,
) -> Result<Vec<String>, DriverError> {
    match driver.dialect() {
        Dialect::Postgres => {
            let sql = "SELECT kcu.column_name AS column_name \
                       FROM information_schema.table_constraints tc \
                       JOIN information_schema.key_column_usage kcu \
                         ON kcu.constraint_name = tc.constraint_name \
                        AND kcu.table_schema = tc.table_schema \
                       WHERE tc.table_schema = 'public' AND tc.table_name = $1 \
                         AND tc.constraint_type = 'UNIQUE'";
            let rows = driver
                .fetch_all(sql, &[SqlParam::Text(table.to_string())])
                .await?;
            Ok(rows.iter().filter_map(|r| text(r, "column_name")).collect())
        }
        Dialect::MySql => {
            let sql = "SELECT column_name FROM information_schema.statistics \
                       WHERE table_schema = DATABASE() AND table_name = ? \
                         AND non_unique = 0 AND index_name <> 'PRIMARY'";
            let rows = driver
                .fetch_all(sql, &[SqlParam::Text(table.to_string())])
                .await?;
            Ok(rows.iter().filter_map(|r| text(r, "column_name")).collect())
        }
        Dialect::Sqlite => {
            let list_sql = format!("PRAGMA index_list({})", Dialect::Sqlite.quote(table));
            let indexes = driver.fetch_all(&list_sql, &[]).await?;
            let mut columns = Vec::new();
            for index in &indexes {
                let is_unique = matches!(index.get("unique"), Some(SqlScalar::Int(1)));
                let Some(index_name) = text(index, "name") else {
                    continue;
                };
                if !is_unique {
                    continue;
                }
                let info_sql = format!(
                    "PRAGMA index_info({})",
                    Dialect::Sqlite.quote(&index_name)
                );
                let members = driver.fetch_all(&info_sql, &[]).await?;
                // Multi-column unique indexes cannot come from the API.
                if members.len() == 1 {
                    if let Some(column) = text(&members[0], "name") {
                        columns.push(column);
                    }
                }
            }
            Ok(columns)
        }
    }
}

/// Reverse-maps a native column type to the logical type model.
///
/// SQLite stores datetimes and JSON as TEXT, so those reflect as `string`;
/// the registry is an approximation there until the collection is next
/// created through the API.
pub fn logical_type(native: &str, dialect: Dialect) -> ColumnType {
    let native = native.to_ascii_lowercase();
    if native == "boolean" || native == "bool" {
        return ColumnType::Boolean;
    }
    // MySQL reports TINYINT(1) as plain "tinyint" in data_type; the API
    // only ever creates tinyint columns for booleans.
    if native.starts_with("tinyint") && dialect == Dialect::MySql {
        return ColumnType::Boolean;
    }
    if native.contains("int") {
        return ColumnType::Integer;
    }
    if native.contains("numeric") || native.contains("decimal") {
        return ColumnType::Decimal;
    }
    if native.contains("double") || native.contains("real") || native.contains("float") {
        return ColumnType::Decimal;
    }
    if native.contains("timestamp") || native.contains("datetime") || native == "date" {
        return ColumnType::DateTime;
    }
    if native.contains("json") {
        return ColumnType::Json;
    }
    if dialect == Dialect::MySql && native == "longtext" {
        return ColumnType::Json;
    }
    ColumnType::String
}

fn text(row: &SqlRow, column: &str) -> Option<String> {
    match row.get(column)? {
        SqlScalar::Text(s) => Some(s.clone()),
        SqlScalar::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
        _ => None,
    }
}

fn first_text(row: &SqlRow) -> Option<String> {
    match row.values.first()? {
        SqlScalar::Text(s) => Some(s.clone()),
        SqlScalar::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
        _ => None,
    }
}
