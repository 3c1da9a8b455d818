//! Dialect-specific DDL generation.
//!
//! Pure string builders: no I/O. Every identifier that reaches these
//! functions has passed name validation, and is still emitted only inside
//! the dialect's quoting characters.

use std::fmt;

use moonbase_core::types::{Collection, Column, ColumnName, ColumnType};

use crate::dialect::Dialect;

/// Errors from DDL generation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DdlError {
    /// The dialect cannot express a column type change.
    UnsupportedModify { dialect: Dialect },
}

impl fmt::Display for DdlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedModify { dialect } => {
                write!(
                    f,
                    "{dialect} does not support modifying a column in place; drop and re-add the column instead"
                )
            }
        }
    }
}

impl std::error::Error for DdlError {}

/// Full column definition fragment: quoted name, native type, NOT NULL,
/// UNIQUE, DEFAULT.
pub fn column_definition(dialect: Dialect, column: &Column) -> String {
    let mut out = format!(
        "{} {}",
        dialect.quote(column.name.as_str()),
        dialect.sql_type(column.column_type)
    );
    if !column.nullable {
        out.push_str(" NOT NULL");
    }
    if column.unique {
        out.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default_value {
        out.push_str(" DEFAULT ");
        out.push_str(&default_literal(dialect, column.column_type, default));
    }
    out
}

/// `CREATE TABLE` for a collection: `pkid`, `id`, then the user columns in
/// registration order.
pub fn create_table(dialect: Dialect, collection: &Collection) -> String {
    let mut parts = vec![dialect.pkid_definition(), dialect.id_definition()];
    parts.extend(
        collection
            .columns
            .iter()
            .map(|c| column_definition(dialect, c)),
    );
    format!(
        "CREATE TABLE {} ({})",
        dialect.quote(collection.table_name()),
        parts.join(", ")
    )
}

/// `ALTER TABLE ... ADD COLUMN` with the full definition.
pub fn add_column(dialect: Dialect, table: &str, column: &Column) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {}",
        dialect.quote(table),
        column_definition(dialect, column)
    )
}

/// `ALTER TABLE ... DROP COLUMN`. Direct on every dialect (SQLite >= 3.35).
pub fn drop_column(dialect: Dialect, table: &str, column: &ColumnName) -> String {
    format!(
        "ALTER TABLE {} DROP COLUMN {}",
        dialect.quote(table),
        dialect.quote(column.as_str())
    )
}

/// `ALTER TABLE ... RENAME COLUMN old TO new`. Identical shape across
/// dialects.
pub fn rename_column(
    dialect: Dialect,
    table: &str,
    old: &ColumnName,
    new: &ColumnName,
) -> String {
    format!(
        "ALTER TABLE {} RENAME COLUMN {} TO {}",
        dialect.quote(table),
        dialect.quote(old.as_str()),
        dialect.quote(new.as_str())
    )
}

/// Column redefinition.
///
/// Postgres changes the type in place; MySQL redefines the whole column;
/// SQLite has no in-place form and is rejected.
pub fn modify_column(dialect: Dialect, table: &str, column: &Column) -> Result<String, DdlError> {
    match dialect {
        Dialect::Postgres => Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
            dialect.quote(table),
            dialect.quote(column.name.as_str()),
            dialect.sql_type(column.column_type)
        )),
        Dialect::MySql => Ok(format!(
            "ALTER TABLE {} MODIFY COLUMN {}",
            dialect.quote(table),
            column_definition(dialect, column)
        )),
        Dialect::Sqlite => Err(DdlError::UnsupportedModify { dialect }),
    }
}

/// `DROP TABLE`.
pub fn drop_table(dialect: Dialect, table: &str) -> String {
    format!("DROP TABLE {}", dialect.quote(table))
}

/// Renders a stored default value as a SQL literal for its declared type.
fn default_literal(dialect: Dialect, column_type: ColumnType, value: &str) -> String {
    match column_type {
        ColumnType::Integer | ColumnType::Decimal => value.to_string(),
        ColumnType::Boolean => {
            let truthy = matches!(value, "1" | "true");
            match dialect {
                Dialect::Postgres => if truthy { "TRUE" } else { "FALSE" }.to_string(),
                Dialect::MySql | Dialect::Sqlite => if truthy { "1" } else { "0" }.to_string(),
            }
        }
        ColumnType::String | ColumnType::DateTime | ColumnType::Json => {
            format!("'{}'", value.replace('\'', "''"))
        }
    }
}
