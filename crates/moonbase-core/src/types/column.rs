use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

use super::column_name::ColumnName;
use super::column_type::ColumnType;
use super::field_value::parse_decimal;

/// A user column: name, logical type, nullability, uniqueness, and an
/// optional default.
///
/// Invariants enforced by [`Column::new`]:
/// - `default_value` is only permitted when `nullable = true`
/// - `default_value` matches the declared type's textual format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: ColumnName,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl Column {
    /// Creates a column, validating the default-value rules.
    pub fn new(
        name: ColumnName,
        column_type: ColumnType,
        nullable: bool,
        unique: bool,
        default_value: Option<String>,
    ) -> Result<Self, SchemaError> {
        let column = Self {
            name,
            column_type,
            nullable,
            unique,
            default_value,
        };
        column.validate()?;
        Ok(column)
    }

    /// Re-checks the default-value invariants. Needed after deserializing,
    /// since serde cannot see across fields.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if let Some(default) = &self.default_value {
            if !self.nullable {
                return Err(SchemaError::DefaultOnNotNull {
                    column: self.name.to_string(),
                });
            }
            validate_default_format(&self.name, self.column_type, default)?;
        }
        Ok(())
    }

    /// Fills the type-based null-replacement default on a nullable column
    /// that has none. No-op for NOT NULL columns and for datetime (whose
    /// canonical default is SQL NULL).
    pub fn fill_null_replacement(&mut self) {
        if self.nullable && self.default_value.is_none() {
            self.default_value = self.column_type.null_replacement().map(String::from);
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.column_type)?;
        if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        if self.unique {
            write!(f, " UNIQUE")?;
        }
        if let Some(default) = &self.default_value {
            write!(f, " DEFAULT '{default}'")?;
        }
        Ok(())
    }
}

fn validate_default_format(
    name: &ColumnName,
    column_type: ColumnType,
    value: &str,
) -> Result<(), SchemaError> {
    let invalid = |reason: &str| SchemaError::InvalidDefault {
        column: name.to_string(),
        column_type: column_type.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };
    match column_type {
        ColumnType::String => Ok(()),
        ColumnType::Integer => value
            .parse::<i64>()
            .map(|_| ())
            .map_err(|_| invalid("not an integer")),
        ColumnType::Decimal => parse_decimal(value)
            .map(|_| ())
            .map_err(|_| invalid("not a decimal")),
        ColumnType::Boolean => match value {
            "0" | "1" | "true" | "false" => Ok(()),
            _ => Err(invalid("expected 0, 1, true, or false")),
        },
        ColumnType::DateTime => chrono::DateTime::parse_from_rfc3339(value)
            .map(|_| ())
            .map_err(|_| invalid("not an RFC 3339 datetime")),
        ColumnType::Json => serde_json::from_str::<serde_json::Value>(value)
            .map(|_| ())
            .map_err(|_| invalid("not valid JSON")),
    }
}
