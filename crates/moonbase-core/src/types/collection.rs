use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

use super::column::Column;
use super::column_name::ColumnName;
use super::column_type::ColumnType;
use super::collection_name::CollectionName;

/// A registered collection: a validated name plus the ordered user columns.
///
/// The implicit system columns (`pkid`, `id`) are never part of `columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub name: CollectionName,
    pub columns: Vec<Column>,
}

impl Collection {
    /// Creates a collection, validating that at least one column is present,
    /// that column names are unique, and that each column's own invariants
    /// hold.
    pub fn new(name: CollectionName, columns: Vec<Column>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::NoColumns);
        }
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            column.validate()?;
            if !seen.insert(column.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    name: column.name.to_string(),
                });
            }
        }
        Ok(Self { name, columns })
    }

    /// Looks up a user column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.as_str() == name)
    }

    /// Returns true if the collection declares a user column with this name.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// The physical table name. Identical to the collection name; system
    /// tables use the reserved `moon_` prefix, which collection names cannot.
    pub fn table_name(&self) -> &str {
        self.name.as_str()
    }

    /// Names of all columns with the `string` logical type, in declaration
    /// order. The search term is matched against exactly these.
    pub fn string_columns(&self) -> Vec<&ColumnName> {
        self.columns
            .iter()
            .filter(|c| c.column_type == ColumnType::String)
            .map(|c| &c.name)
            .collect()
    }

    /// Names of all user columns in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "collection {} {{", self.name)?;
        for column in &self.columns {
            writeln!(f, "  {column}")?;
        }
        write!(f, "}}")
    }
}
