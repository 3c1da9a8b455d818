use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::types::{Collection, Column, ColumnName};

// ---------------------------------------------------------------------------
// ChangeSet
// ---------------------------------------------------------------------------

/// One rename operation within a change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameColumn {
    pub old_name: ColumnName,
    pub new_name: ColumnName,
}

/// The four operation lists of a collection update.
///
/// Application order is fixed: rename, then modify, then add, then remove.
/// Renames run first so later operations reference post-rename names;
/// removes run last so constraints drop last.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rename_columns: Vec<RenameColumn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modify_columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_columns: Vec<ColumnName>,
}

impl ChangeSet {
    /// Returns true when all four operation lists are empty.
    pub fn is_empty(&self) -> bool {
        self.rename_columns.is_empty()
            && self.modify_columns.is_empty()
            && self.add_columns.is_empty()
            && self.remove_columns.is_empty()
    }

    /// Total number of operations across the four lists.
    pub fn len(&self) -> usize {
        self.rename_columns.len()
            + self.modify_columns.len()
            + self.add_columns.len()
            + self.remove_columns.len()
    }

    /// Fills type-based null-replacement defaults on nullable added columns,
    /// matching what collection creation does.
    pub fn normalize(&mut self) {
        for column in &mut self.add_columns {
            column.fill_null_replacement();
        }
    }

    /// Applies the change set to a collection, producing the new logical
    /// schema. Pure: the input collection is untouched.
    ///
    /// Operations are checked as they apply, in the fixed order; the first
    /// violation aborts the whole computation.
    pub fn apply(&self, collection: &Collection) -> Result<Collection, ChangeError> {
        if self.is_empty() {
            return Err(ChangeError::Empty);
        }
        tracing::trace!(
            collection = %collection.name,
            operations = self.len(),
            "applying change set"
        );

        let mut columns = collection.columns.clone();

        for rename in &self.rename_columns {
            let position = columns
                .iter()
                .position(|c| c.name == rename.old_name)
                .ok_or_else(|| ChangeError::UnknownColumn {
                    name: rename.old_name.to_string(),
                })?;
            if columns.iter().any(|c| c.name == rename.new_name) {
                return Err(ChangeError::ColumnExists {
                    name: rename.new_name.to_string(),
                });
            }
            columns[position].name = rename.new_name.clone();
        }

        for modify in &self.modify_columns {
            let position = columns
                .iter()
                .position(|c| c.name == modify.name)
                .ok_or_else(|| ChangeError::UnknownColumn {
                    name: modify.name.to_string(),
                })?;
            let existing = &columns[position];
            // Default values are immutable after creation. An unset default
            // on the modify request means "keep the existing one".
            match &modify.default_value {
                Some(new_default) if Some(new_default) != existing.default_value.as_ref() => {
                    return Err(ChangeError::DefaultValueChange {
                        name: modify.name.to_string(),
                    });
                }
                _ => {}
            }
            let mut updated = modify.clone();
            updated.default_value = existing.default_value.clone();
            updated.validate().map_err(ChangeError::Schema)?;
            columns[position] = updated;
        }

        for add in &self.add_columns {
            if columns.iter().any(|c| c.name == add.name) {
                return Err(ChangeError::ColumnExists {
                    name: add.name.to_string(),
                });
            }
            add.validate().map_err(ChangeError::Schema)?;
            columns.push(add.clone());
        }

        for remove in &self.remove_columns {
            let position = columns
                .iter()
                .position(|c| &c.name == remove)
                .ok_or_else(|| ChangeError::UnknownColumn {
                    name: remove.to_string(),
                })?;
            columns.remove(position);
        }

        Collection::new(collection.name.clone(), columns).map_err(ChangeError::Schema)
    }
}

// ---------------------------------------------------------------------------
// ChangeError
// ---------------------------------------------------------------------------

/// Errors from validating or applying a change set.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ChangeError {
    /// All four operation lists were empty.
    Empty,
    /// An operation referenced a column that does not exist.
    UnknownColumn { name: String },
    /// A rename target or added column collides with an existing column.
    ColumnExists { name: String },
    /// A modify operation tried to change an existing default value.
    DefaultValueChange { name: String },
    /// The resulting column or collection violates a schema invariant.
    Schema(SchemaError),
}

impl fmt::Display for ChangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => {
                write!(f, "update must carry at least one rename, modify, add, or remove operation")
            }
            Self::UnknownColumn { name } => {
                write!(f, "column '{name}' does not exist in this collection")
            }
            Self::ColumnExists { name } => {
                write!(f, "column '{name}' already exists in this collection")
            }
            Self::DefaultValueChange { name } => {
                write!(
                    f,
                    "column '{name}': default values cannot change after creation"
                )
            }
            Self::Schema(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ChangeError {}

impl From<SchemaError> for ChangeError {
    fn from(e: SchemaError) -> Self {
        Self::Schema(e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
