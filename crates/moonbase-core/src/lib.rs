//! Core model for the moonbase dynamic-collection backend.
//!
//! This crate is I/O free: it defines the logical type system, validated
//! identifiers, the collection schema model, change sets for schema updates,
//! record ids, field values, and the resource-limit policy. SQL generation
//! lives in `moonbase-sql`; execution lives in `moonbase-engine` and its
//! drivers.

pub mod changeset;
pub mod error;
pub mod limits;
pub mod reserved;
pub mod types;

pub use changeset::{ChangeError, ChangeSet, RenameColumn};
pub use error::{LimitError, NameError, NameKind, SchemaError};
pub use limits::{Limits, DEFAULT_PAGE_SIZE, MAX_PAGINATION_LIMIT, MIN_PAGE_SIZE};
pub use types::{
    Collection, CollectionName, Column, ColumnName, ColumnType, FieldValue, IdFactory,
    InvalidRecordId, RecordId, TypeError, ValueError,
};
