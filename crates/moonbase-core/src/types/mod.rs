//! Core type model: validated identifiers, logical column types, the
//! collection schema, record ids, and the canonical field value model.

mod collection;
mod collection_name;
mod column;
mod column_name;
mod column_type;
mod field_value;
mod record_id;

pub use collection::Collection;
pub use collection_name::CollectionName;
pub use column::Column;
pub use column_name::ColumnName;
pub use column_type::{ColumnType, TypeError};
pub use field_value::{parse_decimal, FieldValue, ValueError};
pub use record_id::{IdFactory, InvalidRecordId, RecordId};
