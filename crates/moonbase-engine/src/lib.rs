//! The moonbase engine: everything between the HTTP surface and the SQL
//! driver.
//!
//! Holds the collection registry, the schema manager (DDL orchestration
//! with rollback discipline), the data engine (single-record CRUD), the
//! batch executor (atomic and best-effort modes), the row projector, and
//! the administrative services. All storage access goes through the
//! [`driver::SqlDriver`] capability traits; concrete drivers live in their
//! own crates.

pub mod admin;
pub mod batch;
pub mod data;
pub mod driver;
pub mod dyn_driver;
pub mod error;
pub mod projector;
pub mod registry;
pub mod schema_manager;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchExecutor, BatchItemResult, BatchOutcome, BatchStatus, BatchSummary};
pub use data::{DataEngine, Page};
pub use driver::{DriverError, DriverErrorKind, SqlDriver, SqlTransaction};
pub use dyn_driver::{BoxFuture, DynSqlDriver, DynSqlTransaction};
pub use error::EngineError;
pub use registry::CollectionRegistry;
pub use schema_manager::SchemaManager;
