use std::sync::Arc;

use moonbase_core::changeset::ChangeSet;
use moonbase_core::limits::Limits;
use moonbase_core::types::Collection;
use moonbase_sql::ddl;
use tracing::info;

use crate::dyn_driver::DynSqlDriver;
use crate::error::EngineError;
use crate::registry::CollectionRegistry;

/// Orchestrates collection lifecycle: create, update, destroy.
///
/// The only component that mutates the registry or issues DDL. Mutation
/// order is snapshot (reader lock), DDL (lock-free), apply (writer lock),
/// so readers always observe either the old schema or the new one.
pub struct SchemaManager {
    driver: Arc<dyn DynSqlDriver>,
    registry: Arc<CollectionRegistry>,
    limits: Limits,
}

impl SchemaManager {
    pub fn new(
        driver: Arc<dyn DynSqlDriver>,
        registry: Arc<CollectionRegistry>,
        limits: Limits,
    ) -> Self {
        Self {
            driver,
            registry,
            limits,
        }
    }

    /// All registered collections, sorted by name.
    pub async fn list(&self) -> Vec<Collection> {
        self.registry.list().await
    }

    /// One collection's registered schema.
    pub async fn get(&self, name: &str) -> Result<Collection, EngineError> {
        self.registry
            .get(name)
            .await
            .ok_or_else(|| EngineError::CollectionNotFound {
                name: name.to_string(),
            })
    }

    /// Creates a collection: count checks, type-based defaults, CREATE TABLE,
    /// then registry insert. A DDL failure leaves the registry untouched.
    pub async fn create(&self, collection: Collection) -> Result<Collection, EngineError> {
        let name = collection.name.as_str().to_string();
        if self.registry.exists(&name).await {
            return Err(EngineError::CollectionExists { name });
        }
        self.limits
            .check_collection_count(self.registry.count().await)?;
        self.limits.check_column_count(collection.columns.len())?;

        let mut collection = collection;
        for column in &mut collection.columns {
            column.fill_null_replacement();
        }

        let sql = ddl::create_table(self.driver.dialect(), &collection);
        self.driver
            .execute(&sql, &[])
            .await
            .map_err(|e| EngineError::Ddl {
                statement_index: 0,
                message: e.to_string(),
            })?;

        if !self.registry.insert(collection.clone()).await {
            return Err(EngineError::CollectionExists { name });
        }
        info!(collection = %name, columns = collection.columns.len(), "collection created");
        Ok(collection)
    }

    /// Applies a change set: rename, then modify, then add, then remove.
    ///
    /// Every operation is validated against the snapshot before any DDL is
    /// issued; each operation then runs as its own statement. On a failing
    /// statement the registry keeps the snapshot (the new state is never
    /// applied) while the physical store may have absorbed the earlier
    /// statements of this call.
    pub async fn update(
        &self,
        name: &str,
        changeset: ChangeSet,
    ) -> Result<Collection, EngineError> {
        let snapshot = self.get(name).await?;

        let mut changeset = changeset;
        changeset.normalize();
        let updated = changeset.apply(&snapshot)?;
        self.limits.check_column_count(updated.columns.len())?;

        let statements = self.build_statements(&snapshot, &updated, &changeset)?;
        for (index, sql) in statements.iter().enumerate() {
            self.driver
                .execute(sql, &[])
                .await
                .map_err(|e| EngineError::Ddl {
                    statement_index: index,
                    message: e.to_string(),
                })?;
        }

        self.registry.replace(updated.clone()).await;
        info!(
            collection = %name,
            operations = changeset.len(),
            "collection updated"
        );
        Ok(updated)
    }

    /// Drops the table and unregisters the collection.
    pub async fn destroy(&self, name: &str) -> Result<(), EngineError> {
        let collection = self.get(name).await?;
        let sql = ddl::drop_table(self.driver.dialect(), collection.table_name());
        self.driver
            .execute(&sql, &[])
            .await
            .map_err(|e| EngineError::Ddl {
                statement_index: 0,
                message: e.to_string(),
            })?;
        self.registry.remove(name).await;
        info!(collection = %name, "collection destroyed");
        Ok(())
    }

    /// Compiles the ordered DDL statement list for an update. Fails before
    /// any execution when the dialect cannot express an operation.
    fn build_statements(
        &self,
        snapshot: &Collection,
        updated: &Collection,
        changeset: &ChangeSet,
    ) -> Result<Vec<String>, EngineError> {
        let dialect = self.driver.dialect();
        let table = snapshot.table_name();
        let mut statements = Vec::with_capacity(changeset.len());

        for rename in &changeset.rename_columns {
            statements.push(ddl::rename_column(
                dialect,
                table,
                &rename.old_name,
                &rename.new_name,
            ));
        }
        for modify in &changeset.modify_columns {
            // The applied collection holds the final shape, including the
            // preserved default value.
            let column = updated.column(modify.name.as_str()).ok_or_else(|| {
                EngineError::validation(format!(
                    "column '{}' does not exist in this collection",
                    modify.name
                ))
            })?;
            statements.push(ddl::modify_column(dialect, table, column)?);
        }
        for add in &changeset.add_columns {
            statements.push(ddl::add_column(dialect, table, add));
        }
        for remove in &changeset.remove_columns {
            statements.push(ddl::drop_column(dialect, table, remove));
        }
        Ok(statements)
    }
}
