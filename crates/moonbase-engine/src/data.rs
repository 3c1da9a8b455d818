use std::collections::HashMap;
use std::sync::Arc;

use moonbase_core::limits::Limits;
use moonbase_core::types::{Collection, ColumnName, FieldValue, IdFactory, RecordId};
use moonbase_sql::query::{self, ListQuery};
use moonbase_sql::rest;
use serde_json::{Map, Value};
use tracing::debug;

use crate::dyn_driver::DynSqlDriver;
use crate::error::EngineError;
use crate::projector::{project_record, project_rows, row_id, scalar_count};
use crate::registry::CollectionRegistry;

/// One page of a list response.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub data: Vec<Map<String, Value>>,
    pub total: u64,
    pub next_cursor: Option<String>,
    pub limit: u32,
}

/// Whether a body is creating a record or patching one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    Create,
    Update,
}

/// Single-record CRUD over a collection.
pub struct DataEngine {
    driver: Arc<dyn DynSqlDriver>,
    registry: Arc<CollectionRegistry>,
    ids: Arc<IdFactory>,
    limits: Limits,
}

impl DataEngine {
    pub fn new(
        driver: Arc<dyn DynSqlDriver>,
        registry: Arc<CollectionRegistry>,
        ids: Arc<IdFactory>,
        limits: Limits,
    ) -> Self {
        Self {
            driver,
            registry,
            ids,
            limits,
        }
    }

    async fn collection(&self, name: &str) -> Result<Collection, EngineError> {
        self.registry
            .get(name)
            .await
            .ok_or_else(|| EngineError::CollectionNotFound {
                name: name.to_string(),
            })
    }

    /// Compiles and runs the page and count queries for a list request.
    pub async fn list(
        &self,
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<Page, EngineError> {
        let collection = self.collection(name).await?;
        let query = rest::parse_list_params(params, &collection, &self.limits)?;
        self.run_list(&collection, &query).await
    }

    async fn run_list(
        &self,
        collection: &Collection,
        query: &ListQuery,
    ) -> Result<Page, EngineError> {
        let dialect = self.driver.dialect();
        let page_stmt = query::select_page(dialect, collection, query);
        let count_stmt = query::count_query(dialect, collection, query);

        let mut rows = self
            .driver
            .fetch_all(&page_stmt.sql, &page_stmt.params)
            .await?;
        let total = match self
            .driver
            .fetch_optional(&count_stmt.sql, &count_stmt.params)
            .await?
        {
            Some(row) => scalar_count(&row),
            None => 0,
        };

        // One extra row was fetched to learn whether a next page exists.
        let limit = query.limit as usize;
        let next_cursor = if rows.len() > limit {
            rows.truncate(limit);
            rows.last().and_then(row_id)
        } else {
            None
        };

        debug!(
            collection = %collection.name,
            returned = rows.len(),
            total,
            "list executed"
        );
        Ok(Page {
            data: project_rows(collection, &rows),
            total,
            next_cursor,
            limit: query.limit,
        })
    }

    /// Fetches one record by id.
    pub async fn get(&self, name: &str, id: &str) -> Result<Map<String, Value>, EngineError> {
        let collection = self.collection(name).await?;
        let record_id = parse_id(id)?;
        let stmt = query::select_by_id(self.driver.dialect(), &collection, &record_id);
        match self.driver.fetch_optional(&stmt.sql, &stmt.params).await? {
            Some(row) => Ok(project_record(&collection, &row)),
            None => Err(EngineError::RecordNotFound {
                collection: name.to_string(),
                id: id.to_string(),
            }),
        }
    }

    /// Validates the body, generates a fresh id, inserts, and returns the
    /// stored record.
    pub async fn create(
        &self,
        name: &str,
        body: &Map<String, Value>,
    ) -> Result<Map<String, Value>, EngineError> {
        let collection = self.collection(name).await?;
        let values = validate_record_body(&collection, body, BodyMode::Create)?;
        let id = self.ids.next_id();
        let stmt = query::insert(self.driver.dialect(), &collection, &id, &values);
        self.driver.execute(&stmt.sql, &stmt.params).await?;
        self.fetch_after_write(&collection, &id, &values).await
    }

    /// Updates the provided fields of one record. 404 when no row matched.
    pub async fn update(
        &self,
        name: &str,
        id: &str,
        body: &Map<String, Value>,
    ) -> Result<Map<String, Value>, EngineError> {
        let collection = self.collection(name).await?;
        let record_id = parse_id(id)?;
        let values = validate_record_body(&collection, body, BodyMode::Update)?;
        if values.is_empty() {
            return Err(EngineError::validation(
                "update body carries no recognized fields",
            ));
        }
        let stmt = query::update_by_id(self.driver.dialect(), &collection, &record_id, &values);
        let affected = self.driver.execute(&stmt.sql, &stmt.params).await?;
        if affected == 0 {
            return Err(EngineError::RecordNotFound {
                collection: name.to_string(),
                id: id.to_string(),
            });
        }
        self.fetch_after_write(&collection, &record_id, &values).await
    }

    /// Deletes one record. 404 when no row matched.
    pub async fn destroy(&self, name: &str, id: &str) -> Result<(), EngineError> {
        let collection = self.collection(name).await?;
        let record_id = parse_id(id)?;
        let stmt = query::delete_by_id(self.driver.dialect(), &collection, &record_id);
        let affected = self.driver.execute(&stmt.sql, &stmt.params).await?;
        if affected == 0 {
            return Err(EngineError::RecordNotFound {
                collection: name.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Re-reads a record after a write so store-applied defaults are
    /// reflected; falls back to echoing the written values if the re-read
    /// comes back empty.
    async fn fetch_after_write(
        &self,
        collection: &Collection,
        id: &RecordId,
        values: &[(ColumnName, FieldValue)],
    ) -> Result<Map<String, Value>, EngineError> {
        let stmt = query::select_by_id(self.driver.dialect(), collection, id);
        if let Some(row) = self.driver.fetch_optional(&stmt.sql, &stmt.params).await? {
            return Ok(project_record(collection, &row));
        }
        let mut record = Map::new();
        record.insert("id".to_string(), Value::String(id.as_str().to_string()));
        for (name, value) in values {
            record.insert(name.as_str().to_string(), value.to_json());
        }
        Ok(record)
    }
}

/// Parses an external record id, mapping malformed input to a validation
/// failure rather than a 404.
pub fn parse_id(id: &str) -> Result<RecordId, EngineError> {
    RecordId::parse(id).map_err(|e| EngineError::validation(e.to_string()))
}

/// Validates a record body against the schema.
///
/// Unknown fields are rejected; values are coerced by declared column type;
/// on create, a missing value for a NOT NULL column is rejected (NOT NULL
/// columns cannot carry defaults, so there is nothing to fall back to).
pub fn validate_record_body(
    collection: &Collection,
    body: &Map<String, Value>,
    mode: BodyMode,
) -> Result<Vec<(ColumnName, FieldValue)>, EngineError> {
    for key in body.keys() {
        if !collection.has_column(key) {
            return Err(EngineError::validation(format!(
                "unknown field '{key}' for collection '{}'",
                collection.name
            )));
        }
    }

    let mut values = Vec::new();
    for column in &collection.columns {
        match body.get(column.name.as_str()) {
            Some(raw) => {
                let value = FieldValue::from_json(raw, column.column_type).map_err(|e| {
                    EngineError::validation(format!("field '{}': {e}", column.name))
                })?;
                if value.is_null() && !column.nullable {
                    return Err(EngineError::validation(format!(
                        "field '{}' is NOT NULL and cannot be set to null",
                        column.name
                    )));
                }
                values.push((column.name.clone(), value));
            }
            None => {
                if mode == BodyMode::Create && !column.nullable {
                    return Err(EngineError::validation(format!(
                        "missing required field '{}'",
                        column.name
                    )));
                }
            }
        }
    }
    Ok(values)
}
