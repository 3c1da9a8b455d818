//! Batch execution over arrays of items: atomic (one transaction,
//! all-or-nothing) or best-effort (per-item outcome, 207 response).

use std::sync::Arc;

use moonbase_core::limits::Limits;
use moonbase_core::types::{Collection, ColumnName, FieldValue, IdFactory, RecordId};
use moonbase_sql::query;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::data::{validate_record_body, BodyMode};
use crate::dyn_driver::DynSqlDriver;
use crate::error::EngineError;
use crate::registry::CollectionRegistry;

/// Symbolic error codes for best-effort item failures.
pub const ERROR_DUPLICATE: &str = "duplicate";
pub const ERROR_VALIDATION: &str = "validation_error";
pub const ERROR_NOT_FOUND: &str = "not_found";
pub const ERROR_DATABASE: &str = "database_error";

// ---------------------------------------------------------------------------
// Result shapes
// ---------------------------------------------------------------------------

/// Outcome discriminator for one batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Created,
    Updated,
    Deleted,
    Failed,
    NotFound,
}

impl BatchStatus {
    fn succeeded(&self) -> bool {
        matches!(self, Self::Created | Self::Updated | Self::Deleted)
    }
}

/// One per-item result in a best-effort batch response. Fields irrelevant
/// to a given status are omitted from the JSON encoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItemResult {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub status: BatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl BatchItemResult {
    fn success(index: usize, id: String, status: BatchStatus, data: Option<Map<String, Value>>) -> Self {
        Self {
            index,
            id: Some(id),
            status,
            data,
            error_code: None,
            error_message: None,
        }
    }

    fn failure(index: usize, status: BatchStatus, code: &str, message: impl Into<String>) -> Self {
        Self {
            index,
            id: None,
            status,
            data: None,
            error_code: Some(code.to_string()),
            error_message: Some(message.into()),
        }
    }
}

/// Aggregate counters over a best-effort batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// The full best-effort response payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub results: Vec<BatchItemResult>,
    pub summary: BatchSummary,
}

impl BatchOutcome {
    fn from_results(results: Vec<BatchItemResult>) -> Self {
        let total = results.len();
        let succeeded = results.iter().filter(|r| r.status.succeeded()).count();
        Self {
            summary: BatchSummary {
                total,
                succeeded,
                failed: total - succeeded,
            },
            results,
        }
    }
}

// ---------------------------------------------------------------------------
// BatchExecutor
// ---------------------------------------------------------------------------

/// Runs create/update/destroy over arrays of items.
pub struct BatchExecutor {
    driver: Arc<dyn DynSqlDriver>,
    registry: Arc<CollectionRegistry>,
    ids: Arc<IdFactory>,
    limits: Limits,
}

impl BatchExecutor {
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

    // -- atomic mode --------------------------------------------------------

    /// Inserts every item inside one transaction. Any failure rolls the
    /// whole batch back and surfaces a single error.
    pub async fn create_atomic(
        &self,
        name: &str,
        items: &[Value],
    ) -> Result<Vec<Map<String, Value>>, EngineError> {
        let collection = self.collection(name).await?;
        self.limits.check_batch_size(items.len())?;

        let mut prepared = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            prepared.push(prepare_create(&collection, index, item)?);
        }

        let mut tx = self.driver.begin().await?;
        let mut created = Vec::with_capacity(prepared.len());
        for (index, values) in prepared.iter().enumerate() {
            let id = self.ids.next_id();
            let stmt = query::insert(self.driver.dialect(), &collection, &id, values);
            if let Err(e) = tx.execute(&stmt.sql, &stmt.params).await {
                let _ = tx.rollback().await;
                return Err(item_error(index, e));
            }
            created.push(echo_record(&id, values));
        }
        tx.commit().await?;
        debug!(collection = %name, items = created.len(), "atomic batch create committed");
        Ok(created)
    }

    /// Updates every item inside one transaction; a missing target rolls
    /// the batch back.
    pub async fn update_atomic(
        &self,
        name: &str,
        items: &[Value],
    ) -> Result<Vec<Map<String, Value>>, EngineError> {
        let collection = self.collection(name).await?;
        self.limits.check_batch_size(items.len())?;

        let mut prepared = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            prepared.push(prepare_update(&collection, index, item)?);
        }

        let mut tx = self.driver.begin().await?;
        let mut updated = Vec::with_capacity(prepared.len());
        for (index, (id, values)) in prepared.iter().enumerate() {
            let stmt = query::update_by_id(self.driver.dialect(), &collection, id, values);
            match tx.execute(&stmt.sql, &stmt.params).await {
                Ok(0) => {
                    let _ = tx.rollback().await;
                    return Err(EngineError::RecordNotFound {
                        collection: name.to_string(),
                        id: id.as_str().to_string(),
                    });
                }
                Ok(_) => updated.push(echo_record(id, values)),
                Err(e) => {
                    let _ = tx.rollback().await;
                    return Err(item_error(index, e));
                }
            }
        }
        tx.commit().await?;
        Ok(updated)
    }

    /// Deletes every id inside one transaction; a missing target rolls the
    /// batch back.
    pub async fn destroy_atomic(&self, name: &str, items: &[Value]) -> Result<usize, EngineError> {
        let collection = self.collection(name).await?;
        self.limits.check_batch_size(items.len())?;

        let mut ids = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            ids.push(prepare_destroy(index, item)?);
        }

        let mut tx = self.driver.begin().await?;
        for (index, id) in ids.iter().enumerate() {
            let stmt = query::delete_by_id(self.driver.dialect(), &collection, id);
            match tx.execute(&stmt.sql, &stmt.params).await {
                Ok(0) => {
                    let _ = tx.rollback().await;
                    return Err(EngineError::RecordNotFound {
                        collection: name.to_string(),
                        id: id.as_str().to_string(),
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    let _ = tx.rollback().await;
                    return Err(item_error(index, e));
                }
            }
        }
        tx.commit().await?;
        Ok(ids.len())
    }

    // -- best-effort mode ---------------------------------------------------

    /// Inserts each item independently; every item gets a result.
    pub async fn create_best_effort(
        &self,
        name: &str,
        items: &[Value],
    ) -> Result<BatchOutcome, EngineError> {
        let collection = self.collection(name).await?;
        self.limits.check_batch_size(items.len())?;

        let mut results = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            results.push(self.create_one(&collection, index, item).await);
        }
        Ok(BatchOutcome::from_results(results))
    }

    /// Updates each item independently.
    pub async fn update_best_effort(
        &self,
        name: &str,
        items: &[Value],
    ) -> Result<BatchOutcome, EngineError> {
        let collection = self.collection(name).await?;
        self.limits.check_batch_size(items.len())?;

        let mut results = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            results.push(self.update_one(&collection, index, item).await);
        }
        Ok(BatchOutcome::from_results(results))
    }

    /// Deletes each id independently.
    pub async fn destroy_best_effort(
        &self,
        name: &str,
        items: &[Value],
    ) -> Result<BatchOutcome, EngineError> {
        let collection = self.collection(name).await?;
        self.limits.check_batch_size(items.len())?;

        let mut results = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            results.push(self.destroy_one(&collection, index, item).await);
        }
        Ok(BatchOutcome::from_results(results))
    }

    async fn create_one(
        &self,
        collection: &Collection,
        index: usize,
        item: &Value,
    ) -> BatchItemResult {
        let values = match prepare_create(collection, index, item) {
            Ok(values) => values,
            Err(e) => {
                return BatchItemResult::failure(
                    index,
                    BatchStatus::Failed,
                    ERROR_VALIDATION,
                    e.to_string(),
                )
            }
        };
        let id = self.ids.next_id();
        let stmt = query::insert(self.driver.dialect(), collection, &id, &values);
        match self.driver.execute(&stmt.sql, &stmt.params).await {
            Ok(_) => BatchItemResult::success(
                index,
                id.as_str().to_string(),
                BatchStatus::Created,
                Some(echo_record(&id, &values)),
            ),
            Err(e) if e.is_unique_violation() => {
                BatchItemResult::failure(index, BatchStatus::Failed, ERROR_DUPLICATE, e.to_string())
            }
            Err(e) => {
                BatchItemResult::failure(index, BatchStatus::Failed, ERROR_DATABASE, e.to_string())
            }
        }
    }

    async fn update_one(
        &self,
        collection: &Collection,
        index: usize,
        item: &Value,
    ) -> BatchItemResult {
        let (id, values) = match prepare_update(collection, index, item) {
            Ok(prepared) => prepared,
            Err(e) => {
                return BatchItemResult::failure(
                    index,
                    BatchStatus::Failed,
                    ERROR_VALIDATION,
                    e.to_string(),
                )
            }
        };
        let stmt = query::update_by_id(self.driver.dialect(), collection, &id, &values);
        match self.driver.execute(&stmt.sql, &stmt.params).await {
            Ok(0) => {
                let mut result = BatchItemResult::failure(
                    index,
                    BatchStatus::NotFound,
                    ERROR_NOT_FOUND,
                    format!("record '{}' not found", id),
                );
                result.id = Some(id.as_str().to_string());
                result
            }
            Ok(_) => BatchItemResult::success(
                index,
                id.as_str().to_string(),
                BatchStatus::Updated,
                Some(echo_record(&id, &values)),
            ),
            Err(e) if e.is_unique_violation() => {
                BatchItemResult::failure(index, BatchStatus::Failed, ERROR_DUPLICATE, e.to_string())
            }
            Err(e) => {
                BatchItemResult::failure(index, BatchStatus::Failed, ERROR_DATABASE, e.to_string())
            }
        }
    }

    async fn destroy_one(
        &self,
        collection: &Collection,
        index: usize,
        item: &Value,
    ) -> BatchItemResult {
        let id = match prepare_destroy(index, item) {
            Ok(id) => id,
            Err(e) => {
                return BatchItemResult::failure(
                    index,
                    BatchStatus::Failed,
                    ERROR_VALIDATION,
                    e.to_string(),
                )
            }
        };
        let stmt = query::delete_by_id(self.driver.dialect(), collection, &id);
        match self.driver.execute(&stmt.sql, &stmt.params).await {
            Ok(0) => {
                let mut result = BatchItemResult::failure(
                    index,
                    BatchStatus::NotFound,
                    ERROR_NOT_FOUND,
                    format!("record '{}' not found", id),
                );
                result.id = Some(id.as_str().to_string());
                result
            }
            Ok(_) => {
                BatchItemResult::success(index, id.as_str().to_string(), BatchStatus::Deleted, None)
            }
            Err(e) => {
                BatchItemResult::failure(index, BatchStatus::Failed, ERROR_DATABASE, e.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Item preparation
// ---------------------------------------------------------------------------

fn prepare_create(
    collection: &Collection,
    index: usize,
    item: &Value,
) -> Result<Vec<(ColumnName, FieldValue)>, EngineError> {
    let body = item
        .as_object()
        .ok_or_else(|| EngineError::validation(format!("item {index} must be an object")))?;
    validate_record_body(collection, body, BodyMode::Create)
        .map_err(|e| EngineError::validation(format!("item {index}: {e}")))
}

/// Splits an update item into id and field map. Accepts both the canonical
/// `{id, data}` envelope and the flat `{id, ...fields}` legacy shape.
fn prepare_update(
    collection: &Collection,
    index: usize,
    item: &Value,
) -> Result<(RecordId, Vec<(ColumnName, FieldValue)>), EngineError> {
    let object = item
        .as_object()
        .ok_or_else(|| EngineError::validation(format!("item {index} must be an object")))?;
    let id_str = object
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| EngineError::validation(format!("item {index} is missing 'id'")))?;
    let id = RecordId::parse(id_str)
        .map_err(|e| EngineError::validation(format!("item {index}: {e}")))?;

    let mut body = match object.get("data") {
        Some(Value::Object(data)) => data.clone(),
        Some(_) => {
            return Err(EngineError::validation(format!(
                "item {index}: 'data' must be an object"
            )))
        }
        None => {
            let mut flat = object.clone();
            flat.remove("id");
            flat
        }
    };
    body.remove("id");

    let values = validate_record_body(collection, &body, BodyMode::Update)
        .map_err(|e| EngineError::validation(format!("item {index}: {e}")))?;
    if values.is_empty() {
        return Err(EngineError::validation(format!(
            "item {index} carries no updatable fields"
        )));
    }
    Ok((id, values))
}

fn prepare_destroy(index: usize, item: &Value) -> Result<RecordId, EngineError> {
    let id_str = item
        .as_str()
        .ok_or_else(|| EngineError::validation(format!("item {index} must be an id string")))?;
    RecordId::parse(id_str).map_err(|e| EngineError::validation(format!("item {index}: {e}")))
}

fn echo_record(id: &RecordId, values: &[(ColumnName, FieldValue)]) -> Map<String, Value> {
    let mut record = Map::with_capacity(values.len() + 1);
    record.insert("id".to_string(), Value::String(id.as_str().to_string()));
    for (name, value) in values {
        record.insert(name.as_str().to_string(), value.to_json());
    }
    record
}

fn item_error(index: usize, error: crate::driver::DriverError) -> EngineError {
    if error.is_unique_violation() {
        EngineError::Conflict {
            message: format!("item {index}: {error}"),
        }
    } else {
        EngineError::Driver(crate::driver::DriverError {
            kind: error.kind,
            message: format!("item {index}: {}", error.message),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverError;
    use crate::testing::ScriptedDriver;
    use moonbase_core::types::{CollectionName, Column, ColumnType};
    use moonbase_sql::Dialect;
    use serde_json::json;

    fn collection() -> Collection {
        let col = |name: &str, ty: ColumnType, nullable: bool| {
            Column::new(ColumnName::new(name).unwrap(), ty, nullable, false, None).unwrap()
        };
        Collection::new(
            CollectionName::new("products").unwrap(),
            vec![
                col("title", ColumnType::String, false),
                col("price", ColumnType::Integer, true),
            ],
        )
        .unwrap()
    }

    async fn setup() -> (Arc<ScriptedDriver>, BatchExecutor) {
        let driver = Arc::new(ScriptedDriver::new(Dialect::Sqlite));
        let registry = Arc::new(CollectionRegistry::new());
        registry.insert(collection()).await;
        let executor = BatchExecutor::new(
            driver.clone() as Arc<dyn DynSqlDriver>,
            registry,
            Arc::new(IdFactory::new()),
            Limits::default(),
        );
        (driver, executor)
    }

    fn make_id() -> String {
        IdFactory::new().next_id().as_str().to_string()
    }

    #[tokio::test]
    async fn atomic_create_commits_every_item() {
        let (driver, executor) = setup().await;
        let items = vec![
            json!({"title": "A", "price": 1}),
            json!({"title": "B", "price": 2}),
        ];
        let created = executor.create_atomic("products", &items).await.unwrap();
        assert_eq!(created.len(), 2);
        let log = driver.statements();
        assert_eq!(log[0], "BEGIN");
        assert!(log[1].starts_with("INSERT INTO"));
        assert!(log[2].starts_with("INSERT INTO"));
        assert_eq!(log[3], "COMMIT");
    }

    #[tokio::test]
    async fn atomic_create_invalid_item_fails_before_transaction() {
        let (driver, executor) = setup().await;
        let items = vec![
            json!({"title": "A", "price": 1}),
            json!({"title": "B", "price": "nope"}),
        ];
        let err = executor.create_atomic("products", &items).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
        assert!(err.to_string().contains("item 1"));
        // Pre-validation failed: the store never saw a BEGIN.
        assert!(driver.statements().is_empty());
    }

    #[tokio::test]
    async fn atomic_create_mid_batch_driver_failure_rolls_back() {
        let (driver, executor) = setup().await;
        driver.fail_execute_after(1, DriverError::io("disk full"));
        let items = vec![json!({"title": "A"}), json!({"title": "B"})];
        let err = executor.create_atomic("products", &items).await.unwrap_err();
        assert!(matches!(err, EngineError::Driver(_)));
        let log = driver.statements();
        assert_eq!(log.last().unwrap(), "ROLLBACK");
        assert!(!log.contains(&"COMMIT".to_string()));
    }

    #[tokio::test]
    async fn atomic_update_missing_record_rolls_back() {
        let (driver, executor) = setup().await;
        driver.push_exec(Ok(1));
        driver.push_exec(Ok(0));
        let items = vec![
            json!({"id": make_id(), "data": {"price": 1}}),
            json!({"id": make_id(), "data": {"price": 2}}),
        ];
        let err = executor.update_atomic("products", &items).await.unwrap_err();
        assert!(matches!(err, EngineError::RecordNotFound { .. }));
        assert_eq!(driver.statements().last().unwrap(), "ROLLBACK");
    }

    #[tokio::test]
    async fn atomic_destroy_deletes_all_or_nothing() {
        let (driver, executor) = setup().await;
        let items = vec![json!(make_id()), json!(make_id())];
        let deleted = executor.destroy_atomic("products", &items).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(driver.statements().last().unwrap(), "COMMIT");
    }

    #[tokio::test]
    async fn best_effort_reports_each_item() {
        let (_driver, executor) = setup().await;
        let items = vec![
            json!({"title": "A", "price": 1}),
            json!({"title": "B", "price": "nope"}),
        ];
        let outcome = executor
            .create_best_effort("products", &items)
            .await
            .unwrap();
        assert_eq!(outcome.summary.total, 2);
        assert_eq!(outcome.summary.succeeded, 1);
        assert_eq!(outcome.summary.failed, 1);
        assert_eq!(outcome.results[0].status, BatchStatus::Created);
        assert!(outcome.results[0].id.is_some());
        assert_eq!(outcome.results[1].status, BatchStatus::Failed);
        assert_eq!(
            outcome.results[1].error_code.as_deref(),
            Some(ERROR_VALIDATION)
        );
        assert_eq!(outcome.results[1].index, 1);
    }

    #[tokio::test]
    async fn best_effort_duplicate_maps_to_duplicate_code() {
        let (driver, executor) = setup().await;
        driver.push_exec(Err(DriverError::unique_violation("title")));
        let items = vec![json!({"title": "A"})];
        let outcome = executor
            .create_best_effort("products", &items)
            .await
            .unwrap();
        assert_eq!(
            outcome.results[0].error_code.as_deref(),
            Some(ERROR_DUPLICATE)
        );
    }

    #[tokio::test]
    async fn best_effort_update_not_found_status() {
        let (driver, executor) = setup().await;
        driver.push_exec(Ok(0));
        let items = vec![json!({"id": make_id(), "price": 9})];
        let outcome = executor
            .update_best_effort("products", &items)
            .await
            .unwrap();
        assert_eq!(outcome.results[0].status, BatchStatus::NotFound);
        assert_eq!(
            outcome.results[0].error_code.as_deref(),
            Some(ERROR_NOT_FOUND)
        );
        assert_eq!(outcome.summary.failed, 1);
    }

    #[tokio::test]
    async fn best_effort_update_accepts_flat_and_enveloped_shapes() {
        let (_driver, executor) = setup().await;
        let items = vec![
            json!({"id": make_id(), "price": 9}),
            json!({"id": make_id(), "data": {"price": 10}}),
        ];
        let outcome = executor
            .update_best_effort("products", &items)
            .await
            .unwrap();
        assert_eq!(outcome.summary.succeeded, 2);
    }

    #[tokio::test]
    async fn best_effort_destroy_requires_string_items() {
        let (_driver, executor) = setup().await;
        let items = vec![json!(42), json!(make_id())];
        let outcome = executor
            .destroy_best_effort("products", &items)
            .await
            .unwrap();
        assert_eq!(outcome.results[0].status, BatchStatus::Failed);
        assert_eq!(outcome.results[1].status, BatchStatus::Deleted);
    }

    #[tokio::test]
    async fn batch_size_limit_enforced() {
        let driver = Arc::new(ScriptedDriver::new(Dialect::Sqlite));
        let registry = Arc::new(CollectionRegistry::new());
        registry.insert(collection()).await;
        let executor = BatchExecutor::new(
            driver as Arc<dyn DynSqlDriver>,
            registry,
            Arc::new(IdFactory::new()),
            Limits {
                max_batch_size: 1,
                ..Limits::default()
            },
        );
        let items = vec![json!({"title": "A"}), json!({"title": "B"})];
        let err = executor.create_best_effort("products", &items).await.unwrap_err();
        assert!(matches!(err, EngineError::Limit(_)));
    }

    #[tokio::test]
    async fn results_keep_request_order() {
        let (driver, executor) = setup().await;
        driver.push_exec(Ok(1));
        driver.push_exec(Err(DriverError::io("blip")));
        driver.push_exec(Ok(1));
        let items = vec![
            json!({"title": "A"}),
            json!({"title": "B"}),
            json!({"title": "C"}),
        ];
        let outcome = executor
            .create_best_effort("products", &items)
            .await
            .unwrap();
        let indices: Vec<usize> = outcome.results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(
            outcome.results[1].error_code.as_deref(),
            Some(ERROR_DATABASE)
        );
    }

    #[test]
    fn serialization_omits_absent_fields() {
        let result = BatchItemResult::failure(0, BatchStatus::Failed, ERROR_VALIDATION, "bad");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failed");
        assert!(json.get("id").is_none());
        assert!(json.get("data").is_none());
        let result = BatchItemResult::success(1, "x".into(), BatchStatus::Deleted, None);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "deleted");
        assert!(json.get("error_code").is_none());
    }
}
