use std::sync::Arc;

use moonbase_core::limits::Limits;
use moonbase_core::types::IdFactory;
use moonbase_engine::admin::{ApiKeyService, Argon2Hashing, TokenService, UserService};
use moonbase_engine::dyn_driver::DynSqlDriver;
use moonbase_engine::{BatchExecutor, CollectionRegistry, DataEngine, SchemaManager};
use moonbase_sql::Dialect;

/// Everything the handlers need, built once at startup.
///
/// All configuration flows through here; there is no other process-wide
/// state besides the registry inside.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CollectionRegistry>,
    pub manager: Arc<SchemaManager>,
    pub data: Arc<DataEngine>,
    pub batch: Arc<BatchExecutor>,
    pub users: Arc<UserService>,
    pub apikeys: Arc<ApiKeyService>,
    pub tokens: Arc<dyn TokenService>,
    pub limits: Limits,
    pub dialect: Dialect,
}

impl AppState {
    pub fn new(
        driver: Arc<dyn DynSqlDriver>,
        tokens: Arc<dyn TokenService>,
        limits: Limits,
    ) -> Self {
        let registry = Arc::new(CollectionRegistry::new());
        let ids = Arc::new(IdFactory::new());
        let dialect = driver.dialect();
        Self {
            manager: Arc::new(SchemaManager::new(
                driver.clone(),
                registry.clone(),
                limits.clone(),
            )),
            data: Arc::new(DataEngine::new(
                driver.clone(),
                registry.clone(),
                ids.clone(),
                limits.clone(),
            )),
            batch: Arc::new(BatchExecutor::new(
                driver.clone(),
                registry.clone(),
                ids.clone(),
                limits.clone(),
            )),
            users: Arc::new(UserService::new(
                driver.clone(),
                ids.clone(),
                Arc::new(Argon2Hashing),
            )),
            apikeys: Arc::new(ApiKeyService::new(driver, ids)),
            registry,
            tokens,
            limits,
            dialect,
        }
    }
}
