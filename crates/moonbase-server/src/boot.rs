//! Startup wiring: connect, reflect, seed, bootstrap the first admin,
//! listen.

use std::sync::Arc;

use moonbase_engine::admin::{AdminError, NewUser, Role};
use moonbase_engine::dyn_driver::DynSqlDriver;
use moonbase_engine::DriverError;
use moonbase_sqlx::reflect::reflect_collections;
use moonbase_sqlx::SqlxDriver;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::JwtTokenService;
use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("database: {0}")]
    Driver(#[from] DriverError),
    #[error("admin bootstrap: {0}")]
    Admin(#[from] AdminError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Builds the full application state against a live database: system
/// tables, registry seed, bootstrap admin.
pub async fn build_state(config: &ServerConfig) -> Result<AppState, BootError> {
    let driver: Arc<dyn DynSqlDriver> =
        Arc::new(SqlxDriver::connect(&config.database_url).await?);
    let tokens = Arc::new(JwtTokenService::new(config.jwt_secret.as_bytes()));
    let state = AppState::new(driver.clone(), tokens, config.limits());

    state.users.ensure_table().await?;
    state.apikeys.ensure_table().await?;

    let collections = reflect_collections(driver.as_ref()).await?;
    info!(collections = collections.len(), dialect = %state.dialect, "registry seeded from store");
    state.registry.seed(collections).await;

    bootstrap_admin(&state, config).await?;
    Ok(state)
}

/// Runs the server until the listener fails.
pub async fn serve(config: ServerConfig) -> Result<(), BootError> {
    let state = build_state(&config).await?;
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, "moonbase listening");
    axum::serve(listener, routes::router(state)).await?;
    Ok(())
}

/// Creates the first admin account when none exists and a password was
/// configured.
async fn bootstrap_admin(state: &AppState, config: &ServerConfig) -> Result<(), BootError> {
    if state.users.count_by_role(Role::Admin).await? > 0 {
        return Ok(());
    }
    let Some(password) = &config.admin_password
    else {
        warn!("no admin account exists and MOONBASE_ADMIN_PASSWORD is unset; admin endpoints are unreachable");
        return Ok(());
    };
    let user = state
        .users
        .create(NewUser {
            username: config.admin_username.clone(),
            email: config.admin_email.clone(),
            password: password.clone(),
            role: Role::Admin,
        })
        .await?;
    info!(user = %user.id, username = %user.username, "bootstrap admin created");
    Ok(())
}
