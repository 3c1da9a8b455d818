use std::net::SocketAddr;

use clap::Parser;
use moonbase_core::limits::Limits;

/// `moond` startup configuration. Every flag can come from the
/// environment; nothing is read after startup.
#[derive(Debug, Clone, Parser)]
#[command(name = "moond", version, about = "moonbase: schema-managed REST backend")]
pub struct ServerConfig {
    /// Database URL: postgres://..., mysql://..., or sqlite:path.
    #[arg(long, env = "MOONBASE_DATABASE_URL", default_value = "sqlite:moonbase.db?mode=rwc")]
    pub database_url: String,

    /// Address to listen on.
    #[arg(long, env = "MOONBASE_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Secret for signing and verifying bearer tokens.
    #[arg(long, env = "MOONBASE_JWT_SECRET")]
    pub jwt_secret: String,

    /// Username for the bootstrap admin, created when no admin exists.
    #[arg(long, env = "MOONBASE_ADMIN_USERNAME", default_value = "admin")]
    pub admin_username: String,

    /// Email for the bootstrap admin.
    #[arg(long, env = "MOONBASE_ADMIN_EMAIL", default_value = "admin@moonbase.local")]
    pub admin_email: String,

    /// Password for the bootstrap admin. When unset and no admin exists,
    /// the server starts without one and logs a warning.
    #[arg(long, env = "MOONBASE_ADMIN_PASSWORD")]
    pub admin_password: Option<String>,

    /// Override for the collection count limit.
    #[arg(long, env = "MOONBASE_MAX_COLLECTIONS")]
    pub max_collections: Option<usize>,

    /// Override for the per-collection column limit.
    #[arg(long, env = "MOONBASE_MAX_COLUMNS")]
    pub max_columns: Option<usize>,

    /// Override for the batch item limit.
    #[arg(long, env = "MOONBASE_MAX_BATCH_SIZE")]
    pub max_batch_size: Option<usize>,

    /// Override for the request payload cap, in bytes.
    #[arg(long, env = "MOONBASE_MAX_PAYLOAD_BYTES")]
    pub max_payload_bytes: Option<u64>,
}

impl ServerConfig {
    /// Resolved limits: defaults with any configured overrides applied.
    pub fn limits(&self) -> Limits {
        let mut limits = Limits::default();
        if let Some(value) = self.max_collections {
            limits.max_collections_per_server = value;
        }
        if let Some(value) = self.max_columns {
            limits.max_columns_per_collection = value;
        }
        if let Some(value) = self.max_batch_size {
            limits.max_batch_size = value;
        }
        if let Some(value) = self.max_payload_bytes {
            limits.max_payload_bytes = value;
        }
        limits
    }
}
