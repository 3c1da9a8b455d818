//! The moonbase HTTP surface: AIP-136 colon-verb routes over the engine,
//! the admin gate, the error envelope, and server startup.

pub mod auth;
pub mod boot;
pub mod config;
pub mod doc;
pub mod error;
pub mod routes;
pub mod state;

pub use boot::{build_state, serve, BootError};
pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;
