//! Mesh API gateway library
//!
//! Relays link-token, transfer and portfolio requests from a static frontend
//! to the Mesh API, resolving credentials and endpoints from a secret store

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod secrets;
pub mod services;
pub mod utils;

// Re-export common types
pub use config::{MeshConfig, Settings};
pub use handlers::{create_router, create_router_with_store, AppState};
pub use models::{ApiResponse, InvocationRequest};
pub use secrets::{RawSecret, SecretLoader, SecretStore};
pub use services::{Dispatcher, UpstreamClient, UpstreamResponse};
pub use utils::error::{AppError, AppResult};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
