//! Configuration management module
//!
//! Process settings come from environment variables; Mesh credentials and
//! endpoints are resolved per invocation from the loaded secret.

pub mod mesh;
pub mod settings;

pub use mesh::MeshConfig;
pub use settings::{SecretBackendKind, Settings};
