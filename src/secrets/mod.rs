//! Secret loading
//!
//! Defines the [`SecretStore`] trait and the [`SecretLoader`] that turns one
//! named secret into a [`RawSecret`] mapping

pub mod aws;
pub mod file;
pub mod memory;

use crate::config::settings::{SecretBackendKind, SecretsConfig};
use crate::utils::error::{helpers::secret_backend_error, AppResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub use aws::AwsSecretsStore;
pub use file::FileSecretStore;
pub use memory::MemorySecretStore;

/// Raw secret contents: string keys to JSON values (strings or booleans in practice)
pub type RawSecret = Map<String, Value>;

/// Key-value blob store holding secrets by name
///
/// Implementations return the raw secret text; parsing belongs to the loader.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Backend name used in logs
    fn backend(&self) -> &str;

    /// Fetch the raw text of a named secret
    async fn fetch(&self, name: &str) -> AppResult<String>;
}

/// Loads the configured secret once per invocation
#[derive(Clone)]
pub struct SecretLoader {
    store: Arc<dyn SecretStore>,
    secret_name: Option<String>,
}

impl SecretLoader {
    pub fn new(store: Arc<dyn SecretStore>, secret_name: Option<String>) -> Self {
        Self { store, secret_name }
    }

    /// Load the secret
    ///
    /// Returns an empty mapping when no name is configured. A missing or
    /// malformed secret is a [`crate::AppError::SecretBackend`].
    pub async fn load(&self) -> AppResult<RawSecret> {
        let Some(name) = self.secret_name.as_deref() else {
            debug!("No secret name configured, using empty secret");
            return Ok(RawSecret::new());
        };

        debug!(backend = self.store.backend(), secret = name, "Loading secret");
        let text = self.store.fetch(name).await?;
        parse_secret(name, &text)
    }
}

/// Parse secret text into a [`RawSecret`]; the document must be a JSON object
pub fn parse_secret(name: &str, text: &str) -> AppResult<RawSecret> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(secret_backend_error(format!("Secret '{}' is not a JSON object", name))),
        Err(e) => Err(secret_backend_error(format!("Secret '{}' is not valid JSON: {}", name, e))),
    }
}

/// Build the process-wide secret store selected by the settings
pub async fn build_secret_store(config: &SecretsConfig) -> Arc<dyn SecretStore> {
    match config.backend {
        SecretBackendKind::Aws => {
            info!("Using AWS Secrets Manager secret backend");
            Arc::new(AwsSecretsStore::from_env(config.region.as_deref(), config.endpoint.as_deref()).await)
        }
        SecretBackendKind::File => {
            info!("Using file secret backend at {:?}", config.dir);
            Arc::new(FileSecretStore::new(config.dir.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppError;

    #[tokio::test]
    async fn test_unconfigured_loader_returns_empty() {
        let loader = SecretLoader::new(Arc::new(MemorySecretStore::new()), None);
        assert!(loader.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_secret_propagates() {
        let loader = SecretLoader::new(Arc::new(MemorySecretStore::new()), Some("prod/mesh".into()));
        assert!(matches!(loader.load().await, Err(AppError::SecretBackend(_))));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(parse_secret("x", "[1,2]"), Err(AppError::SecretBackend(_))));
        assert!(matches!(parse_secret("x", "{not json"), Err(AppError::SecretBackend(_))));
        assert_eq!(parse_secret("x", r#"{"MESH_API_KEY":"k"}"#).unwrap()["MESH_API_KEY"], "k");
    }
}
