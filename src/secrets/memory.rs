//! In-process secret backend for local runs and tests

use super::SecretStore;
use crate::utils::error::{helpers::secret_backend_error, AppResult};
use async_trait::async_trait;
use std::collections::HashMap;

/// Secret store holding secrets in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    secrets: HashMap<String, String>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret
    pub fn with_secret(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), text.into());
        self
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, name: &str) -> AppResult<String> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| secret_backend_error(format!("Secret '{}' not found", name)))
    }
}
