//! File-based secret backend
//!
//! Each secret lives at `{dir}/{name}.json`; names may contain `/` to nest
//! directories, mirroring hierarchical secret names

use super::SecretStore;
use crate::utils::error::{helpers::secret_backend_error, AppResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Secret store reading JSON files from a directory
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    dir: PathBuf,
}

impl FileSecretStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file holding `name`
    pub fn secret_path(&self, name: &str) -> AppResult<PathBuf> {
        let relative = Path::new(name);
        let safe = !name.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(secret_backend_error(format!("Invalid secret name '{}'", name)));
        }
        Ok(self.dir.join(format!("{}.json", name)))
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    fn backend(&self) -> &str {
        "file"
    }

    async fn fetch(&self, name: &str) -> AppResult<String> {
        let path = self.secret_path(name)?;
        debug!("Reading secret file: {:?}", path);

        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| secret_backend_error(format!("Failed to read secret '{}' from {:?}: {}", name, path, e)))
    }
}
