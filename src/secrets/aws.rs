//! AWS Secrets Manager backend

use super::SecretStore;
use crate::utils::error::{helpers::secret_backend_error, AppResult};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::Client;
use tracing::debug;

/// Secret store backed by AWS Secrets Manager
///
/// The SDK client is created once at start-up and shared by every invocation.
#[derive(Debug, Clone)]
pub struct AwsSecretsStore {
    client: Client,
}

impl AwsSecretsStore {
    /// Build a store from the default AWS credential and region chain
    pub async fn from_env(region: Option<&str>, endpoint: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;
        Self::from_client(Client::new(&shared_config))
    }

    /// Wrap an existing client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for AwsSecretsStore {
    fn backend(&self) -> &str {
        "aws"
    }

    async fn fetch(&self, name: &str) -> AppResult<String> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| {
                secret_backend_error(format!("Failed to fetch secret '{}': {}", name, DisplayErrorContext(&e)))
            })?;

        debug!(secret = name, "Fetched secret from AWS Secrets Manager");

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| secret_backend_error(format!("Secret '{}' has no string value", name)))
    }
}
