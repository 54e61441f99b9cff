//! Process settings
//!
//! Loaded once at start-up from environment variables; everything that varies
//! per invocation lives in the secret instead

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Main process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    pub server: ServerConfig,
    /// Secret store configuration
    pub secrets: SecretsConfig,
    /// Upstream client configuration
    pub upstream: UpstreamConfig,
    /// Request configuration
    pub request: RequestConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Stage name stripped from incoming paths
    pub stage: Option<String>,
}

/// Which secret store backs the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackendKind {
    /// AWS Secrets Manager
    Aws,
    /// JSON files in a local directory
    File,
}

impl FromStr for SecretBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "aws" => Ok(Self::Aws),
            "file" => Ok(Self::File),
            other => anyhow::bail!("Invalid secret backend: {}", other),
        }
    }
}

/// Secret store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Name of the secret holding the Mesh configuration
    pub secret_name: Option<String>,
    /// Backend kind
    pub backend: SecretBackendKind,
    /// Directory for the file backend
    pub dir: PathBuf,
    /// Region override for the AWS backend
    pub region: Option<String>,
    /// Endpoint override for the AWS backend
    pub endpoint: Option<String>,
}

/// Upstream client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Request timeout in seconds
    pub timeout: u64,
}

/// Request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Maximum request size in bytes
    pub max_request_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Settings {
    /// Create a new configuration instance from the process environment
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create a configuration instance from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let get_optional = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let settings = Self {
            server: ServerConfig {
                host: get_or_default("SERVER_HOST", "0.0.0.0"),
                port: get_or_default("SERVER_PORT", "8080")
                    .parse()
                    .context("Invalid port number")?,
                stage: get_optional("STAGE").filter(|stage| stage != "$default"),
            },
            secrets: SecretsConfig {
                secret_name: get_optional("MESH_SECRET_NAME"),
                backend: get_or_default("SECRET_BACKEND", "aws")
                    .parse()
                    .context("Invalid SECRET_BACKEND value")?,
                dir: get_optional("SECRET_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_secret_dir),
                region: get_optional("AWS_REGION"),
                endpoint: get_optional("SECRETS_ENDPOINT"),
            },
            upstream: UpstreamConfig {
                timeout: get_or_default("UPSTREAM_TIMEOUT", "30")
                    .parse()
                    .context("Invalid upstream timeout value")?,
            },
            request: RequestConfig {
                max_request_size: get_or_default("MAX_REQUEST_SIZE", "1048576")
                    .parse()
                    .context("Invalid maximum request size")?,
            },
            logging: LoggingConfig {
                level: get_or_default("RUST_LOG", "info"),
                format: get_or_default("LOG_FORMAT", "text"),
            },
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration validity
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Port number cannot be 0");
        }

        if self.upstream.timeout == 0 {
            anyhow::bail!("Upstream timeout cannot be 0");
        }

        if self.request.max_request_size == 0 {
            anyhow::bail!("Maximum request size cannot be 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }

    /// Server listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Default directory for the file secret backend
/// ~/.config/meshproxy/secrets, or ./secrets without a home directory
fn default_secret_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".config").join("meshproxy").join("secrets"))
        .unwrap_or_else(|| PathBuf::from("secrets"))
}
