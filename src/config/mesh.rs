//! Mesh configuration resolution
//!
//! Turns the raw secret mapping into a [`MeshConfig`]: credentials, identity
//! defaults and the three absolute endpoint URLs. Resolution is pure; all I/O
//! happens in the secret loader.

use crate::secrets::RawSecret;
use crate::utils::error::{AppError, AppResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;
use url::Url;

/// Prefix prepended to relative endpoint paths when the base URL carries no
/// API version segment
pub const DEFAULT_VERSION_PREFIX: &str = "api/v1/";

/// Default relative path of the link-token endpoint
pub const DEFAULT_LINK_TOKEN_PATH: &str = "linktoken";

/// Default relative path of the managed transfer endpoint
pub const DEFAULT_TRANSFER_PATH: &str = "transfers/managed/execute";

/// Default relative path of the holdings endpoint
pub const DEFAULT_PORTFOLIO_PATH: &str = "holdings/get";

/// User id sent when neither the caller nor the secret provides one
pub const DEFAULT_USER_ID: &str = "demo-user";

/// Secret keys read by the resolver, first present alias wins
pub mod keys {
    pub const BASE_URL: &[&str] = &["MESH_BASE_URL", "MESH_API_BASE_URL"];
    pub const CLIENT_SECRET: &[&str] = &["MESH_API_KEY", "MESH_CLIENT_SECRET"];
    pub const CLIENT_ID: &[&str] = &["MESH_CLIENT_ID"];
    pub const CUSTOMER_ID: &[&str] = &["MESH_CUSTOMER_ID"];
    pub const DEFAULT_USER_ID: &[&str] = &["MESH_DEFAULT_USER_ID", "MESH_USER_ID"];
    pub const DEFAULT_MFA_CODE: &[&str] = &["MESH_DEFAULT_MFA_CODE", "MESH_MFA_CODE"];
    pub const COINBASE_INTEGRATION_ID: &[&str] = &["MESH_COINBASE_INTEGRATION_ID", "MESH_INTEGRATION_ID"];
    pub const ETHEREUM_NETWORK_ID: &[&str] = &["MESH_ETHEREUM_NETWORK_ID", "MESH_NETWORK_ID"];
    pub const PAY_TO_ADDRESS: &[&str] = &["MESH_PAY_TO_ADDRESS"];
    pub const LINK_TOKEN_PATH: &[&str] = &["MESH_LINK_TOKEN_PATH", "MESH_LINK_TOKEN_URL"];
    pub const TRANSFER_PATH: &[&str] = &["MESH_TRANSFER_PATH", "MESH_TRANSFER_URL"];
    pub const PORTFOLIO_PATH: &[&str] = &["MESH_PORTFOLIO_PATH", "MESH_HOLDINGS_PATH"];
}

/// Resolved Mesh configuration, immutable for the rest of the invocation
#[derive(Clone, PartialEq)]
pub struct MeshConfig {
    /// Base URL, trailing slashes stripped
    pub base_url: String,
    /// Client secret sent as a credential header
    pub client_secret: String,
    pub client_id: Option<String>,
    pub customer_id: Option<String>,
    pub default_user_id: String,
    pub default_mfa_code: Option<String>,
    pub link_token_url: String,
    pub transfer_url: String,
    pub portfolio_url: String,
    pub coinbase_integration_id: Option<String>,
    pub ethereum_network_id: Option<String>,
    pub pay_to_address: Option<String>,
}

impl fmt::Debug for MeshConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshConfig")
            .field("base_url", &self.base_url)
            .field("client_secret", &"[REDACTED]")
            .field("client_id", &self.client_id.as_ref().map(|_| "[SET]"))
            .field("customer_id", &self.customer_id)
            .field("default_user_id", &self.default_user_id)
            .field("default_mfa_code", &self.default_mfa_code.as_ref().map(|_| "[REDACTED]"))
            .field("link_token_url", &self.link_token_url)
            .field("transfer_url", &self.transfer_url)
            .field("portfolio_url", &self.portfolio_url)
            .field("coinbase_integration_id", &self.coinbase_integration_id)
            .field("ethereum_network_id", &self.ethereum_network_id)
            .field("pay_to_address", &self.pay_to_address)
            .finish()
    }
}

impl MeshConfig {
    /// Resolve the configuration from a raw secret
    ///
    /// Fails with [`AppError::Config`] naming the missing field when the base
    /// URL or the client secret is absent.
    pub fn resolve(secret: &RawSecret) -> AppResult<Self> {
        let base_url = read_string(secret, keys::BASE_URL)
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| missing_field(secret, keys::BASE_URL[0]))?;

        let client_secret = read_string(secret, keys::CLIENT_SECRET)
            .ok_or_else(|| missing_field(secret, keys::CLIENT_SECRET[0]))?;

        let base = Url::parse(&base_url).map_err(|e| AppError::Config {
            message: format!("{} is not a valid absolute URL: {}", keys::BASE_URL[0], e),
            secret_keys: secret_key_presence(secret),
        })?;

        let endpoint = |override_keys: &[&str], default_path: &str| {
            resolve_endpoint_url(&base, read_string(secret, override_keys).as_deref(), default_path)
                .map_err(|message| AppError::Config {
                    message: format!("{}: {}", override_keys[0], message),
                    secret_keys: secret_key_presence(secret),
                })
        };

        let config = Self {
            link_token_url: endpoint(keys::LINK_TOKEN_PATH, DEFAULT_LINK_TOKEN_PATH)?,
            transfer_url: endpoint(keys::TRANSFER_PATH, DEFAULT_TRANSFER_PATH)?,
            portfolio_url: endpoint(keys::PORTFOLIO_PATH, DEFAULT_PORTFOLIO_PATH)?,
            base_url,
            client_secret,
            client_id: read_string(secret, keys::CLIENT_ID),
            customer_id: read_string(secret, keys::CUSTOMER_ID),
            default_user_id: read_string(secret, keys::DEFAULT_USER_ID)
                .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            default_mfa_code: read_string(secret, keys::DEFAULT_MFA_CODE),
            coinbase_integration_id: read_string(secret, keys::COINBASE_INTEGRATION_ID),
            ethereum_network_id: read_string(secret, keys::ETHEREUM_NETWORK_ID),
            pay_to_address: read_string(secret, keys::PAY_TO_ADDRESS),
        };

        debug!(
            link_token_url = %config.link_token_url,
            transfer_url = %config.transfer_url,
            portfolio_url = %config.portfolio_url,
            "Resolved Mesh endpoints"
        );

        Ok(config)
    }
}

/// Resolve one endpoint URL against the base URL
///
/// Absolute override URLs are returned verbatim. Relative overrides and the
/// default path get the version prefix when the base path has no version
/// segment, then are joined with RFC 3986 reference resolution. Rooted
/// relative paths are joined as-is.
pub fn resolve_endpoint_url(base: &Url, override_value: Option<&str>, default_path: &str) -> Result<String, String> {
    if let Some(value) = override_value {
        if has_scheme(value) {
            return Ok(value.to_string());
        }
    }

    let relative = override_value.unwrap_or(default_path);
    let relative = if !relative.starts_with('/') && needs_version_prefix(base) {
        format!("{}{}", DEFAULT_VERSION_PREFIX, relative)
    } else {
        relative.to_string()
    };

    base.join(&relative)
        .map(String::from)
        .map_err(|e| format!("cannot be joined onto the base URL: {}", e))
}

/// Whether the base URL's path lacks an API version segment
pub fn needs_version_prefix(base: &Url) -> bool {
    let path = base.path().trim_end_matches('/');
    let versioned = ["/v1", "/v2", "/api/v1", "/api/v2"]
        .iter()
        .any(|suffix| path.ends_with(suffix))
        || path.contains("/api/");
    !versioned
}

/// Whether a value starts with a URL scheme followed by `://`
fn has_scheme(value: &str) -> bool {
    match value.split_once("://") {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Report, for every key in the secret, whether its value was truthy
///
/// Only booleans leave this function; values are never copied.
pub fn secret_key_presence(secret: &RawSecret) -> BTreeMap<String, bool> {
    secret
        .iter()
        .map(|(key, value)| (key.clone(), is_truthy(value)))
        .collect()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Read the first alias holding a non-empty string (numbers and booleans are
/// read as their text)
fn read_string(secret: &RawSecret, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|key| match secret.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn missing_field(secret: &RawSecret, field: &str) -> AppError {
    AppError::Config {
        message: format!("Missing required secret field: {}", field),
        secret_keys: secret_key_presence(secret),
    }
}
