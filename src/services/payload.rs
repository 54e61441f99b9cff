//! Payload builders
//!
//! Shape the JSON sent upstream for each route by merging the caller body
//! with configured defaults. Every default is applied with set-if-absent
//! semantics: a key the caller sent is never overwritten, whatever its value.
//! Builders are pure, so identical inputs always give identical payloads.

use crate::config::MeshConfig;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// JSON object sent upstream
pub type Payload = Map<String, Value>;

/// Caller fields that already identify the user
pub const USER_ID_ALIASES: &[&str] = &["userId", "userGuid", "customerId"];

/// Caller fields that already identify the customer
pub const CUSTOMER_ID_ALIASES: &[&str] = &["customerId", "customerGuid"];

/// Caller fields that already pick the integration
pub const INTEGRATION_ALIASES: &[&str] = &["integrationId", "brokerType"];

/// Caller fields carrying an access/auth token
pub const TOKEN_FIELDS: &[&str] = &["accessToken", "authToken"];

/// Lookup order for the portfolio auth token
pub const PORTFOLIO_TOKEN_FIELDS: &[&str] = &["authToken", "accessToken"];

/// Products requested for a plain link token
pub const DEFAULT_LINK_PRODUCTS: [&str; 3] = ["transactions", "portfolio", "transfer"];

/// Products requested for a pay link token
pub const DEFAULT_PAY_PRODUCTS: [&str; 1] = ["transfer"];

pub const DEFAULT_MEMO: &str = "Shoes";
pub const DEFAULT_ASSET: &str = "USDC";
pub const DEFAULT_NETWORK: &str = "ethereum";
pub const DEFAULT_AMOUNT: u64 = 50;
pub const DEFAULT_PORTFOLIO_TYPE: &str = "coinbase";

/// Builder over a JSON object with set-if-absent semantics
#[derive(Debug, Clone, Default)]
pub struct PayloadBuilder {
    fields: Payload,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a copy of the caller's fields
    pub fn from_body(body: &Payload) -> Self {
        Self { fields: body.clone() }
    }

    /// Whether `key` is present, whatever its value
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Set `key` unless it is already present
    pub fn set_if_absent(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        if !self.fields.contains_key(key) {
            self.fields.insert(key.to_string(), value.into());
        }
        self
    }

    /// Set `key` to a value only when there is one and the key is absent
    pub fn set_opt_if_absent<V: Into<Value>>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.set_if_absent(key, value);
        }
        self
    }

    /// Set `key` unless any of `aliases` is already present
    pub fn set_if_none_present(&mut self, aliases: &[&str], key: &str, value: impl Into<Value>) -> &mut Self {
        if !aliases.iter().any(|alias| self.fields.contains_key(*alias)) {
            self.set_if_absent(key, value);
        }
        self
    }

    pub fn build(self) -> Payload {
        self.fields
    }
}

/// First alias holding a usable value (not null, not an empty string)
pub fn first_present<'a>(fields: &'a Payload, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| match fields.get(*key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        value => Some(value),
    })
}

/// First alias holding a non-empty string
pub fn first_string<'a>(fields: &'a Payload, aliases: &[&str]) -> Option<&'a str> {
    aliases.iter().find_map(|key| {
        fields
            .get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    })
}

/// Token that switches the pay route to the legacy direct transfer
pub fn legacy_transfer_token(body: &Payload) -> Option<&str> {
    first_string(body, TOKEN_FIELDS)
}

/// Locate the portfolio auth token
///
/// Looks at `authToken` then `accessToken`, in the body first when
/// `prefer_body` is set, otherwise in the query first.
pub fn find_auth_token<'a>(
    body: &'a Payload,
    query: &'a HashMap<String, String>,
    prefer_body: bool,
) -> Option<&'a str> {
    let from_query = || {
        PORTFOLIO_TOKEN_FIELDS.iter().find_map(|key| {
            query
                .get(*key)
                .map(String::as_str)
                .filter(|s| !s.trim().is_empty())
        })
    };
    let from_body = || first_string(body, PORTFOLIO_TOKEN_FIELDS);

    if prefer_body {
        from_body().or_else(from_query)
    } else {
        from_query().or_else(from_body)
    }
}

/// Fill `userId`, `customerId` and `clientId` from configuration
fn apply_identity_defaults(builder: &mut PayloadBuilder, config: &MeshConfig) {
    builder.set_if_none_present(USER_ID_ALIASES, "userId", config.default_user_id.as_str());
    if let Some(customer_id) = &config.customer_id {
        builder.set_if_none_present(CUSTOMER_ID_ALIASES, "customerId", customer_id.as_str());
    }
    builder.set_opt_if_absent("clientId", config.client_id.as_deref());
}

fn apply_integration_default(builder: &mut PayloadBuilder, config: &MeshConfig) {
    if let Some(integration_id) = &config.coinbase_integration_id {
        builder.set_if_none_present(INTEGRATION_ALIASES, "integrationId", integration_id.as_str());
    }
}

/// Link-token payload for `/mesh/link-token` and `/mesh/link-token/connect`
pub fn build_link_token_payload(body: &Payload, config: &MeshConfig) -> Payload {
    let mut builder = PayloadBuilder::from_body(body);
    apply_identity_defaults(&mut builder, config);
    builder
        .set_if_absent("restrictMultipleAccounts", true)
        .set_if_absent("products", json!(DEFAULT_LINK_PRODUCTS));
    apply_integration_default(&mut builder, config);
    builder.build()
}

/// Pay-flavoured link-token payload with nested `transferOptions`
pub fn build_pay_link_token_payload(body: &Payload, config: &MeshConfig) -> Payload {
    let mut builder = PayloadBuilder::from_body(body);
    apply_identity_defaults(&mut builder, config);
    builder
        .set_if_absent("restrictMultipleAccounts", true)
        .set_if_absent("products", json!(DEFAULT_PAY_PRODUCTS));
    apply_integration_default(&mut builder, config);

    let mut payload = builder.build();
    if let Some(options) = build_transfer_options(body, config) {
        payload.insert("transferOptions".to_string(), Value::Object(options));
    }
    payload
}

/// Merge the caller's `transferOptions` with synthesised defaults
///
/// Returns `None` when the caller sent a non-object `transferOptions`
/// (including `null`), which is then left untouched.
fn build_transfer_options(body: &Payload, config: &MeshConfig) -> Option<Payload> {
    let mut options = match body.get("transferOptions") {
        None => PayloadBuilder::new(),
        Some(Value::Object(existing)) => PayloadBuilder::from_body(existing),
        Some(_) => return None,
    };

    if !options.contains("toAddresses") {
        let address = first_string(body, &["toAddress", "address"]).or(config.pay_to_address.as_deref());
        let network_id = first_string(body, &["networkId"]).or(config.ethereum_network_id.as_deref());
        let symbol = first_string(body, &["symbol", "asset"]).unwrap_or(DEFAULT_ASSET);

        if let (Some(address), Some(network_id)) = (address, network_id) {
            options.set_if_absent(
                "toAddresses",
                json!([{
                    "networkId": network_id,
                    "symbol": symbol,
                    "address": address,
                }]),
            );
        }
    }

    let amount = first_present(body, &["amountInFiat", "amount"])
        .cloned()
        .unwrap_or_else(|| json!(DEFAULT_AMOUNT));
    options
        .set_if_absent("amountInFiat", amount)
        .set_if_absent("isInclusiveFeeEnabled", false)
        .set_opt_if_absent("transactionId", first_present(body, &["transactionId"]).cloned());

    Some(options.build())
}

/// Legacy direct-transfer payload, sent to the transfer endpoint
pub fn build_transfer_payload(body: &Payload, config: &MeshConfig) -> Payload {
    let mut builder = PayloadBuilder::from_body(body);
    builder.set_opt_if_absent("fromAuthToken", legacy_transfer_token(body));
    apply_identity_defaults(&mut builder, config);

    let amount = first_present(body, &["amountInFiat"])
        .cloned()
        .unwrap_or_else(|| json!(DEFAULT_AMOUNT));
    builder
        .set_if_absent("memo", DEFAULT_MEMO)
        .set_if_absent("asset", first_string(body, &["symbol"]).unwrap_or(DEFAULT_ASSET))
        .set_if_absent("network", DEFAULT_NETWORK)
        .set_if_absent("amount", amount)
        .set_opt_if_absent("toAddress", config.pay_to_address.as_deref())
        .set_opt_if_absent("networkId", config.ethereum_network_id.as_deref())
        .set_opt_if_absent("integrationId", config.coinbase_integration_id.as_deref())
        .set_opt_if_absent("mfaCode", config.default_mfa_code.as_deref());
    builder.build()
}

/// Holdings payload for `/mesh/portfolio`
pub fn build_portfolio_payload(body: &Payload, auth_token: &str, query: &HashMap<String, String>) -> Payload {
    let kind = first_string(body, &["type", "brokerType"])
        .or_else(|| query.get("type").map(String::as_str).filter(|s| !s.trim().is_empty()))
        .unwrap_or(DEFAULT_PORTFOLIO_TYPE);

    let mut builder = PayloadBuilder::from_body(body);
    builder
        .set_if_absent("authToken", auth_token)
        .set_if_absent("type", kind)
        .set_if_absent("includeMarketValue", true);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(value: Value) -> Payload {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_set_if_absent_keeps_null() {
        let mut builder = PayloadBuilder::from_body(&body(json!({"memo": null})));
        builder.set_if_absent("memo", DEFAULT_MEMO);
        assert!(builder.build()["memo"].is_null());
    }

    #[test]
    fn test_set_if_none_present_respects_aliases() {
        let mut builder = PayloadBuilder::from_body(&body(json!({"userGuid": "g-1"})));
        builder.set_if_none_present(USER_ID_ALIASES, "userId", "demo");
        assert!(!builder.build().contains_key("userId"));
    }

    #[test]
    fn test_first_present_skips_blank() {
        let fields = body(json!({"amountInFiat": "", "amount": 12}));
        assert_eq!(first_present(&fields, &["amountInFiat", "amount"]), Some(&json!(12)));
    }

    #[test]
    fn test_find_auth_token_order() {
        let fields = body(json!({"accessToken": "from-body"}));
        let mut query = HashMap::new();
        query.insert("accessToken".to_string(), "from-query".to_string());
        assert_eq!(find_auth_token(&fields, &query, true), Some("from-body"));
        assert_eq!(find_auth_token(&fields, &query, false), Some("from-query"));

        query.insert("authToken".to_string(), "auth-query".to_string());
        assert_eq!(find_auth_token(&fields, &query, false), Some("auth-query"));
    }
}
