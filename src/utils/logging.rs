//! Logging utilities
//!
//! Redaction and summarising helpers shared by log statements and error
//! envelopes

use serde_json::Value;

/// Set to true to include full (still redacted) upstream bodies in debug logs
/// Default is false to reduce log verbosity
pub const VERBOSE_UPSTREAM_LOGGING: bool = false;

/// Replacement for sensitive values
pub const REDACTED: &str = "[REDACTED]";

/// Field names whose values are credentials or caller tokens
pub const SENSITIVE_FIELDS: &[&str] = &[
    "accessToken",
    "authToken",
    "fromAuthToken",
    "mfaCode",
    "clientSecret",
];

/// Check whether a field name holds a sensitive value
pub fn is_sensitive_field(name: &str) -> bool {
    SENSITIVE_FIELDS.contains(&name)
}

/// Return a copy of `value` with every sensitive field masked, at any depth
pub fn redact_sensitive(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    let masked = if is_sensitive_field(key) && !inner.is_null() {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_sensitive(inner)
                    };
                    (key.clone(), masked)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive).collect()),
        other => other.clone(),
    }
}

/// Collect the non-empty string values held under sensitive field names
pub fn sensitive_values(value: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_sensitive_values(value, &mut found);
    found.sort();
    found.dedup();
    found
}

fn collect_sensitive_values(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                match inner {
                    Value::String(s) if is_sensitive_field(key) && !s.is_empty() => found.push(s.clone()),
                    other => collect_sensitive_values(other, found),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_sensitive_values(item, found)),
        _ => {}
    }
}

/// Mask every occurrence of `secrets` inside any string of `value`
///
/// Upstream error text can quote a token back verbatim; field-name redaction
/// alone does not catch that.
pub fn scrub_values(value: &Value, secrets: &[String]) -> Value {
    match value {
        Value::String(s) => Value::String(scrub_text(s, secrets)),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| (key.clone(), scrub_values(inner, secrets)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|item| scrub_values(item, secrets)).collect()),
        other => other.clone(),
    }
}

/// Mask every occurrence of `secrets` inside `text`
pub fn scrub_text(text: &str, secrets: &[String]) -> String {
    secrets
        .iter()
        .filter(|secret| !secret.is_empty())
        .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), REDACTED))
}

/// Truncate a string with a note about original length
fn truncate_content(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}... ({} chars truncated)", &s[..cut], s[cut..].chars().count()),
        None => s.to_string(),
    }
}

/// Create a redacted, size-bounded rendering of a JSON body for logging
pub fn create_body_log_summary(value: &Value) -> String {
    let rendered = redact_sensitive(value).to_string();
    if VERBOSE_UPSTREAM_LOGGING {
        rendered
    } else {
        truncate_content(&rendered, 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redacts_nested_tokens() {
        let value = json!({
            "accessToken": "tok123",
            "amount": 10,
            "transferOptions": {"fromAuthToken": "abc", "toAddresses": [{"mfaCode": "123456"}]},
        });
        let redacted = redact_sensitive(&value);
        let text = redacted.to_string();
        assert!(!text.contains("tok123"));
        assert!(!text.contains("abc"));
        assert!(!text.contains("123456"));
        assert_eq!(redacted["amount"], 10);
        assert_eq!(redacted["transferOptions"]["fromAuthToken"], REDACTED);
    }

    #[test]
    fn test_null_tokens_stay_null() {
        let redacted = redact_sensitive(&json!({"authToken": null}));
        assert!(redacted["authToken"].is_null());
    }

    #[test]
    fn test_scrub_masks_tokens_inside_text() {
        let payload = json!({"accessToken": "tok123", "nested": {"mfaCode": "999"}, "memo": "Shoes"});
        let secrets = sensitive_values(&payload);
        assert_eq!(secrets, vec!["999".to_string(), "tok123".to_string()]);

        let upstream = json!({"error": "invalid access token tok123", "details": ["code 999 rejected"], "status": 401});
        let scrubbed = scrub_values(&upstream, &secrets);
        assert_eq!(scrubbed["error"], "invalid access token [REDACTED]");
        assert_eq!(scrubbed["details"][0], "code [REDACTED] rejected");
        assert_eq!(scrubbed["status"], 401);
    }

    #[test]
    fn test_scrub_ignores_empty_secret() {
        assert_eq!(scrub_text("unchanged", &[String::new()]), "unchanged");
    }

    #[test]
    fn test_truncate_content_on_char_boundary() {
        let text = "ééééé";
        assert_eq!(truncate_content(text, 2), "éé... (3 chars truncated)");
        assert_eq!(truncate_content(text, 10), text);
    }
}
