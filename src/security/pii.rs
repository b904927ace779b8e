//! PII redaction for diagnostic output.
//!
//! Failed messages are logged with their raw body so they can be diagnosed,
//! but the body must not carry a raw `ip` or `device_id` into the logs:
//! - Known PII keys are replaced by their masked digest
//! - Any other IPv4-looking substring is replaced by `[IP_ADDRESS]`
//! - Bodies that are not JSON are scrubbed as plain text

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::security::masking::mask_value;

lazy_static! {
    /// IP address pattern (IPv4)
    static ref IP_PATTERN: Regex = Regex::new(
        r"\b(?:\d{1,3}\.){3}\d{1,3}\b"
    ).unwrap();

    /// `"ip"` / `"device_id"` keys inside text that failed to parse, with
    /// whatever value follows: quoted (closing quote optional, so a body cut
    /// off mid-value still matches) or bare up to the next delimiter.
    static ref KEYED_PII_PATTERN: Regex = Regex::new(
        r#""(ip|device_id)"\s*:\s*(?:"((?:[^"\\]|\\.?)*)"?|([^,}\]\s]*))"#
    ).unwrap();
}

/// Keys whose values are masked wherever they appear in a body.
pub const PII_TARGET_FIELDS: &[&str] = &["ip", "device_id"];

/// Redaction counters.
#[derive(Debug, Default)]
pub struct RedactionResult {
    pub fields_masked: usize,
    pub ips_found: usize,
}

impl RedactionResult {
    pub fn total_entities(&self) -> usize {
        self.fields_masked + self.ips_found
    }
}

/// Produce a log-safe rendering of a raw message body.
pub fn redact_body(body: &str) -> String {
    redact_body_with_stats(body).0
}

/// Same as [`redact_body`], also returning what was replaced.
pub fn redact_body_with_stats(body: &str) -> (String, RedactionResult) {
    let mut result = RedactionResult::default();

    let redacted = match serde_json::from_str::<Value>(body) {
        Ok(value) => redact_value(&value, &mut result).to_string(),
        Err(_) => scrub_text(body, &mut result),
    };

    (redacted, result)
}

/// Recursively redact PII from a JSON value.
fn redact_value(value: &Value, result: &mut RedactionResult) -> Value {
    match value {
        Value::String(s) => Value::String(scrub_string(s, result)),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_value(v, result)).collect()),
        Value::Object(obj) => {
            let mut redacted = serde_json::Map::new();
            for (key, val) in obj {
                if PII_TARGET_FIELDS.contains(&key.as_str()) {
                    result.fields_masked += 1;
                    let masked = match val {
                        Value::String(s) => mask_value(s),
                        other => mask_value(&other.to_string()),
                    };
                    redacted.insert(key.clone(), Value::String(masked));
                } else {
                    redacted.insert(key.clone(), redact_value(val, result));
                }
            }
            Value::Object(redacted)
        }
        _ => value.clone(),
    }
}

/// Mask keyed PII pairs in unparseable text, then scrub what is left.
fn scrub_text(s: &str, result: &mut RedactionResult) -> String {
    let keyed = KEYED_PII_PATTERN.replace_all(s, |caps: &regex::Captures<'_>| {
        result.fields_masked += 1;
        let raw = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        format!("\"{}\": \"{}\"", &caps[1], mask_value(raw))
    });
    scrub_string(&keyed, result)
}

/// Scrub IPv4 addresses from free text.
fn scrub_string(s: &str, result: &mut RedactionResult) -> String {
    let ip_count = IP_PATTERN.find_iter(s).count();
    if ip_count == 0 {
        return s.to_string();
    }
    result.ips_found += ip_count;
    IP_PATTERN.replace_all(s, "[IP_ADDRESS]").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_body_masks_target_fields() {
        let body = r#"{"user_id":"u1","ip":"10.0.0.1","device_id":"abc-123"}"#;
        let (redacted, result) = redact_body_with_stats(body);

        assert!(!redacted.contains("10.0.0.1"));
        assert!(!redacted.contains("abc-123"));
        assert!(redacted.contains(&mask_value("10.0.0.1")));
        assert!(redacted.contains("u1"));
        assert_eq!(result.fields_masked, 2);
    }

    #[test]
    fn test_ip_in_other_field_is_scrubbed() {
        let body = r#"{"note":"seen from 192.168.1.100"}"#;
        let redacted = redact_body(body);
        assert!(redacted.contains("[IP_ADDRESS]"));
        assert!(!redacted.contains("192.168.1.100"));
    }

    #[test]
    fn test_malformed_body_is_scrubbed_as_text() {
        let body = r#"{"ip": "172.16.0.9", "device_id": "dev-9", "locale": "#;
        let (redacted, result) = redact_body_with_stats(body);
        assert!(!redacted.contains("172.16.0.9"));
        assert!(!redacted.contains("dev-9"));
        assert!(redacted.contains(&mask_value("dev-9")));
        assert_eq!(result.fields_masked, 2);
    }

    #[test]
    fn test_truncated_value_is_masked() {
        let body = r#"{"user_id": "u1", "ip": "10.0.0.1", "device_id": "593-47-5928"#;
        let (redacted, result) = redact_body_with_stats(body);
        assert!(!redacted.contains("593-47-5928"));
        assert!(!redacted.contains("10.0.0.1"));
        assert!(redacted.contains(&mask_value("593-47-5928")));
        assert!(redacted.contains("u1"));
        assert_eq!(result.fields_masked, 2);
    }

    #[test]
    fn test_bare_and_non_ipv4_values_are_masked() {
        let body = r#"{"ip": "2001:db8::1", "device_id": 12345, "#;
        let redacted = redact_body(body);
        assert!(!redacted.contains("2001:db8::1"));
        assert!(!redacted.contains("12345"));
        assert!(redacted.contains(&mask_value("12345")));
        assert!(redacted.contains(&mask_value("2001:db8::1")));
    }

    #[test]
    fn test_escaped_quote_inside_truncated_value() {
        let body = r#"{"device_id": "ab\"cd-secret"#;
        let redacted = redact_body(body);
        assert!(!redacted.contains("cd-secret"));
    }

    #[test]
    fn test_free_text_ip_is_scrubbed() {
        let (redacted, result) = redact_body_with_stats("garbage from 172.16.0.9");
        assert_eq!(redacted, "garbage from [IP_ADDRESS]");
        assert_eq!(result.ips_found, 1);
    }

    #[test]
    fn test_no_pii() {
        let body = "not json at all";
        let (redacted, result) = redact_body_with_stats(body);
        assert_eq!(redacted, body);
        assert_eq!(result.total_entities(), 0);
    }
}
