//! Field extraction and coercion.
//!
//! Typed accessors over a parsed JSON object. Each returns the
//! [`TransformError`] variant that names what was wrong with the field.

use anyhow::anyhow;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use super::error::TransformError;

lazy_static! {
    /// Exact `YYYY-MM-DD` shape; chrono alone accepts single-digit months and days.
    static ref DATE_SHAPE: Regex = Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap();
}

/// Name of a JSON value's type, for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Look up a required key. Absent and `null` both count as missing.
pub fn require<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Value, TransformError> {
    match obj.get(key) {
        None | Some(Value::Null) => Err(TransformError::MissingField(key.to_string())),
        Some(value) => Ok(value),
    }
}

/// Required string field.
pub fn require_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a str, TransformError> {
    match require(obj, key)? {
        Value::String(s) => Ok(s.as_str()),
        other => Err(unexpected_type(key, "a string", other)),
    }
}

/// Required identifier-like field copied verbatim.
///
/// Numbers are kept in their JSON text form.
pub fn require_text(obj: &Map<String, Value>, key: &str) -> Result<String, TransformError> {
    match require(obj, key)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(unexpected_type(key, "a string or number", other)),
    }
}

/// Major version: the leading `.`-separated component as an integer.
///
/// `"3.10.2"` is 3, `"7"` is 7 and `" 3.1"` is 3; `"abc.1"` and `""` are invalid.
pub fn parse_major_version(version: &str) -> Result<i32, TransformError> {
    version
        .split('.')
        .next()
        .and_then(|major| major.trim().parse::<i32>().ok())
        .ok_or_else(|| TransformError::InvalidVersion {
            value: version.to_string(),
        })
}

/// Optional `create_date`. Absent, `null` and `""` yield `None`.
pub fn parse_create_date(value: Option<&Value>) -> Result<Option<NaiveDate>, TransformError> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.is_empty() => return Ok(None),
        Some(Value::String(s)) => s,
        Some(other) => return Err(unexpected_type("create_date", "a string", other)),
    };

    if !DATE_SHAPE.is_match(raw) {
        return Err(TransformError::InvalidDate {
            value: raw.clone(),
        });
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| TransformError::InvalidDate { value: raw.clone() })
}

fn unexpected_type(key: &str, expected: &str, got: &Value) -> TransformError {
    TransformError::Unknown {
        field: key.to_string(),
        source: anyhow!("expected {}, got {}", expected, json_type_name(got)),
    }
}
