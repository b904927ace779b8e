//! Body-to-record transform.
//!
//! Parses one message body, masks `ip` and `device_id`, coerces
//! `app_version` and `create_date`, and fails closed: either every required
//! field is good and a record comes out, or nothing does.

use serde_json::Value;

use crate::logging::structured::LogContext;
use crate::security::masking::mask_value;
use crate::storage::models::CanonicalRecord;

use super::error::TransformError;
use super::fields::{
    json_type_name, parse_create_date, parse_major_version, require, require_str, require_text,
};

/// Keys every login event must carry.
pub const REQUIRED_FIELDS: &[&str] = &[
    "user_id",
    "device_type",
    "ip",
    "device_id",
    "locale",
    "app_version",
];

/// Transform a raw message body into a canonical record.
///
/// Failures are logged here and returned to the caller, which decides what
/// happens to the message.
pub fn transform_message(body: &str, ctx: &LogContext) -> Result<CanonicalRecord, TransformError> {
    let result = build_record(body);

    match &result {
        Ok(record) => {
            log::debug!(
                "{} TRANSFORM_OK user_id={} app_version={} create_date={:?}",
                ctx,
                record.user_id,
                record.app_version,
                record.create_date
            );
        }
        Err(e) => {
            crate::log_warn!(
                ctx,
                "TRANSFORM_FAILED",
                kind = e.kind().as_str(),
                field = e.field().unwrap_or("-"),
                error = e.to_string(),
            );
        }
    }

    result
}

fn build_record(body: &str) -> Result<CanonicalRecord, TransformError> {
    let parsed: Value = serde_json::from_str(body)?;
    let obj = match &parsed {
        Value::Object(obj) => obj,
        other => return Err(TransformError::NotAnObject(json_type_name(other))),
    };

    // Presence first, so a missing key is reported as missing rather than
    // as whatever coercion happens to run first.
    for key in REQUIRED_FIELDS {
        require(obj, key)?;
    }

    let app_version = parse_major_version(require_str(obj, "app_version")?)?;

    Ok(CanonicalRecord {
        user_id: require_text(obj, "user_id")?,
        device_type: require_text(obj, "device_type")?,
        masked_ip: mask_value(require_str(obj, "ip")?),
        masked_device_id: mask_value(require_str(obj, "device_id")?),
        locale: require_text(obj, "locale")?,
        app_version,
        create_date: parse_create_date(obj.get("create_date"))?,
    })
}

/// Transform bodies without writing or acknowledging anything.
///
/// Failures are logged and dropped; successes are returned in input order.
pub fn preview_messages<'a, I>(bodies: I, ctx: &LogContext) -> Vec<CanonicalRecord>
where
    I: IntoIterator<Item = &'a str>,
{
    bodies
        .into_iter()
        .filter_map(|body| transform_message(body, ctx).ok())
        .collect()
}
