//! Database models for login storage.
//!
//! These models represent the structure of rows in the `user_logins` table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A login event after normalization and masking, ready for storage.
///
/// Only ever built by the transformer, so every field but `create_date` is
/// known to be present and well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub user_id: String,
    pub device_type: String,
    pub masked_ip: String,
    pub masked_device_id: String,
    pub locale: String,
    pub app_version: i32,
    pub create_date: Option<NaiveDate>,
}
