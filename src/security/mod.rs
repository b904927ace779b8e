//! Security module.
//!
//! Provides PII masking for persisted fields and redaction for log output.

pub mod masking;
pub mod pii;

pub use masking::*;
pub use pii::*;
