//! Structured logging with cycle context.
//!
//! Provides a logging macro and utilities that include cycle_id and message_id
//! in every log message for easy correlation.

pub mod structured;

pub use structured::*;
