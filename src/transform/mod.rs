//! Record transformation module.
//!
//! Maps one raw message body to a [`CanonicalRecord`](crate::storage::CanonicalRecord):
//! - `fields` - typed extraction and coercion of individual keys
//! - `record` - the body-to-record transform
//! - `error` - the failure taxonomy

pub mod error;
pub mod fields;
pub mod record;

pub use error::*;
pub use fields::*;
pub use record::*;
