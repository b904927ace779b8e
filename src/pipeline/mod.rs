//! Pipeline orchestration module.
//!
//! Drives the transform-and-commit cycle:
//! - Bounded receive from the message source
//! - Per-message transform
//! - Row write, one transaction per record
//! - Acknowledge only after a successful write

pub mod context;
pub mod disposition;
pub mod driver;

pub use context::*;
pub use disposition::*;
pub use driver::*;
