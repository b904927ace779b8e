//! Message source module.
//!
//! The queue side of the pipeline:
//! - `source` - the receive/delete seam the driver consumes
//! - `memory` - an in-process queue with visibility-timeout semantics

pub mod memory;
pub mod source;

pub use memory::*;
pub use source::*;
