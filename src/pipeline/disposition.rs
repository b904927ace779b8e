//! Acknowledge-or-retain decision.
//!
//! A message is acknowledged if and only if its row was written. Every other
//! outcome leaves it in the queue for the source's own redelivery.

use thiserror::Error;

use crate::storage::sink::SinkError;
use crate::transform::error::{FailureKind, TransformError};

/// Why a message's row was not written.
#[derive(Debug, Error)]
pub enum MessageFailure {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("sink write failed: {0}")]
    Sink(#[from] SinkError),
}

impl MessageFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            MessageFailure::Transform(e) => e.kind(),
            MessageFailure::Sink(_) => FailureKind::SinkWriteFailure,
        }
    }
}

/// What happens to the source message after processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Acknowledge,
    Retain(FailureKind),
}

impl Disposition {
    /// Decide from the transform-and-write result of one message.
    pub fn decide(result: &Result<(), MessageFailure>) -> Self {
        match result {
            Ok(()) => Disposition::Acknowledge,
            Err(failure) => Disposition::Retain(failure.kind()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Disposition::Acknowledge => "acknowledge",
            Disposition::Retain(_) => "retain",
        }
    }

    pub fn is_acknowledge(&self) -> bool {
        matches!(self, Disposition::Acknowledge)
    }
}
