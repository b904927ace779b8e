//! Message source seam.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Opaque token identifying one delivery of a message.
///
/// Only valid for the delivery it came from; a redelivered message gets a
/// new handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptHandle(String);

impl ReceiptHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One delivered message.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub message_id: String,
    pub body: String,
    pub receipt_handle: ReceiptHandle,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("receive failed: {0}")]
    Receive(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("unknown or expired receipt handle: {0}")]
    UnknownHandle(ReceiptHandle),
}

/// Queue the pipeline pulls from.
pub trait MessageSource {
    /// Receive up to `max_count` messages, waiting up to `wait` when none
    /// are immediately available. An empty batch is not an error.
    fn receive(&mut self, max_count: usize, wait: Duration)
        -> Result<Vec<QueueMessage>, SourceError>;

    /// Remove a delivered message for good.
    fn delete(&mut self, handle: &ReceiptHandle) -> Result<(), SourceError>;
}
