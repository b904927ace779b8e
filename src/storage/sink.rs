//! Row sink and committed-row reader.
//!
//! The pipeline writes through [`RowSink`]; the viewer reads through
//! [`RowReader`]. Each `insert` is its own transaction: a record is either
//! fully written or not written at all.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;

use super::models::CanonicalRecord;

/// Failure reported by a row sink or reader.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("write rejected: {0}")]
    WriteFailed(String),

    #[error("write exceeded timeout of {0:?}")]
    Timeout(Duration),

    #[error("query failed: {0}")]
    Query(String),

    #[error("row decode failed: {0}")]
    Decode(String),
}

impl SinkError {
    /// Sink failures leave the message unacknowledged, so a later cycle retries it.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SinkError::Decode(_))
    }
}

/// Destination for transformed records.
pub trait RowSink {
    fn insert(&mut self, record: &CanonicalRecord) -> Result<(), SinkError>;
}

/// Read access to committed rows.
pub trait RowReader {
    fn list_committed(&self) -> Result<Vec<CanonicalRecord>, SinkError>;
}

#[derive(Debug, Default)]
struct SinkState {
    rows: Vec<CanonicalRecord>,
    fail_writes: bool,
    attempts: usize,
}

/// Append-only in-memory sink.
///
/// Clones share the same rows, so a test can keep a handle while a
/// pipeline owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    state: Arc<Mutex<SinkState>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following insert fail until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    pub fn rows(&self) -> Vec<CanonicalRecord> {
        self.state.lock().rows.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of insert calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.state.lock().attempts
    }
}

impl RowSink for InMemorySink {
    fn insert(&mut self, record: &CanonicalRecord) -> Result<(), SinkError> {
        let mut state = self.state.lock();
        state.attempts += 1;
        if state.fail_writes {
            return Err(SinkError::WriteFailed("sink unavailable".to_string()));
        }
        state.rows.push(record.clone());
        Ok(())
    }
}

impl RowReader for InMemorySink {
    fn list_committed(&self) -> Result<Vec<CanonicalRecord>, SinkError> {
        Ok(self.rows())
    }
}
