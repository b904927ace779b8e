//! In-process message queue.
//!
//! Models the parts of a hosted queue the pipeline relies on:
//! - Receiving hides a message (it becomes in-flight) instead of removing it
//! - Each delivery gets a fresh receipt handle
//! - Only `delete` removes a message
//! - [`InMemoryQueue::expire_visibility`] stands in for the visibility
//!   timeout running out, making in-flight messages receivable again

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use uuid::Uuid;

use super::source::{MessageSource, QueueMessage, ReceiptHandle, SourceError};

#[derive(Debug)]
struct StoredMessage {
    message_id: String,
    body: String,
    in_flight: Option<ReceiptHandle>,
    receive_count: u32,
}

#[derive(Debug, Default)]
struct QueueState {
    messages: Vec<StoredMessage>,
    fail_receives: bool,
    fail_deletes: bool,
    deleted: usize,
}

/// FIFO queue held in memory. Clones share the same messages.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueue {
    state: Arc<Mutex<QueueState>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a message body, returning its message id.
    pub fn send(&self, body: impl Into<String>) -> String {
        let message_id = Uuid::new_v4().to_string();
        self.state.lock().messages.push(StoredMessage {
            message_id: message_id.clone(),
            body: body.into(),
            in_flight: None,
            receive_count: 0,
        });
        message_id
    }

    /// Make every in-flight message visible again.
    pub fn expire_visibility(&self) {
        let mut state = self.state.lock();
        for message in state.messages.iter_mut() {
            message.in_flight = None;
        }
    }

    pub fn fail_receives(&self, fail: bool) {
        self.state.lock().fail_receives = fail;
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.state.lock().fail_deletes = fail;
    }

    /// Messages not yet deleted, visible or in-flight.
    pub fn len(&self) -> usize {
        self.state.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight(&self) -> usize {
        self.state
            .lock()
            .messages
            .iter()
            .filter(|m| m.in_flight.is_some())
            .count()
    }

    /// Total messages removed by `delete`.
    pub fn deleted(&self) -> usize {
        self.state.lock().deleted
    }

    /// Bodies of every message still in the queue, in order.
    pub fn bodies(&self) -> Vec<String> {
        self.state
            .lock()
            .messages
            .iter()
            .map(|m| m.body.clone())
            .collect()
    }

    pub fn receive_count(&self, message_id: &str) -> Option<u32> {
        self.state
            .lock()
            .messages
            .iter()
            .find(|m| m.message_id == message_id)
            .map(|m| m.receive_count)
    }
}

impl MessageSource for InMemoryQueue {
    fn receive(
        &mut self,
        max_count: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, SourceError> {
        let mut state = self.state.lock();
        if state.fail_receives {
            return Err(SourceError::Receive("queue unavailable".to_string()));
        }

        let batch: Vec<QueueMessage> = state
            .messages
            .iter_mut()
            .filter(|m| m.in_flight.is_none())
            .take(max_count)
            .map(|m| {
                let handle = ReceiptHandle::new(Uuid::new_v4().to_string());
                m.in_flight = Some(handle.clone());
                m.receive_count += 1;
                QueueMessage {
                    message_id: m.message_id.clone(),
                    body: m.body.clone(),
                    receipt_handle: handle,
                }
            })
            .collect();

        // Nothing arrives while the lock is held, so an empty queue returns
        // immediately instead of sleeping out the long-poll window.
        if batch.is_empty() {
            log::debug!("QUEUE_EMPTY wait={:?}", wait);
        }

        Ok(batch)
    }

    fn delete(&mut self, handle: &ReceiptHandle) -> Result<(), SourceError> {
        let mut state = self.state.lock();
        if state.fail_deletes {
            return Err(SourceError::Delete("queue unavailable".to_string()));
        }

        let position = state
            .messages
            .iter()
            .position(|m| m.in_flight.as_ref() == Some(handle))
            .ok_or_else(|| SourceError::UnknownHandle(handle.clone()))?;

        state.messages.remove(position);
        state.deleted += 1;
        Ok(())
    }
}
