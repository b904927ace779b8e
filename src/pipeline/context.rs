//! Pipeline context management.
//!
//! Provides cycle and message context for logging and state tracking.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;

/// Context for one processing cycle.
#[derive(Debug, Clone)]
pub struct CycleContext {
    pub cycle_id: String,
    pub started_at: DateTime<Utc>,
}

impl CycleContext {
    pub fn new() -> Self {
        Self {
            cycle_id: format!("cycle-{}", &Uuid::new_v4().to_string()[..8]),
            started_at: Utc::now(),
        }
    }

    /// Context with a caller-chosen id, for tests and replays.
    pub fn with_id(cycle_id: &str) -> Self {
        Self {
            cycle_id: cycle_id.to_string(),
            started_at: Utc::now(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.cycle_id)
    }

    /// Log context for one message within this cycle.
    pub fn message_context(&self, message_id: &str) -> LogContext {
        self.log_context().with_message(message_id)
    }
}

impl Default for CycleContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_short_and_unique() {
        let a = CycleContext::new();
        let b = CycleContext::new();
        assert!(a.cycle_id.starts_with("cycle-"));
        assert_eq!(a.cycle_id.len(), "cycle-".len() + 8);
        assert_ne!(a.cycle_id, b.cycle_id);
    }

    #[test]
    fn test_message_context() {
        let ctx = CycleContext::with_id("cycle-1");
        assert_eq!(
            ctx.message_context("m-9").to_string(),
            "[cycle=cycle-1] [msg=m-9]"
        );
    }
}
