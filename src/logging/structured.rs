//! Structured logging utilities.
//!
//! Provides context-aware logging with cycle_id and message_id included
//! in every log message.

use std::fmt;

/// Logging context for one processing cycle.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub cycle_id: String,
    pub message_id: Option<String>,
}

impl LogContext {
    pub fn new(cycle_id: &str) -> Self {
        Self {
            cycle_id: cycle_id.to_string(),
            message_id: None,
        }
    }

    pub fn with_message(&self, message_id: &str) -> Self {
        Self {
            cycle_id: self.cycle_id.clone(),
            message_id: Some(message_id.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message_id {
            Some(mid) => write!(f, "[cycle={}] [msg={}]", self.cycle_id, mid),
            None => write!(f, "[cycle={}]", self.cycle_id),
        }
    }
}

/// Initialize the process-wide logger at the given level.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logger(level: &str) {
    let filter = level.parse().unwrap_or(log::LevelFilter::Info);
    let _ = env_logger::builder()
        .filter_level(filter)
        .format_timestamp_millis()
        .try_init();
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::warn!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_context_display() {
        let ctx = LogContext::new("cycle-123");
        assert_eq!(format!("{}", ctx), "[cycle=cycle-123]");

        let ctx_with_message = ctx.with_message("msg-456");
        assert_eq!(
            format!("{}", ctx_with_message),
            "[cycle=cycle-123] [msg=msg-456]"
        );
    }

    #[test]
    fn test_init_logger_twice() {
        init_logger("debug");
        init_logger("not-a-level");
    }
}
