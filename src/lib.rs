//! Login ETL - queue-to-database pipeline for login events
//!
//! Polls a message queue for login events, normalizes and pseudonymizes each
//! one, writes it to the `user_logins` table, and deletes the source message
//! only after the row is written. The implementation prioritizes:
//!
//! 1. **Privacy** - `ip` and `device_id` are hashed before leaving the transformer
//! 2. **Delivery** - at-least-once; a message is removed iff its row was written
//! 3. **Logging** - every decision point logged with cycle and message context
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - Cycle driver and acknowledge/retain decisions
//! - `transform` - Body-to-record mapping and the failure taxonomy
//! - `security` - Masking and log redaction
//! - `storage` - Canonical row, SQL statements, row sinks
//! - `queue` - Message source seam and an in-memory queue
//! - `viewer` - Read-only listing of raw messages and committed rows
//! - `config` - Environment-driven configuration
//! - `logging` - Structured logging with cycle context

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod queue;
pub mod security;
pub mod storage;
pub mod transform;
pub mod viewer;

pub use crate::config::PipelineConfig;
pub use logging::structured::init_logger;
pub use pipeline::driver::{run_cycle, CycleReport, MessageOutcome, Pipeline};
pub use queue::source::{MessageSource, QueueMessage, ReceiptHandle, SourceError};
pub use security::masking::mask_value;
pub use storage::models::CanonicalRecord;
pub use storage::sink::{RowReader, RowSink, SinkError};
pub use transform::error::{FailureKind, TransformError};
pub use transform::record::transform_message;

use anyhow::Result;

/// Run the pipeline until the source is drained or `max_cycles` is reached.
///
/// This is the main entry point for a deployment: it initializes logging
/// from the config, validates it, and runs cycles back to back.
pub fn run_pipeline<S, K>(
    config: PipelineConfig,
    source: S,
    sink: K,
    max_cycles: usize,
) -> Result<Vec<CycleReport>>
where
    S: MessageSource,
    K: RowSink,
{
    init_logger(&config.log_level);

    let mut pipeline = Pipeline::new(config, source, sink)?;

    log::info!(
        "PIPELINE_START queue_url={} table={} batch_size={} wait_time_secs={}",
        pipeline.config().queue_url,
        pipeline.config().table_name,
        pipeline.config().batch_size,
        pipeline.config().wait_time_secs
    );

    let reports = pipeline.run_until_idle(max_cycles);

    log::info!(
        "PIPELINE_STOP cycles={} committed={} retained={}",
        reports.len(),
        reports.iter().map(|r| r.committed).sum::<usize>(),
        reports.iter().map(|r| r.retained()).sum::<usize>()
    );

    Ok(reports)
}
