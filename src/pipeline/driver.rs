//! Main processing cycle.
//!
//! Coordinates one pass over the queue:
//! 1. Receive a bounded batch (long-poll when empty)
//! 2. Transform each message body
//! 3. Write the record to the sink, one transaction per record
//! 4. Acknowledge (delete) only messages whose row was written
//!
//! Failures are isolated per message and never abort the batch. There is no
//! retry loop here: a retained message comes back through the source's
//! visibility timeout, and a crash between write and delete yields a
//! duplicate row on redelivery.

use std::time::Instant;

use anyhow::Result;

use crate::config::PipelineConfig;
use crate::logging::structured::LogContext;
use crate::queue::source::{MessageSource, QueueMessage};
use crate::security::pii::redact_body;
use crate::storage::sink::RowSink;
use crate::transform::error::FailureKind;
use crate::transform::record::transform_message;

use super::context::CycleContext;
use super::disposition::{Disposition, MessageFailure};

/// Result of processing a single message.
#[derive(Debug, Clone)]
pub struct MessageOutcome {
    pub message_id: String,
    pub disposition: Disposition,
    pub committed: bool,
    pub acknowledged: bool,
    pub error: Option<String>,
}

/// Result of one cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub cycle_id: String,
    pub receive_failed: bool,
    pub received: usize,
    pub committed: usize,
    pub acknowledged: usize,
    pub rejected: usize,
    pub sink_failures: usize,
    pub ack_failures: usize,
    pub outcomes: Vec<MessageOutcome>,
}

impl CycleReport {
    fn new(ctx: &CycleContext) -> Self {
        Self {
            cycle_id: ctx.cycle_id.clone(),
            ..Default::default()
        }
    }

    fn record(&mut self, outcome: MessageOutcome) {
        if outcome.committed {
            self.committed += 1;
            if outcome.acknowledged {
                self.acknowledged += 1;
            } else {
                self.ack_failures += 1;
            }
        } else if outcome.disposition == Disposition::Retain(FailureKind::SinkWriteFailure) {
            self.sink_failures += 1;
        } else {
            self.rejected += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Messages left in the source after this cycle.
    pub fn retained(&self) -> usize {
        self.received - self.acknowledged
    }
}

/// Run one processing cycle against the given source and sink.
pub fn run_cycle<S, K>(
    ctx: &CycleContext,
    config: &PipelineConfig,
    source: &mut S,
    sink: &mut K,
) -> CycleReport
where
    S: MessageSource + ?Sized,
    K: RowSink + ?Sized,
{
    let log_ctx = ctx.log_context();
    let mut report = CycleReport::new(ctx);

    let messages = match source.receive(config.batch_size, config.wait_time()) {
        Ok(messages) => messages,
        Err(e) => {
            log::error!("{} RECEIVE_FAILED error={}", log_ctx, e);
            report.receive_failed = true;
            return report;
        }
    };

    if messages.is_empty() {
        log::debug!("{} CYCLE_IDLE", log_ctx);
        return report;
    }

    report.received = messages.len();
    log::info!("{} CYCLE_START received={}", log_ctx, messages.len());

    for message in &messages {
        let outcome = process_single_message(ctx, config, message, source, sink);
        report.record(outcome);
    }

    log::info!(
        "{} CYCLE_COMPLETE received={} committed={} acknowledged={} rejected={} sink_failures={} ack_failures={}",
        log_ctx,
        report.received,
        report.committed,
        report.acknowledged,
        report.rejected,
        report.sink_failures,
        report.ack_failures
    );

    report
}

/// Process a single message: transform, write, then acknowledge.
fn process_single_message<S, K>(
    ctx: &CycleContext,
    config: &PipelineConfig,
    message: &QueueMessage,
    source: &mut S,
    sink: &mut K,
) -> MessageOutcome
where
    S: MessageSource + ?Sized,
    K: RowSink + ?Sized,
{
    let log_ctx = ctx.message_context(&message.message_id);
    let result = write_message(&message.body, config, sink, &log_ctx);
    let disposition = Disposition::decide(&result);

    if let Err(failure) = result {
        match &failure {
            MessageFailure::Transform(e) => {
                // Kind and field are on the TRANSFORM_FAILED line.
                log::info!(
                    "{} MESSAGE_REJECTED retryable={} body={}",
                    log_ctx,
                    e.is_retryable(),
                    redact_body(&message.body)
                );
            }
            MessageFailure::Sink(e) => {
                log::error!(
                    "{} SINK_WRITE_FAILED retryable={} error={}",
                    log_ctx,
                    e.is_retryable(),
                    e
                );
            }
        }

        return MessageOutcome {
            message_id: message.message_id.clone(),
            disposition,
            committed: false,
            acknowledged: false,
            error: Some(failure.to_string()),
        };
    }

    match source.delete(&message.receipt_handle) {
        Ok(()) => {
            log::debug!("{} MESSAGE_ACKNOWLEDGED", log_ctx);
            MessageOutcome {
                message_id: message.message_id.clone(),
                disposition,
                committed: true,
                acknowledged: true,
                error: None,
            }
        }
        Err(e) => {
            // The row is durable; redelivery will write it again.
            log::error!(
                "{} ACK_FAILED error={} duplicate_on_redelivery=true",
                log_ctx,
                e
            );
            MessageOutcome {
                message_id: message.message_id.clone(),
                disposition,
                committed: true,
                acknowledged: false,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Transform a body and write its record.
fn write_message<K>(
    body: &str,
    config: &PipelineConfig,
    sink: &mut K,
    log_ctx: &LogContext,
) -> Result<(), MessageFailure>
where
    K: RowSink + ?Sized,
{
    let record = transform_message(body, log_ctx)?;

    let started = Instant::now();
    let written = sink.insert(&record);
    let elapsed = started.elapsed();

    if elapsed > config.sink_write_timeout() {
        log::warn!(
            "{} SINK_WRITE_SLOW elapsed_ms={} timeout_ms={}",
            log_ctx,
            elapsed.as_millis(),
            config.sink_write_timeout().as_millis()
        );
    }

    written?;
    log::info!(
        "{} ROW_COMMITTED user_id={} app_version={}",
        log_ctx,
        record.user_id,
        record.app_version
    );
    Ok(())
}

/// A configured pipeline owning its source and sink.
///
/// Cycles run one after another through `&mut self`, so the sink
/// connection is never shared between overlapping cycles.
pub struct Pipeline<S, K> {
    config: PipelineConfig,
    source: S,
    sink: K,
}

impl<S: MessageSource, K: RowSink> Pipeline<S, K> {
    pub fn new(config: PipelineConfig, source: S, sink: K) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            sink,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }

    /// Run a single cycle with a fresh context.
    pub fn run_once(&mut self) -> CycleReport {
        let ctx = CycleContext::new();
        run_cycle(&ctx, &self.config, &mut self.source, &mut self.sink)
    }

    /// Run cycles until one receives nothing, at most `max_cycles` times.
    pub fn run_until_idle(&mut self, max_cycles: usize) -> Vec<CycleReport> {
        let mut reports = Vec::new();
        for _ in 0..max_cycles {
            let report = self.run_once();
            let idle = report.received == 0;
            reports.push(report);
            if idle {
                break;
            }
        }
        reports
    }
}
