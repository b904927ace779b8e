//! End-to-end cycles over the in-memory queue and sink.

use login_etl::pipeline::{run_cycle, CycleContext, Disposition};
use login_etl::queue::InMemoryQueue;
use std::io::Cursor;
use std::time::Duration;

use login_etl::storage::{InMemorySink, SqlExecutor, SqlRowSink, SqlValue};
use login_etl::{mask_value, FailureKind, PipelineConfig, RowReader, SinkError};

const VALID: &str = r#"{"user_id": "424cdd21-063a-43a7-b91b-7ca1a833afae", "app_version": "2.3.0", "device_type": "android", "ip": "199.172.111.135", "locale": "RU", "device_id": "593-47-5928", "create_date": "2024-03-15"}"#;
const MISSING_DEVICE_ID: &str = r#"{"user_id": "c0173198-76a8-4e67-bfc2-74eaa3bbff57", "app_version": "0.2.6", "device_type": "ios", "ip": "241.6.88.151", "locale": "PH"}"#;
const MALFORMED: &str = r#"{"user_id": "66e0635b-ce36-4ec7-aa9e-8a8fca9b83d4", "ip": "#;

fn three_message_queue() -> (InMemoryQueue, String, String, String) {
    let queue = InMemoryQueue::new();
    let valid = queue.send(VALID);
    let missing = queue.send(MISSING_DEVICE_ID);
    let malformed = queue.send(MALFORMED);
    (queue, valid, missing, malformed)
}

#[test]
fn test_mixed_batch_commits_only_valid_message() {
    let (mut queue, valid_id, missing_id, malformed_id) = three_message_queue();
    let mut sink = InMemorySink::new();
    let config = PipelineConfig::default();

    let report = run_cycle(&CycleContext::new(), &config, &mut queue, &mut sink);

    assert_eq!(report.received, 3);
    assert_eq!(report.committed, 1);
    assert_eq!(report.acknowledged, 1);
    assert_eq!(report.rejected, 2);
    assert_eq!(queue.deleted(), 1);

    // Messages 2 and 3 are still in the source.
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.bodies(), vec![MISSING_DEVICE_ID.to_string(), MALFORMED.to_string()]);

    let by_id = |id: &str| {
        report
            .outcomes
            .iter()
            .find(|o| o.message_id == id)
            .map(|o| o.disposition)
    };
    assert_eq!(by_id(valid_id.as_str()), Some(Disposition::Acknowledge));
    assert_eq!(by_id(missing_id.as_str()), Some(Disposition::Retain(FailureKind::MissingField)));
    assert_eq!(by_id(malformed_id.as_str()), Some(Disposition::Retain(FailureKind::MalformedPayload)));

    let rows = sink.list_committed().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, "424cdd21-063a-43a7-b91b-7ca1a833afae");
    assert_eq!(rows[0].masked_ip, mask_value("199.172.111.135"));
    assert_eq!(rows[0].masked_device_id, mask_value("593-47-5928"));
    assert_eq!(rows[0].app_version, 2);
}

#[test]
fn test_rejected_messages_come_back_after_visibility_timeout() {
    let (mut queue, _, missing_id, _) = three_message_queue();
    let mut sink = InMemorySink::new();
    let config = PipelineConfig::default();

    run_cycle(&CycleContext::new(), &config, &mut queue, &mut sink);

    // Still in-flight: nothing to receive until the timeout runs out.
    let idle = run_cycle(&CycleContext::new(), &config, &mut queue, &mut sink);
    assert_eq!(idle.received, 0);

    queue.expire_visibility();
    let retry = run_cycle(&CycleContext::new(), &config, &mut queue, &mut sink);
    assert_eq!(retry.received, 2);
    assert_eq!(retry.committed, 0);
    assert_eq!(queue.receive_count(&missing_id), Some(2));
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_redelivery_after_failed_delete_duplicates_row() {
    let mut queue = InMemoryQueue::new();
    let mut sink = InMemorySink::new();
    let config = PipelineConfig::default();
    queue.send(VALID);

    // Write succeeds, delete does not: same as a crash between the two.
    queue.fail_deletes(true);
    let first = run_cycle(&CycleContext::new(), &config, &mut queue, &mut sink);
    assert_eq!(first.committed, 1);
    assert_eq!(first.ack_failures, 1);
    assert_eq!(queue.len(), 1);

    queue.fail_deletes(false);
    queue.expire_visibility();
    let second = run_cycle(&CycleContext::new(), &config, &mut queue, &mut sink);
    assert_eq!(second.acknowledged, 1);
    assert!(queue.is_empty());

    let rows = sink.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], rows[1]);
}

#[test]
fn test_sink_outage_retains_then_recovers() {
    let mut queue = InMemoryQueue::new();
    let mut sink = InMemorySink::new();
    let config = PipelineConfig::default();
    queue.send(VALID);
    queue.send(VALID);

    sink.fail_writes(true);
    let down = run_cycle(&CycleContext::new(), &config, &mut queue, &mut sink);
    assert_eq!(down.sink_failures, 2);
    assert_eq!(down.acknowledged, 0);
    assert_eq!(queue.len(), 2);

    sink.fail_writes(false);
    queue.expire_visibility();
    let up = run_cycle(&CycleContext::new(), &config, &mut queue, &mut sink);
    assert_eq!(up.acknowledged, 2);
    assert!(queue.is_empty());
    assert_eq!(sink.len(), 2);
}

#[test]
fn test_run_pipeline_drains_queue() {
    let queue = InMemoryQueue::new();
    for _ in 0..12 {
        queue.send(VALID);
    }
    queue.send(MALFORMED);
    let sink = InMemorySink::new();

    let reports =
        login_etl::run_pipeline(PipelineConfig::default(), queue.clone(), sink.clone(), 5)
            .unwrap();

    assert_eq!(reports.len(), 3);
    assert_eq!(sink.len(), 12);
    assert_eq!(queue.len(), 1);
}

/// A database that cancels every statement at its timeout.
struct UnresponsiveDatabase {
    timeouts_seen: Vec<Duration>,
}

impl SqlExecutor for UnresponsiveDatabase {
    fn execute(
        &mut self,
        _sql: &str,
        _params: &[SqlValue],
        timeout: Duration,
    ) -> Result<u64, SinkError> {
        self.timeouts_seen.push(timeout);
        Err(SinkError::Timeout(timeout))
    }

    fn query(&self, sql: &str) -> Result<Vec<Vec<SqlValue>>, SinkError> {
        Err(SinkError::Query(format!("connection lost running {}", sql)))
    }
}

#[test]
fn test_sql_write_timeout_retains_message() {
    let mut queue = InMemoryQueue::new();
    queue.send(VALID);
    let config = PipelineConfig {
        sink_write_timeout_secs: 2,
        ..Default::default()
    };
    let mut sink = SqlRowSink::from_config(
        UnresponsiveDatabase {
            timeouts_seen: Vec::new(),
        },
        &config,
    );

    let report = run_cycle(&CycleContext::new(), &config, &mut queue, &mut sink);

    assert_eq!(report.sink_failures, 1);
    assert_eq!(report.acknowledged, 0);
    assert_eq!(
        report.outcomes[0].disposition,
        Disposition::Retain(FailureKind::SinkWriteFailure)
    );
    assert_eq!(queue.len(), 1);
    assert_eq!(sink.executor().timeouts_seen, vec![Duration::from_secs(2)]);

    let err = sink.list_committed().unwrap_err();
    assert!(matches!(err, SinkError::Query(_)));
    assert!(err.is_retryable());
}

#[test]
fn test_viewer_shows_empty_listing_when_query_fails() {
    let mut queue = InMemoryQueue::new();
    let config = PipelineConfig::default();
    let sink = SqlRowSink::from_config(
        UnresponsiveDatabase {
            timeouts_seen: Vec::new(),
        },
        &config,
    );

    let mut input = Cursor::new("2\n3\n");
    let mut output = Vec::new();
    login_etl::viewer::run_menu(&mut input, &mut output, &mut queue, &sink, &config).unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("Transformed Data:\nChoose data to display:"));
}
