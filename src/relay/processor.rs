//! Batch processing.
//!
//! Each notification runs decode, build and persist on its own. A failure
//! is recorded against that notification and the loop moves on; nothing
//! short of the deadline stops a batch early.

use crate::audit::builder::AuditRecordBuilder;
use crate::audit::factory::create_audit_sink;
use crate::audit::sink::AuditSink;
use crate::core::{Clock, IdGenerator, Result, SystemClock, UuidGenerator};
use crate::relay::config::RelayConfig;
use crate::relay::report::{BatchReport, FailureKind, RecordFailure};
use crate::stream::{ChangeEventDecoder, ItemSchema, RawRecord, StreamBatch};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, field, info, instrument, warn};

/// Turns change notification batches into persisted audit records.
pub struct AuditRelay {
    sink: Arc<dyn AuditSink>,
    decoder: ChangeEventDecoder,
    builder: AuditRecordBuilder,
}

impl AuditRelay {
    /// Create a relay with explicit capabilities.
    pub fn new(
        sink: Arc<dyn AuditSink>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        schema: ItemSchema,
    ) -> Self {
        Self {
            sink,
            decoder: ChangeEventDecoder::new(schema.clone()),
            builder: AuditRecordBuilder::new(ids, clock, schema),
        }
    }

    /// Relay with random ids and the wall clock.
    pub fn with_schema(sink: Arc<dyn AuditSink>, schema: ItemSchema) -> Self {
        Self::new(sink, Arc::new(UuidGenerator), Arc::new(SystemClock), schema)
    }

    /// Build the configured sink and a relay over it.
    pub async fn from_config(config: &RelayConfig) -> Result<Self> {
        let sink = create_audit_sink(&config.sink).await?;
        info!(
            sink = %sink.kind(),
            destination = %config.sink.destination,
            region = %config.sink.region,
            "audit sink ready"
        );
        Ok(Self::with_schema(sink, config.schema.clone()))
    }

    /// The sink records are written to.
    pub fn sink(&self) -> &Arc<dyn AuditSink> {
        &self.sink
    }

    /// Tracked attribute names.
    pub fn schema(&self) -> &ItemSchema {
        self.decoder.schema()
    }

    /// Process every notification in delivery order.
    pub async fn process_batch(&self, batch: &StreamBatch) -> BatchReport {
        self.run(batch, None).await
    }

    /// Process in delivery order until `deadline`.
    ///
    /// A write already in flight completes; no new write starts once the
    /// deadline has passed. Notifications not attempted are reported as
    /// cancelled.
    pub async fn process_batch_until(&self, batch: &StreamBatch, deadline: Instant) -> BatchReport {
        self.run(batch, Some(deadline)).await
    }

    #[instrument(
        name = "audit_batch",
        skip_all,
        fields(records = batch.len(), sink = %self.sink.kind())
    )]
    async fn run(&self, batch: &StreamBatch, deadline: Option<Instant>) -> BatchReport {
        let mut report = BatchReport::new(batch.len());
        let mut cancelled = false;

        for (index, raw) in batch.records.iter().enumerate() {
            if !cancelled && matches!(deadline, Some(d) if Instant::now() >= d) {
                warn!(
                    index,
                    remaining = batch.len() - index,
                    "deadline reached, skipping remaining records"
                );
                cancelled = true;
            }

            if cancelled {
                let failure = self.failure(
                    index,
                    raw,
                    self.decoder.key_hint(raw),
                    FailureKind::Cancelled,
                    "deadline reached before the record was persisted".to_string(),
                );
                report.record_failure(failure, redelivery_id(raw));
                continue;
            }

            report.record_attempt();
            let decoded = raw.parse().and_then(|notification| {
                debug!(
                    index,
                    event_id = ?notification.event_id,
                    event_name = ?notification.event_name,
                    "change notification received"
                );
                self.decoder.decode(&notification)
            });

            let event = match decoded {
                Ok(event) => event,
                Err(err) => {
                    let item_key = self.decoder.key_hint(raw);
                    warn!(
                        index,
                        event_id = ?raw.event_id(),
                        item_key = ?item_key,
                        error = %err,
                        "notification could not be decoded"
                    );
                    let failure =
                        self.failure(index, raw, item_key, FailureKind::Decode, err.to_string());
                    report.record_failure(failure, redelivery_id(raw));
                    continue;
                }
            };

            let record = self.builder.build(&event);
            debug!(
                index,
                id = %record.id,
                item_key = %record.item_key,
                kind = %record.kind(),
                old_value = record.old_value().map(field::display),
                new_value = %record.new_value(),
                "audit record built"
            );

            match self.sink.put(&record).await {
                Ok(()) => {
                    info!(
                        index,
                        id = %record.id,
                        item_key = %record.item_key,
                        kind = %record.kind(),
                        "audit record written"
                    );
                    report.record_success(record.id);
                }
                Err(err) => {
                    error!(
                        index,
                        id = %record.id,
                        item_key = %record.item_key,
                        error = %err,
                        "audit record write failed"
                    );
                    let failure = self.failure(
                        index,
                        raw,
                        Some(record.item_key),
                        FailureKind::Sink,
                        err.to_string(),
                    );
                    report.record_failure(failure, redelivery_id(raw));
                }
            }
        }

        let report = report.finish();
        info!(
            received = report.received,
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed_count(),
            "batch complete"
        );
        report
    }

    fn failure(
        &self,
        index: usize,
        raw: &RawRecord,
        item_key: Option<String>,
        kind: FailureKind,
        message: String,
    ) -> RecordFailure {
        RecordFailure {
            index,
            event_id: raw.event_id().map(str::to_string),
            item_key,
            kind,
            message,
        }
    }
}

fn redelivery_id(raw: &RawRecord) -> Option<String> {
    raw.sequence_number()
        .or_else(|| raw.event_id())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::record::{AuditRecord, Change};
    use crate::audit::sink::SinkKind;
    use crate::audit::sinks::MemorySink;
    use crate::core::{FixedClock, SequentialIds, SinkError};
    use crate::stream::{AttributeValue, Image, StreamRecord};
    use async_trait::async_trait;
    use chrono::TimeZone;

    fn image(key: &str, value: i64) -> Image {
        Image::from([
            ("key".to_string(), AttributeValue::s(key)),
            ("value".to_string(), AttributeValue::n(value)),
        ])
    }

    fn relay(sink: Arc<dyn AuditSink>) -> AuditRelay {
        let at = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        AuditRelay::new(
            sink,
            Arc::new(SequentialIds::new("rec")),
            Arc::new(FixedClock(at)),
            ItemSchema::default(),
        )
    }

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn put(&self, _record: &AuditRecord) -> std::result::Result<(), SinkError> {
            Err(SinkError::Unavailable("throttled".to_string()))
        }

        fn kind(&self) -> SinkKind {
            SinkKind::Memory
        }
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let sink = Arc::new(MemorySink::new());
        let report = relay(sink.clone()).process_batch(&StreamBatch::default()).await;

        assert_eq!(report.received, 0);
        assert_eq!(report.processed, 0);
        assert!(report.is_complete());
        assert_eq!(sink.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mixed_batch() {
        let sink = Arc::new(MemorySink::new());
        let batch = StreamBatch::from_records(vec![
            StreamRecord::insert(image("xyz", 42)),
            StreamRecord::modify(image("abc", 10), image("abc", 15)),
        ]);

        let report = relay(sink.clone()).process_batch(&batch).await;

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.written.len(), 2);
        let records = sink.records().await;
        assert!(matches!(records[0].change, Change::Insert { .. }));
        assert!(matches!(records[1].change, Change::Update { .. }));
        assert_eq!(records[1].id.as_str(), "rec-2");
    }

    #[tokio::test]
    async fn test_sink_failure_is_per_record() {
        let batch = StreamBatch::from_records(vec![
            StreamRecord::insert(image("a", 1)).with_sequence_number("100"),
            StreamRecord::insert(image("b", 2)).with_event_id("e-2"),
        ]);

        let report = relay(Arc::new(FailingSink)).process_batch(&batch).await;

        assert_eq!(report.status_code, 200);
        assert_eq!(report.failed_count(), 2);
        assert!(report.failures.iter().all(|f| f.kind == FailureKind::Sink));
        assert_eq!(report.failures[0].item_key.as_deref(), Some("a"));
        assert!(report.failures[0].message.contains("throttled"));

        let ids: Vec<_> = report
            .batch_item_failures
            .iter()
            .map(|f| f.item_identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["100", "e-2"]);
    }

    #[tokio::test]
    async fn test_decode_failure_names_key() {
        let sink = Arc::new(MemorySink::new());
        let bad = Image::from([
            ("key".to_string(), AttributeValue::s("abc")),
            ("value".to_string(), AttributeValue::s("NaN")),
        ]);
        let batch = StreamBatch::from_records(vec![StreamRecord::insert(bad)]);

        let report = relay(sink.clone()).process_batch(&batch).await;

        assert_eq!(report.failures[0].kind, FailureKind::Decode);
        assert_eq!(report.failures[0].item_key.as_deref(), Some("abc"));
        assert_eq!(sink.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_passed_deadline_cancels_everything() {
        let sink = Arc::new(MemorySink::new());
        let batch = StreamBatch::from_records(vec![
            StreamRecord::insert(image("a", 1)),
            StreamRecord::insert(image("b", 2)),
        ]);

        let report = relay(sink.clone())
            .process_batch_until(&batch, Instant::now())
            .await;

        assert_eq!(report.received, 2);
        assert_eq!(report.processed, 0);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failures_of(FailureKind::Cancelled).count(), 2);
        assert_eq!(report.failures[1].item_key.as_deref(), Some("b"));
        assert_eq!(sink.count().await.unwrap(), 0);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_built_record_logs_values() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let batch = StreamBatch::from_records(vec![StreamRecord::modify(
            image("abc", 10),
            image("abc", 15),
        )]);
        relay(Arc::new(MemorySink::new())).process_batch(&batch).await;

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        let built = output
            .lines()
            .find(|line| line.contains("audit record built"))
            .unwrap();
        assert!(built.contains("old_value=10"), "{}", built);
        assert!(built.contains("new_value=15"), "{}", built);
    }
}
