//! Sink that emits records as structured `tracing` events.

use crate::audit::record::{AuditRecord, Change};
use crate::audit::sink::{AuditSink, SinkKind};
use crate::core::{format_timestamp, SinkError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Audit sink logging every record at INFO with `event_type = "audit"`.
#[derive(Debug, Default)]
pub struct LogSink {
    destination: String,
    written: AtomicU64,
}

impl LogSink {
    /// Create a log sink labelled with a destination name.
    pub fn new(destination: &str) -> Self {
        Self {
            destination: destination.to_string(),
            written: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl AuditSink for LogSink {
    async fn put(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let payload = serde_json::to_string(&record.change)?;
        let old_value = match &record.change {
            Change::Update { old_value, .. } => Some(old_value.as_str()),
            Change::Insert { .. } => None,
        };

        tracing::info!(
            event_type = "audit",
            destination = %self.destination,
            id = %record.id,
            item_key = %record.item_key,
            modification_time = %format_timestamp(&record.modification_time),
            kind = %record.kind(),
            old_value = old_value,
            change = %payload,
            "audit"
        );

        self.written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Log
    }

    async fn count(&self) -> Result<u64, SinkError> {
        Ok(self.written.load(Ordering::Relaxed))
    }
}
