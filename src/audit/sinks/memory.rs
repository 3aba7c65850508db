//! In-memory sink.
//!
//! Keeps records in write order for the life of the process.

use crate::audit::filter::RecordFilter;
use crate::audit::record::{AuditRecord, RecordId};
use crate::audit::sink::{AuditSink, SinkKind};
use crate::core::SinkError;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Sink storing records in process memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: RwLock<Vec<AuditRecord>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record, in write order.
    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.read().await.clone()
    }

    /// Read a record by ID.
    pub async fn get(&self, id: &RecordId) -> Option<AuditRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| &r.id == id)
            .cloned()
    }

    /// Records matching a filter.
    pub async fn query(&self, filter: &RecordFilter) -> Vec<AuditRecord> {
        filter.apply(self.records.read().await.iter())
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn put(&self, record: &AuditRecord) -> Result<(), SinkError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Memory
    }

    async fn count(&self) -> Result<u64, SinkError> {
        Ok(self.records.read().await.len() as u64)
    }
}
