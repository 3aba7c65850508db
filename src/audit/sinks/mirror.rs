//! Mirror sink.
//!
//! Combines two sinks:
//! - Primary: written first
//! - Secondary: written only after the primary accepted the record

use crate::audit::record::AuditRecord;
use crate::audit::sink::{AuditSink, SinkKind};
use crate::core::SinkError;
use async_trait::async_trait;
use std::sync::Arc;

/// Sink writing every record to two destinations in turn.
pub struct MirrorSink {
    primary: Arc<dyn AuditSink>,
    secondary: Arc<dyn AuditSink>,
}

impl MirrorSink {
    /// Create a mirror over two sinks.
    pub fn new(primary: Arc<dyn AuditSink>, secondary: Arc<dyn AuditSink>) -> Self {
        Self { primary, secondary }
    }

    /// The sink written first.
    pub fn primary(&self) -> &Arc<dyn AuditSink> {
        &self.primary
    }

    /// The sink written second.
    pub fn secondary(&self) -> &Arc<dyn AuditSink> {
        &self.secondary
    }
}

#[async_trait]
impl AuditSink for MirrorSink {
    async fn put(&self, record: &AuditRecord) -> Result<(), SinkError> {
        self.primary.put(record).await?;
        // A secondary failure fails the put even though the primary holds
        // the record; redelivery then writes a second primary copy.
        self.secondary.put(record).await
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Mirror
    }

    async fn health_check(&self) -> Result<bool, SinkError> {
        Ok(self.primary.health_check().await? && self.secondary.health_check().await?)
    }

    async fn count(&self) -> Result<u64, SinkError> {
        self.primary.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::builder::AuditRecordBuilder;
    use crate::audit::sinks::MemorySink;
    use crate::stream::ChangeEvent;

    struct RejectingSink;

    #[async_trait]
    impl AuditSink for RejectingSink {
        async fn put(&self, _record: &AuditRecord) -> Result<(), SinkError> {
            Err(SinkError::Rejected("read-only".to_string()))
        }

        fn kind(&self) -> SinkKind {
            SinkKind::Memory
        }
    }

    #[tokio::test]
    async fn test_writes_both() {
        let primary = Arc::new(MemorySink::new());
        let secondary = Arc::new(MemorySink::new());
        let mirror = MirrorSink::new(primary.clone(), secondary.clone());

        let record = AuditRecordBuilder::system().build(&ChangeEvent::insert("xyz", 1));
        mirror.put(&record).await.unwrap();

        assert_eq!(primary.records().await, vec![record.clone()]);
        assert_eq!(secondary.records().await, vec![record]);
        assert_eq!(mirror.kind(), SinkKind::Mirror);
        assert!(mirror.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_primary_failure_skips_secondary() {
        let secondary = Arc::new(MemorySink::new());
        let mirror = MirrorSink::new(Arc::new(RejectingSink), secondary.clone());

        let record = AuditRecordBuilder::system().build(&ChangeEvent::insert("xyz", 1));
        assert!(mirror.put(&record).await.is_err());
        assert_eq!(secondary.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_secondary_failure_fails_put() {
        let primary = Arc::new(MemorySink::new());
        let mirror = MirrorSink::new(primary.clone(), Arc::new(RejectingSink));

        let record = AuditRecordBuilder::system().build(&ChangeEvent::insert("xyz", 1));
        assert!(matches!(mirror.put(&record).await, Err(SinkError::Rejected(_))));
        assert_eq!(primary.count().await.unwrap(), 1);
    }
}
