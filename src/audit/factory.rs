//! Sink factory.
//!
//! Creates audit sinks based on configuration.

use crate::audit::config::SinkConfig;
use crate::audit::sink::{AuditSink, SinkKind};
use crate::audit::sinks::{FileSink, LogSink, MemorySink, MirrorSink};
use crate::core::{ConfigError, Result};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Create an audit sink from configuration.
///
/// Returns BoxFuture to handle recursion with MirrorSink.
pub fn create_audit_sink(config: &SinkConfig) -> BoxFuture<'_, Result<Arc<dyn AuditSink>>> {
    Box::pin(async move {
        config.validate()?;
        match config.kind {
            SinkKind::Memory => Ok(Arc::new(MemorySink::new()) as Arc<dyn AuditSink>),
            SinkKind::Log => Ok(Arc::new(LogSink::new(&config.destination)) as Arc<dyn AuditSink>),
            SinkKind::File => {
                let sink = FileSink::open(&config.file.dir, &config.destination).await?;
                Ok(Arc::new(sink) as Arc<dyn AuditSink>)
            }
            SinkKind::DynamoDb => create_dynamodb_sink(config).await,
            SinkKind::Mirror => {
                let mirror = config.mirror.ok_or(ConfigError::Invalid {
                    key: "AUDIT_SINK",
                    value: SinkKind::Mirror.to_string(),
                    reason: "mirror needs a primary and a secondary sink".to_string(),
                })?;
                let primary =
                    create_sub_sink(mirror.primary, "AUDIT_MIRROR_PRIMARY", config).await?;
                let secondary =
                    create_sub_sink(mirror.secondary, "AUDIT_MIRROR_SECONDARY", config).await?;
                Ok(Arc::new(MirrorSink::new(primary, secondary)) as Arc<dyn AuditSink>)
            }
        }
    })
}

async fn create_sub_sink(
    kind: SinkKind,
    key: &'static str,
    config: &SinkConfig,
) -> Result<Arc<dyn AuditSink>> {
    if kind == SinkKind::Mirror {
        return Err(ConfigError::Invalid {
            key,
            value: kind.to_string(),
            reason: "mirror sinks cannot be nested".to_string(),
        }
        .into());
    }

    let mut sub_config = config.clone();
    sub_config.kind = kind;
    sub_config.mirror = None;
    create_audit_sink(&sub_config).await
}

#[cfg(feature = "dynamodb")]
async fn create_dynamodb_sink(config: &SinkConfig) -> Result<Arc<dyn AuditSink>> {
    let sink =
        crate::audit::sinks::DynamoDbSink::connect(&config.region, &config.destination).await;
    Ok(Arc::new(sink))
}

#[cfg(not(feature = "dynamodb"))]
async fn create_dynamodb_sink(_config: &SinkConfig) -> Result<Arc<dyn AuditSink>> {
    Err(ConfigError::Unsupported(SinkKind::DynamoDb.to_string()).into())
}
