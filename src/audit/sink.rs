//! AuditSink trait definition.
//!
//! Core trait that every audit destination implements.

use crate::audit::record::{AuditRecord, RecordId};
use crate::core::SinkError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sink type identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// In-process store
    Memory,
    /// Append-only JSONL file
    File,
    /// Structured log events
    Log,
    /// DynamoDB table
    #[serde(rename = "dynamodb")]
    DynamoDb,
    /// Primary plus secondary
    Mirror,
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkKind::Memory => write!(f, "memory"),
            SinkKind::File => write!(f, "file"),
            SinkKind::Log => write!(f, "log"),
            SinkKind::DynamoDb => write!(f, "dynamodb"),
            SinkKind::Mirror => write!(f, "mirror"),
        }
    }
}

impl std::str::FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(SinkKind::Memory),
            "file" => Ok(SinkKind::File),
            "log" => Ok(SinkKind::Log),
            "dynamodb" => Ok(SinkKind::DynamoDb),
            "mirror" => Ok(SinkKind::Mirror),
            other => Err(format!("unknown sink kind '{}'", other)),
        }
    }
}

/// Result of record verification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Record ID verified
    pub record_id: RecordId,
    /// Stored checksum matches the content
    pub is_valid: bool,
    /// Verification message
    pub message: String,
}

impl VerificationResult {
    /// Create a valid result.
    pub fn valid(record_id: RecordId) -> Self {
        Self {
            record_id,
            is_valid: true,
            message: "Record verified successfully".to_string(),
        }
    }

    /// Create an invalid result.
    pub fn invalid(record_id: RecordId, message: &str) -> Self {
        Self {
            record_id,
            is_valid: false,
            message: message.to_string(),
        }
    }
}

/// Destination for audit records.
///
/// A `put` either stores the whole record or fails; callers never retry
/// through this trait.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persist one record.
    async fn put(&self, record: &AuditRecord) -> Result<(), SinkError>;

    /// Get the sink type.
    fn kind(&self) -> SinkKind;

    /// Health check for the sink.
    async fn health_check(&self) -> Result<bool, SinkError> {
        Ok(true)
    }

    /// Number of stored records (if supported).
    async fn count(&self) -> Result<u64, SinkError> {
        Ok(0)
    }
}
