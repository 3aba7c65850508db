//! Batch outcome reporting.

use crate::audit::record::RecordId;
use serde::{Deserialize, Serialize};

/// Why a record was not persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The notification could not be decoded
    Decode,
    /// The sink refused or failed the write
    Sink,
    /// The deadline passed before the record was attempted
    Cancelled,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Decode => write!(f, "decode"),
            FailureKind::Sink => write!(f, "sink"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One record that did not make it to the sink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFailure {
    /// Position in the batch
    pub index: usize,
    /// Notification identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Item key, when it could be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_key: Option<String>,
    /// Failure class
    pub kind: FailureKind,
    /// Human-readable cause
    pub message: String,
}

/// Entry of the partial-batch response the host uses for redelivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemFailure {
    /// Sequence number, or the event id when there is none
    pub item_identifier: String,
}

/// Outcome of one batch.
///
/// `statusCode` is always 200: per-record failures are carried in the body,
/// never as a failed invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Invocation status
    pub status_code: u16,
    /// Summary line
    pub body: String,
    /// Notifications in the batch
    pub received: usize,
    /// Notifications attempted before the deadline
    pub processed: usize,
    /// Records persisted
    pub succeeded: usize,
    /// IDs of persisted records, in delivery order
    pub written: Vec<RecordId>,
    /// Records not persisted, in delivery order
    pub failures: Vec<RecordFailure>,
    /// Identifiers to redeliver
    pub batch_item_failures: Vec<BatchItemFailure>,
}

impl BatchReport {
    pub(crate) fn new(received: usize) -> Self {
        Self {
            status_code: 200,
            body: String::new(),
            received,
            processed: 0,
            succeeded: 0,
            written: Vec::new(),
            failures: Vec::new(),
            batch_item_failures: Vec::new(),
        }
    }

    pub(crate) fn record_attempt(&mut self) {
        self.processed += 1;
    }

    pub(crate) fn record_success(&mut self, id: RecordId) {
        self.succeeded += 1;
        self.written.push(id);
    }

    pub(crate) fn record_failure(&mut self, failure: RecordFailure, identifier: Option<String>) {
        if let Some(item_identifier) = identifier {
            self.batch_item_failures.push(BatchItemFailure { item_identifier });
        }
        self.failures.push(failure);
    }

    pub(crate) fn finish(mut self) -> Self {
        self.body = format!(
            "processed {} of {} records: {} written, {} failed",
            self.processed,
            self.received,
            self.succeeded,
            self.failures.len()
        );
        self
    }

    /// Whether every record was persisted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of records not persisted.
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Failures of one class.
    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &RecordFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }
}
