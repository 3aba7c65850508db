//! Query filters for audit records.

use crate::audit::record::{AuditRecord, RecordKind};
use crate::core::Timestamp;
use serde::{Deserialize, Serialize};

/// Filter for querying stored audit records.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Filter by item key
    pub item_key: Option<String>,
    /// Filter by variant
    pub kind: Option<RecordKind>,
    /// Filter by modification time from (inclusive)
    pub date_from: Option<Timestamp>,
    /// Filter by modification time to (inclusive)
    pub date_to: Option<Timestamp>,
    /// Maximum results
    pub limit: Option<usize>,
}

impl RecordFilter {
    /// Create a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by item key.
    pub fn by_item_key(mut self, item_key: &str) -> Self {
        self.item_key = Some(item_key.to_string());
        self
    }

    /// Filter by variant.
    pub fn by_kind(mut self, kind: RecordKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Filter by date range.
    pub fn by_date_range(mut self, from: Timestamp, to: Timestamp) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    /// Set result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check if a record matches this filter. The limit is not considered.
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(item_key) = &self.item_key {
            if &record.item_key != item_key {
                return false;
            }
        }

        if let Some(kind) = self.kind {
            if record.kind() != kind {
                return false;
            }
        }

        if let Some(from) = self.date_from {
            if record.modification_time < from {
                return false;
            }
        }

        if let Some(to) = self.date_to {
            if record.modification_time > to {
                return false;
            }
        }

        true
    }

    /// Apply the filter and limit to records in stored order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<AuditRecord>
    where
        I: IntoIterator<Item = &'a AuditRecord>,
    {
        records
            .into_iter()
            .filter(|r| self.matches(r))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}
