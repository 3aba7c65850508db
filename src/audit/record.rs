//! Audit record structure.
//!
//! The durable entity written for every change. A record is either an
//! insert or an update; the variant is fixed when the record is built.

use crate::core::{format_timestamp, Hash256, Timestamp};
use crate::stream::attribute::{AttributeValue, Number};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique record identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Create a record ID.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Get the ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Record classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Item did not exist before
    Insert,
    /// Item existed and its tracked value was rewritten
    Update,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Insert => write!(f, "insert"),
            RecordKind::Update => write!(f, "update"),
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "insert" => Ok(RecordKind::Insert),
            "update" => Ok(RecordKind::Update),
            other => Err(format!("unknown record kind '{}'", other)),
        }
    }
}

/// Full state of a newly inserted item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    /// Item key
    pub key: String,
    /// Tracked value
    pub value: Number,
}

/// Variant-specific payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Change {
    /// The item was created.
    #[serde(rename_all = "camelCase")]
    Insert {
        /// The whole new item
        new_value: ItemSnapshot,
    },
    /// The tracked value changed.
    #[serde(rename_all = "camelCase")]
    Update {
        /// Name of the changed attribute
        updated_attribute: String,
        /// Value before
        old_value: Number,
        /// Value after
        new_value: Number,
    },
}

/// An audit record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Unique record ID
    pub id: RecordId,
    /// Key of the changed item
    pub item_key: String,
    /// When the record was captured
    pub modification_time: Timestamp,
    /// What changed
    #[serde(flatten)]
    pub change: Change,
}

impl AuditRecord {
    /// Record classification.
    pub fn kind(&self) -> RecordKind {
        match self.change {
            Change::Insert { .. } => RecordKind::Insert,
            Change::Update { .. } => RecordKind::Update,
        }
    }

    /// Value before the change; `None` for inserts.
    pub fn old_value(&self) -> Option<&Number> {
        match &self.change {
            Change::Insert { .. } => None,
            Change::Update { old_value, .. } => Some(old_value),
        }
    }

    /// Value after the change.
    pub fn new_value(&self) -> &Number {
        match &self.change {
            Change::Insert { new_value } => &new_value.value,
            Change::Update { new_value, .. } => new_value,
        }
    }

    /// Attribute map in the destination table's layout.
    ///
    /// Updates carry `updatedAttribute`, `oldValue` and `newValue` as flat
    /// attributes; inserts nest the whole item under `newValue`.
    pub fn to_item(&self) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert("id".to_string(), AttributeValue::s(self.id.as_str()));
        item.insert("itemKey".to_string(), AttributeValue::s(&self.item_key));
        item.insert(
            "modificationTime".to_string(),
            AttributeValue::s(format_timestamp(&self.modification_time)),
        );

        match &self.change {
            Change::Update {
                updated_attribute,
                old_value,
                new_value,
            } => {
                item.insert(
                    "updatedAttribute".to_string(),
                    AttributeValue::s(updated_attribute),
                );
                item.insert("oldValue".to_string(), AttributeValue::N(old_value.clone()));
                item.insert("newValue".to_string(), AttributeValue::N(new_value.clone()));
            }
            Change::Insert { new_value } => {
                let nested = HashMap::from([
                    ("key".to_string(), AttributeValue::s(&new_value.key)),
                    ("value".to_string(), AttributeValue::N(new_value.value.clone())),
                ]);
                item.insert("newValue".to_string(), AttributeValue::M(nested));
            }
        }

        item
    }

    /// Content hash over the serialized record.
    pub fn checksum(&self) -> crate::core::Result<Hash256> {
        let bytes = serde_json::to_vec(self)?;
        Ok(Hash256::digest(&[&bytes]))
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> crate::core::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> crate::core::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
