//! Change notifications as delivered by the stream.

use crate::core::{DecodeError, Result};
use crate::stream::attribute::Image;
use serde::{Deserialize, Serialize};

/// Kind of mutation the source table reported.
///
/// Carried for logging only; classification never trusts it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventName {
    /// Item created
    Insert,
    /// Item modified
    Modify,
    /// Item removed
    Remove,
    /// Anything else
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventName::Insert => write!(f, "INSERT"),
            EventName::Modify => write!(f, "MODIFY"),
            EventName::Remove => write!(f, "REMOVE"),
            EventName::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Before/after images of one item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamChange {
    /// Primary key attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Image>,
    /// State before the mutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_image: Option<Image>,
    /// State after the mutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_image: Option<Image>,
    /// Position in the shard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
    /// Approximate time the source change happened (epoch seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_creation_date_time: Option<f64>,
    /// Which images the stream carries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_view_type: Option<String>,
}

/// One change notification.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamRecord {
    /// Notification identifier
    #[serde(rename = "eventID", default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Reported mutation kind
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<EventName>,
    /// Source stream
    #[serde(rename = "eventSourceARN", default, skip_serializing_if = "Option::is_none")]
    pub event_source_arn: Option<String>,
    /// Item images
    #[serde(rename = "dynamodb", default)]
    pub change: StreamChange,
}

impl StreamRecord {
    /// Notification for a newly created item.
    pub fn insert(new_image: Image) -> Self {
        Self {
            event_name: Some(EventName::Insert),
            change: StreamChange {
                new_image: Some(new_image),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Notification for a modified item.
    pub fn modify(old_image: Image, new_image: Image) -> Self {
        Self {
            event_name: Some(EventName::Modify),
            change: StreamChange {
                old_image: Some(old_image),
                new_image: Some(new_image),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Notification for a removed item.
    pub fn remove(old_image: Image) -> Self {
        Self {
            event_name: Some(EventName::Remove),
            change: StreamChange {
                old_image: Some(old_image),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Set the notification identifier.
    pub fn with_event_id(mut self, event_id: &str) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }

    /// Set the shard sequence number.
    pub fn with_sequence_number(mut self, sequence_number: &str) -> Self {
        self.change.sequence_number = Some(sequence_number.to_string());
        self
    }
}

/// A notification exactly as received, parsed lazily.
///
/// Keeping the raw form lets one malformed notification fail on its own
/// instead of rejecting the whole batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub serde_json::Value);

impl RawRecord {
    /// Parse into a typed notification.
    pub fn parse(&self) -> std::result::Result<StreamRecord, DecodeError> {
        StreamRecord::deserialize(&self.0).map_err(|e| DecodeError::Malformed(e.to_string()))
    }

    /// Notification identifier, if present.
    pub fn event_id(&self) -> Option<&str> {
        self.0.get("eventID")?.as_str()
    }

    /// Shard sequence number, if present.
    pub fn sequence_number(&self) -> Option<&str> {
        self.0.get("dynamodb")?.get("SequenceNumber")?.as_str()
    }
}

impl From<StreamRecord> for RawRecord {
    fn from(record: StreamRecord) -> Self {
        // Plain data with string keys; serialization cannot fail.
        RawRecord(serde_json::to_value(record).unwrap_or(serde_json::Value::Null))
    }
}

/// A delivered batch of notifications, in delivery order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamBatch {
    /// Notifications
    #[serde(rename = "Records", default)]
    pub records: Vec<RawRecord>,
}

impl StreamBatch {
    /// Parse a stream event document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Batch from typed notifications.
    pub fn from_records(records: Vec<StreamRecord>) -> Self {
        Self {
            records: records.into_iter().map(RawRecord::from).collect(),
        }
    }

    /// Number of notifications.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
