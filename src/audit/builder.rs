//! Audit record construction.

use crate::audit::record::{AuditRecord, Change, ItemSnapshot, RecordId};
use crate::core::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::stream::{ChangeEvent, ItemSchema};
use std::sync::Arc;

/// Shapes change events into audit records.
///
/// Identity and capture time come from the injected capabilities; building
/// never fails.
#[derive(Clone)]
pub struct AuditRecordBuilder {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    schema: ItemSchema,
}

impl AuditRecordBuilder {
    /// Create a builder.
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>, schema: ItemSchema) -> Self {
        Self { ids, clock, schema }
    }

    /// Builder with random ids, the wall clock and the default schema.
    pub fn system() -> Self {
        Self::new(
            Arc::new(UuidGenerator),
            Arc::new(SystemClock),
            ItemSchema::default(),
        )
    }

    /// Build the record for one change event.
    pub fn build(&self, event: &ChangeEvent) -> AuditRecord {
        let change = match &event.previous_value {
            Some(old_value) => Change::Update {
                updated_attribute: self.schema.value_attribute.clone(),
                old_value: old_value.clone(),
                new_value: event.new_value.clone(),
            },
            None => Change::Insert {
                new_value: ItemSnapshot {
                    key: event.item_key.clone(),
                    value: event.new_value.clone(),
                },
            },
        };

        AuditRecord {
            id: RecordId(self.ids.next_id()),
            item_key: event.item_key.clone(),
            modification_time: self.clock.now(),
            change,
        }
    }
}

impl std::fmt::Debug for AuditRecordBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditRecordBuilder")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
