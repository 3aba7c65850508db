//! Identity and time sources.
//!
//! Record builders take these as capabilities instead of reaching for the
//! ambient clock or RNG, so each invocation owns its own instances and tests
//! can substitute deterministic ones.

use crate::core::types::{now, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of fresh record identifiers.
pub trait IdGenerator: Send + Sync {
    /// Produce a new identifier. Never returns the same value twice.
    fn next_id(&self) -> String;
}

/// Random UUID v4 identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic `prefix-N` identifiers.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    /// Create a generator starting at 1.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}

/// Source of the capture instant.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        now()
    }
}

/// Clock frozen at one instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_ids_are_distinct() {
        let ids = UuidGenerator;
        let generated: HashSet<String> = (0..500).map(|_| ids.next_id()).collect();
        assert_eq!(generated.len(), 500);
    }

    #[test]
    fn test_uuid_is_v4_text() {
        let id = UuidGenerator.next_id();
        let parsed = uuid::Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new("rec");
        assert_eq!(ids.next_id(), "rec-1");
        assert_eq!(ids.next_id(), "rec-2");
    }

    #[test]
    fn test_fixed_clock() {
        let at = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), at);
    }
}
