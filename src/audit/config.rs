//! Audit sink configuration.
//!
//! Configuration-driven sink selection.

use crate::audit::sink::SinkKind;
use crate::core::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sink configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink type to use
    pub kind: SinkKind,
    /// Region the destination lives in
    pub region: String,
    /// Destination identifier (table name, file stem, log label)
    pub destination: String,
    /// File-specific config
    pub file: FileSinkConfig,
    /// Mirror-specific config
    pub mirror: Option<MirrorConfig>,
}

impl SinkConfig {
    /// Config for a given kind with default sub-configs.
    pub fn new(kind: SinkKind, region: &str, destination: &str) -> Self {
        Self {
            kind,
            region: region.to_string(),
            destination: destination.to_string(),
            file: FileSinkConfig::default(),
            mirror: None,
        }
    }

    /// Create in-memory config.
    pub fn memory(destination: &str) -> Self {
        Self::new(SinkKind::Memory, "local", destination)
    }

    /// Create log config.
    pub fn log(destination: &str) -> Self {
        Self::new(SinkKind::Log, "local", destination)
    }

    /// Create file config.
    pub fn file(dir: impl Into<PathBuf>, destination: &str) -> Self {
        let mut config = Self::new(SinkKind::File, "local", destination);
        config.file.dir = dir.into();
        config
    }

    /// Create DynamoDB config.
    pub fn dynamodb(region: &str, table: &str) -> Self {
        Self::new(SinkKind::DynamoDb, region, table)
    }

    /// Turn this config into a mirror of two kinds sharing its settings.
    pub fn mirrored(mut self, primary: SinkKind, secondary: SinkKind) -> Self {
        self.kind = SinkKind::Mirror;
        self.mirror = Some(MirrorConfig { primary, secondary });
        self
    }

    /// Kinds that will actually receive records.
    pub fn members(&self) -> Vec<SinkKind> {
        match (self.kind, self.mirror) {
            (SinkKind::Mirror, Some(mirror)) => vec![mirror.primary, mirror.secondary],
            (kind, _) => vec![kind],
        }
    }

    /// Reject settings that would misroute or duplicate records.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let (SinkKind::Mirror, Some(mirror)) = (self.kind, self.mirror) {
            if mirror.primary == mirror.secondary {
                return Err(ConfigError::Invalid {
                    key: "AUDIT_MIRROR_SECONDARY",
                    value: mirror.secondary.to_string(),
                    reason: "mirror members must be different sinks".to_string(),
                });
            }
        }

        if self.members().contains(&SinkKind::File) {
            validate_destination(&self.destination)?;
        }
        Ok(())
    }
}

/// Check that a destination is a plain table name usable as a file stem.
///
/// Only ASCII letters, digits, `_`, `-` and `.` are allowed, and a name made
/// only of dots is refused.
pub fn validate_destination(destination: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        key: "target_table",
        value: destination.to_string(),
        reason: reason.to_string(),
    };

    if destination.is_empty() {
        return Err(invalid("destination is empty"));
    }
    if let Some(c) = destination
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(invalid(&format!("character {:?} is not allowed in a table name", c)));
    }
    if destination.chars().all(|c| c == '.') {
        return Err(invalid("destination cannot be a relative path"));
    }
    Ok(())
}

/// File sink configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSinkConfig {
    /// Directory holding `<destination>.jsonl`
    pub dir: PathBuf,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./audit"),
        }
    }
}

/// Mirror sink configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Sink written first
    pub primary: SinkKind,
    /// Sink written second
    pub secondary: SinkKind,
}
