//! Relay configuration.
//!
//! Resolved once at startup from the process environment. A relay that
//! cannot resolve its destination refuses to start. Without `AUDIT_SINK`
//! records go to the DynamoDB table named by `target_table` in `region`.

use crate::audit::config::{MirrorConfig, SinkConfig};
use crate::audit::sink::SinkKind;
use crate::core::ConfigError;
use crate::stream::ItemSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Region selector for the destination.
pub const REGION: &str = "region";
/// Destination identifier.
pub const TARGET_TABLE: &str = "target_table";
/// Sink kind.
pub const AUDIT_SINK: &str = "AUDIT_SINK";
/// File sink directory.
pub const AUDIT_FILE_DIR: &str = "AUDIT_FILE_DIR";
/// Mirror primary sink kind.
pub const AUDIT_MIRROR_PRIMARY: &str = "AUDIT_MIRROR_PRIMARY";
/// Mirror secondary sink kind.
pub const AUDIT_MIRROR_SECONDARY: &str = "AUDIT_MIRROR_SECONDARY";
/// Key attribute name.
pub const AUDIT_KEY_ATTRIBUTE: &str = "AUDIT_KEY_ATTRIBUTE";
/// Tracked value attribute name.
pub const AUDIT_VALUE_ATTRIBUTE: &str = "AUDIT_VALUE_ATTRIBUTE";

/// Everything the relay needs before it sees a record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Where records go
    pub sink: SinkConfig,
    /// Which attributes are tracked
    pub schema: ItemSchema,
}

impl RelayConfig {
    /// Resolve from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let setting = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let region = setting(REGION).ok_or(ConfigError::Missing(REGION))?;
        let destination = setting(TARGET_TABLE).ok_or(ConfigError::Missing(TARGET_TABLE))?;

        let kind = match setting(AUDIT_SINK) {
            Some(value) => parse_kind(AUDIT_SINK, &value)?,
            None => SinkKind::DynamoDb,
        };

        let mut sink = SinkConfig::new(kind, &region, &destination);

        if let Some(dir) = setting(AUDIT_FILE_DIR) {
            sink.file.dir = PathBuf::from(dir);
        }

        if kind == SinkKind::Mirror {
            let primary = setting(AUDIT_MIRROR_PRIMARY)
                .ok_or(ConfigError::Missing(AUDIT_MIRROR_PRIMARY))?;
            let secondary = setting(AUDIT_MIRROR_SECONDARY)
                .ok_or(ConfigError::Missing(AUDIT_MIRROR_SECONDARY))?;
            sink.mirror = Some(MirrorConfig {
                primary: parse_mirrored_kind(AUDIT_MIRROR_PRIMARY, &primary)?,
                secondary: parse_mirrored_kind(AUDIT_MIRROR_SECONDARY, &secondary)?,
            });
        }

        sink.validate()?;

        let mut schema = ItemSchema::default();
        if let Some(key) = setting(AUDIT_KEY_ATTRIBUTE) {
            schema.key_attribute = key;
        }
        if let Some(value) = setting(AUDIT_VALUE_ATTRIBUTE) {
            schema.value_attribute = value;
        }

        Ok(Self { sink, schema })
    }
}

fn parse_kind(key: &'static str, value: &str) -> Result<SinkKind, ConfigError> {
    value.parse().map_err(|reason| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason,
    })
}

fn parse_mirrored_kind(key: &'static str, value: &str) -> Result<SinkKind, ConfigError> {
    let kind = parse_kind(key, value)?;
    if kind == SinkKind::Mirror {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "mirror sinks cannot be nested".to_string(),
        });
    }
    Ok(kind)
}
