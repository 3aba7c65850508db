//! Audit layer
//!
//! Record shaping plus a trait-based sink supporting:
//! - Memory
//! - JSONL file with checksums
//! - Structured log
//! - DynamoDB (feature `dynamodb`)
//! - Mirror (two sinks)

pub mod builder;
pub mod config;
pub mod factory;
pub mod filter;
pub mod record;
pub mod sink;
pub mod sinks;

pub use builder::AuditRecordBuilder;
pub use config::{FileSinkConfig, MirrorConfig, SinkConfig};
pub use factory::create_audit_sink;
pub use filter::RecordFilter;
pub use record::{AuditRecord, Change, ItemSnapshot, RecordId, RecordKind};
pub use sink::{AuditSink, SinkKind, VerificationResult};
