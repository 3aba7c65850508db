//! Relay orchestration
//!
//! Configuration, the per-batch processing loop and its report.

pub mod config;
pub mod processor;
pub mod report;

pub use config::RelayConfig;
pub use processor::AuditRelay;
pub use report::{BatchItemFailure, BatchReport, FailureKind, RecordFailure};
