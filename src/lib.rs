//! # audit-relay - Change-data-capture audit relay
//!
//! Consumes row-level change notifications from a key-value table and
//! persists one audit record per change:
//! - **stream**: notification wire format and decoding into change events
//! - **audit**: record shaping and pluggable sinks
//! - **relay**: per-batch orchestration with per-record failure isolation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use audit_relay::audit::sinks::MemorySink;
//! use audit_relay::relay::AuditRelay;
//! use audit_relay::stream::{ItemSchema, StreamBatch};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let sink = Arc::new(MemorySink::new());
//!     let relay = AuditRelay::with_schema(sink.clone(), ItemSchema::default());
//!
//!     let batch = StreamBatch::from_json(r#"{"Records": []}"#).unwrap();
//!     let report = relay.process_batch(&batch).await;
//!     println!("{}", report.body);
//! }
//! ```

pub mod audit;
pub mod core;
pub mod monitoring;
pub mod relay;
pub mod stream;

pub use crate::core::error::{Error, Result};
