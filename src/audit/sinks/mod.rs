//! Audit sink implementations.

#[cfg(feature = "dynamodb")]
pub mod dynamodb;
pub mod file;
pub mod log;
pub mod memory;
pub mod mirror;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbSink;
pub use file::{FileSink, StoredRecord};
pub use log::LogSink;
pub use memory::MemorySink;
pub use mirror::MirrorSink;
