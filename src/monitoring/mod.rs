//! Monitoring Module
//!
//! Structured logging setup for the relay.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
