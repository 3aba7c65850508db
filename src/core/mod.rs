//! Core utilities and common types for the relay.

pub mod capability;
pub mod error;
pub mod types;

pub use capability::{Clock, FixedClock, IdGenerator, SequentialIds, SystemClock, UuidGenerator};
pub use error::{ConfigError, DecodeError, Error, Result, SinkError};
pub use types::*;
