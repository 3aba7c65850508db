//! Error types for the audit relay.

use crate::stream::ImageSide;
use thiserror::Error;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in relay operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

/// A change notification that cannot be turned into a change event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("notification carries no new image")]
    MissingNewImage,

    #[error("{image} image has no '{attribute}' attribute")]
    MissingAttribute { image: ImageSide, attribute: String },

    #[error("{image} image attribute '{attribute}' is {found}, expected {expected}")]
    WrongType {
        image: ImageSide,
        attribute: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{image} image attribute '{attribute}' is not a valid number: {text:?}")]
    InvalidNumber {
        image: ImageSide,
        attribute: String,
        text: String,
    },

    #[error("malformed notification: {0}")]
    Malformed(String),
}

/// A persistence call that did not complete.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("write to '{destination}' failed: {message}")]
    Write {
        destination: String,
        message: String,
    },

    #[error("sink unavailable: {0}")]
    Unavailable(String),

    #[error("record rejected: {0}")]
    Rejected(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        SinkError::Serialization(err.to_string())
    }
}

/// Startup configuration that is missing or unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting '{0}'")]
    Missing(&'static str),

    #[error("invalid value {value:?} for '{key}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("sink '{0}' is not available in this build")]
    Unsupported(String),
}
