//! Change stream input.
//!
//! Notifications, their typed attribute images, and decoding into
//! canonical change events.

pub mod attribute;
pub mod decoder;
pub mod notification;

pub use attribute::{AttributeValue, Image, Number};
pub use decoder::{ChangeEvent, ChangeEventDecoder, ImageSide, ItemSchema};
pub use notification::{EventName, RawRecord, StreamBatch, StreamChange, StreamRecord};
