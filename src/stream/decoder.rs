//! Change event decoding.
//!
//! Turns one change notification into a canonical [`ChangeEvent`]: the item
//! key, the tracked value after the change and, for modifications, the value
//! before it. Decoding is pure.

use crate::audit::record::RecordKind;
use crate::core::DecodeError;
use crate::stream::attribute::{Image, Number};
use crate::stream::notification::{RawRecord, StreamRecord};
use serde::{Deserialize, Serialize};

/// Which image of a notification an attribute came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSide {
    /// State before the change
    Old,
    /// State after the change
    New,
}

impl std::fmt::Display for ImageSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageSide::Old => write!(f, "old"),
            ImageSide::New => write!(f, "new"),
        }
    }
}

/// Names of the attributes the relay tracks.
///
/// Exactly one value attribute is tracked; its name is what update records
/// report as the changed attribute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSchema {
    /// String attribute holding the item's natural key
    pub key_attribute: String,
    /// Numeric attribute whose changes are audited
    pub value_attribute: String,
}

impl Default for ItemSchema {
    fn default() -> Self {
        Self {
            key_attribute: "key".to_string(),
            value_attribute: "value".to_string(),
        }
    }
}

/// Canonical form of one change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Natural key of the changed item
    pub item_key: String,
    /// Tracked value before the change; present only for updates
    pub previous_value: Option<Number>,
    /// Tracked value after the change
    pub new_value: Number,
}

impl ChangeEvent {
    /// Event for a newly created item.
    pub fn insert(item_key: &str, new_value: impl Into<Number>) -> Self {
        Self {
            item_key: item_key.to_string(),
            previous_value: None,
            new_value: new_value.into(),
        }
    }

    /// Event for a modified item.
    pub fn update(
        item_key: &str,
        previous_value: impl Into<Number>,
        new_value: impl Into<Number>,
    ) -> Self {
        Self {
            item_key: item_key.to_string(),
            previous_value: Some(previous_value.into()),
            new_value: new_value.into(),
        }
    }

    /// Classification, decided solely by the presence of a previous value.
    pub fn kind(&self) -> RecordKind {
        match self.previous_value {
            Some(_) => RecordKind::Update,
            None => RecordKind::Insert,
        }
    }
}

/// Extracts change events from notifications.
#[derive(Clone, Debug, Default)]
pub struct ChangeEventDecoder {
    schema: ItemSchema,
}

impl ChangeEventDecoder {
    /// Create a decoder for the given schema.
    pub fn new(schema: ItemSchema) -> Self {
        Self { schema }
    }

    /// Tracked attribute names.
    pub fn schema(&self) -> &ItemSchema {
        &self.schema
    }

    /// Decode a typed notification.
    pub fn decode(&self, record: &StreamRecord) -> Result<ChangeEvent, DecodeError> {
        let new_image = record
            .change
            .new_image
            .as_ref()
            .ok_or(DecodeError::MissingNewImage)?;

        let item_key = self.key_attribute(new_image)?;
        let new_value = self.value_attribute(new_image, ImageSide::New)?;

        let previous_value = match &record.change.old_image {
            Some(old_image) => Some(self.value_attribute(old_image, ImageSide::Old)?),
            None => None,
        };

        Ok(ChangeEvent {
            item_key,
            previous_value,
            new_value,
        })
    }

    /// Parse and decode a notification in its received form.
    pub fn decode_raw(&self, raw: &RawRecord) -> Result<ChangeEvent, DecodeError> {
        self.decode(&raw.parse()?)
    }

    /// Best-effort item key for failure reports.
    ///
    /// Works on notifications that fail to parse or decode, as long as the
    /// new image still carries a string key.
    pub fn key_hint(&self, raw: &RawRecord) -> Option<String> {
        let pointer = format!(
            "/dynamodb/NewImage/{}/S",
            escape_pointer_token(&self.schema.key_attribute)
        );
        raw.0.pointer(&pointer)?.as_str().map(str::to_string)
    }

    fn key_attribute(&self, image: &Image) -> Result<String, DecodeError> {
        let name = &self.schema.key_attribute;
        let value = image.get(name).ok_or_else(|| DecodeError::MissingAttribute {
            image: ImageSide::New,
            attribute: name.clone(),
        })?;

        value
            .as_s()
            .map(str::to_string)
            .ok_or_else(|| DecodeError::WrongType {
                image: ImageSide::New,
                attribute: name.clone(),
                expected: "S",
                found: value.type_name(),
            })
    }

    fn value_attribute(&self, image: &Image, side: ImageSide) -> Result<Number, DecodeError> {
        let name = &self.schema.value_attribute;
        let value = image.get(name).ok_or_else(|| DecodeError::MissingAttribute {
            image: side,
            attribute: name.clone(),
        })?;

        let number = value.as_n().ok_or_else(|| DecodeError::WrongType {
            image: side,
            attribute: name.clone(),
            expected: "N",
            found: value.type_name(),
        })?;

        if !number.is_valid() {
            return Err(DecodeError::InvalidNumber {
                image: side,
                attribute: name.clone(),
                text: number.as_str().to_string(),
            });
        }

        Ok(number.clone())
    }
}

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::attribute::AttributeValue;
    use serde_json::json;

    fn image(key: &str, value: &str) -> Image {
        Image::from([
            ("key".to_string(), AttributeValue::s(key)),
            ("value".to_string(), AttributeValue::n(value)),
        ])
    }

    #[test]
    fn test_decode_insert() {
        let decoder = ChangeEventDecoder::default();
        let event = decoder.decode(&StreamRecord::insert(image("xyz", "42"))).unwrap();

        assert_eq!(event, ChangeEvent::insert("xyz", 42));
        assert_eq!(event.kind(), RecordKind::Insert);
    }

    #[test]
    fn test_decode_update() {
        let decoder = ChangeEventDecoder::default();
        let record = StreamRecord::modify(image("abc", "10"), image("abc", "15"));
        let event = decoder.decode(&record).unwrap();

        assert_eq!(event, ChangeEvent::update("abc", 10, 15));
        assert_eq!(event.kind(), RecordKind::Update);
    }

    #[test]
    fn test_missing_new_image() {
        let decoder = ChangeEventDecoder::default();
        let err = decoder.decode(&StreamRecord::remove(image("abc", "1"))).unwrap_err();
        assert_eq!(err, DecodeError::MissingNewImage);
    }

    #[test]
    fn test_missing_key() {
        let decoder = ChangeEventDecoder::default();
        let new_image = Image::from([("value".to_string(), AttributeValue::n(1))]);
        let err = decoder.decode(&StreamRecord::insert(new_image)).unwrap_err();

        assert_eq!(
            err,
            DecodeError::MissingAttribute {
                image: ImageSide::New,
                attribute: "key".to_string(),
            }
        );
    }

    #[test]
    fn test_key_must_be_string() {
        let decoder = ChangeEventDecoder::default();
        let new_image = Image::from([
            ("key".to_string(), AttributeValue::n(7)),
            ("value".to_string(), AttributeValue::n(1)),
        ]);
        let err = decoder.decode(&StreamRecord::insert(new_image)).unwrap_err();
        assert!(matches!(err, DecodeError::WrongType { expected: "S", found: "N", .. }));
    }

    #[test]
    fn test_old_value_must_be_numeric() {
        let decoder = ChangeEventDecoder::default();
        let old = Image::from([
            ("key".to_string(), AttributeValue::s("abc")),
            ("value".to_string(), AttributeValue::s("ten")),
        ]);
        let err = decoder
            .decode(&StreamRecord::modify(old, image("abc", "11")))
            .unwrap_err();

        assert_eq!(
            err,
            DecodeError::WrongType {
                image: ImageSide::Old,
                attribute: "value".to_string(),
                expected: "N",
                found: "S",
            }
        );
    }

    #[test]
    fn test_missing_new_value() {
        let decoder = ChangeEventDecoder::default();
        let new_image = Image::from([("key".to_string(), AttributeValue::s("abc"))]);
        let err = decoder.decode(&StreamRecord::insert(new_image)).unwrap_err();
        assert!(matches!(err, DecodeError::MissingAttribute { image: ImageSide::New, .. }));
    }

    #[test]
    fn test_invalid_number_text() {
        let decoder = ChangeEventDecoder::default();
        let err = decoder
            .decode(&StreamRecord::insert(image("abc", "12abc")))
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidNumber { .. }));
    }

    #[test]
    fn test_custom_schema() {
        let decoder = ChangeEventDecoder::new(ItemSchema {
            key_attribute: "id".to_string(),
            value_attribute: "amount".to_string(),
        });
        let new_image = Image::from([
            ("id".to_string(), AttributeValue::s("acct-1")),
            ("amount".to_string(), AttributeValue::n("99.95")),
        ]);
        let event = decoder.decode(&StreamRecord::insert(new_image)).unwrap();
        assert_eq!(event, ChangeEvent::insert("acct-1", "99.95"));
    }

    #[test]
    fn test_extra_attributes_ignored() {
        let decoder = ChangeEventDecoder::default();
        let mut new_image = image("abc", "3");
        new_image.insert("note".to_string(), AttributeValue::s("ignored"));
        assert!(decoder.decode(&StreamRecord::insert(new_image)).is_ok());
    }

    #[test]
    fn test_decode_raw_malformed() {
        let decoder = ChangeEventDecoder::default();
        let raw = RawRecord(json!({"dynamodb": "not an object"}));
        assert!(matches!(decoder.decode_raw(&raw), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_key_hint() {
        let decoder = ChangeEventDecoder::default();
        let raw = RawRecord(json!({
            "dynamodb": {"NewImage": {"key": {"S": "abc"}, "value": {"S": "oops"}}}
        }));
        assert!(decoder.decode_raw(&raw).is_err());
        assert_eq!(decoder.key_hint(&raw), Some("abc".to_string()));

        let keyless = RawRecord(json!({"dynamodb": {}}));
        assert_eq!(decoder.key_hint(&keyless), None);
    }

    #[test]
    fn test_pointer_escaping() {
        assert_eq!(escape_pointer_token("a/b~c"), "a~1b~0c");
    }
}
