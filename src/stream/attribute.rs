//! Typed attribute values carried by change-stream images.
//!
//! Values use the single-key tagged JSON form of the stream
//! (`{"S": "abc"}`, `{"N": "10"}`, `{"M": {...}}`).

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// A decimal number kept in the exact textual form the stream delivered.
///
/// The text is passed through to destinations unchanged, so precision the
/// source table stores is never lost to a float round-trip.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Number(String);

impl Number {
    /// Wrap number text without validating it.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The exact decimal text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the text is a finite decimal with no surrounding whitespace.
    pub fn is_valid(&self) -> bool {
        let text = self.0.as_str();
        !text.is_empty()
            && text.trim() == text
            && text.parse::<f64>().map(f64::is_finite).unwrap_or(false)
    }

    /// Approximate value, if the text is a valid number.
    pub fn as_f64(&self) -> Option<f64> {
        if self.is_valid() {
            self.0.parse().ok()
        } else {
            None
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Self(v.to_string())
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Self(v.to_string())
    }
}

impl From<&str> for Number {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NumberVisitor;

        impl<'de> Visitor<'de> for NumberVisitor {
            type Value = Number;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal number as text or as a JSON number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Number, E> {
                Ok(Number(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Number, E> {
                Ok(Number(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Number, E> {
                Ok(Number(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Number, E> {
                Ok(Number(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Number, E> {
                Ok(Number(v.to_string()))
            }
        }

        deserializer.deserialize_any(NumberVisitor)
    }
}

/// One typed attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String
    #[serde(rename = "S")]
    S(String),
    /// Number
    #[serde(rename = "N")]
    N(Number),
    /// Binary, base64 text
    #[serde(rename = "B")]
    B(String),
    /// Boolean
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Null marker
    #[serde(rename = "NULL")]
    Null(bool),
    /// Nested map
    #[serde(rename = "M")]
    M(HashMap<String, AttributeValue>),
    /// List
    #[serde(rename = "L")]
    L(Vec<AttributeValue>),
    /// String set
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    /// Number set
    #[serde(rename = "NS")]
    Ns(Vec<Number>),
    /// Binary set, base64 text
    #[serde(rename = "BS")]
    Bs(Vec<String>),
}

impl AttributeValue {
    /// String attribute.
    pub fn s(value: impl Into<String>) -> Self {
        AttributeValue::S(value.into())
    }

    /// Number attribute.
    pub fn n(value: impl Into<Number>) -> Self {
        AttributeValue::N(value.into())
    }

    /// Wire tag of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::B(_) => "B",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Null(_) => "NULL",
            AttributeValue::M(_) => "M",
            AttributeValue::L(_) => "L",
            AttributeValue::Ss(_) => "SS",
            AttributeValue::Ns(_) => "NS",
            AttributeValue::Bs(_) => "BS",
        }
    }

    /// The string payload, if this is an `S`.
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    /// The number payload, if this is an `N`.
    pub fn as_n(&self) -> Option<&Number> {
        match self {
            AttributeValue::N(n) => Some(n),
            _ => None,
        }
    }
}

/// Attribute name to value mapping for one item state.
pub type Image = HashMap<String, AttributeValue>;
