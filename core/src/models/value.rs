//! Typed field values
//!
//! A single tagged union covers both raw input handed in by a caller and the
//! canonical value a field is coerced into.

use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::registry::ValueKind;

/// Reference to an encoded file produced by the blob collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobRef {
    /// Display name, usually the original file name
    pub name: String,

    /// Content-bearing encoded string (e.g. a data URL)
    pub data: String,

    /// MIME type, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl BlobRef {
    /// Create a blob reference without a MIME type
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        BlobRef {
            name: name.into(),
            data: data.into(),
            mime_type: None,
        }
    }
}

/// Geographic coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Accuracy radius in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl Coordinate {
    /// Create a coordinate without accuracy information
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
            accuracy: None,
        }
    }

    /// Both axes (and accuracy, if present) are finite numbers
    pub fn is_well_formed(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.accuracy.map_or(true, f64::is_finite)
    }
}

/// Value of a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    /// No value
    Empty,

    /// Text
    Text(String),

    /// 64-bit float
    Number(f64),

    /// true/false
    Boolean(bool),

    /// Calendar date
    Date(NaiveDate),

    /// Selected option
    #[serde(rename = "option")]
    Choice(String),

    /// Encoded file
    Blob(BlobRef),

    /// Coordinate or explicit null
    Location(Option<Coordinate>),
}

impl FieldValue {
    /// Kind of the value, `None` for [`FieldValue::Empty`]
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            FieldValue::Empty => None,
            FieldValue::Text(_) => Some(ValueKind::Text),
            FieldValue::Number(_) => Some(ValueKind::Number),
            FieldValue::Boolean(_) => Some(ValueKind::Boolean),
            FieldValue::Date(_) => Some(ValueKind::Date),
            FieldValue::Choice(_) => Some(ValueKind::Choice),
            FieldValue::Blob(_) => Some(ValueKind::Blob),
            FieldValue::Location(_) => Some(ValueKind::Coordinate),
        }
    }

    /// Whether the value counts as unanswered
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty | FieldValue::Location(None) => true,
            FieldValue::Text(s) | FieldValue::Choice(s) => s.trim().is_empty(),
            FieldValue::Blob(blob) => blob.data.is_empty(),
            FieldValue::Number(_)
            | FieldValue::Boolean(_)
            | FieldValue::Date(_)
            | FieldValue::Location(Some(_)) => false,
        }
    }

    /// Numeric content, if any
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text content of text-like values
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) => Some(s),
            _ => None,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Empty
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Text(s) | FieldValue::Choice(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Blob(blob) => f.write_str(&blob.name),
            FieldValue::Location(Some(c)) => write!(f, "{},{}", c.latitude, c.longitude),
            FieldValue::Location(None) => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<BlobRef> for FieldValue {
    fn from(value: BlobRef) -> Self {
        FieldValue::Blob(value)
    }
}

impl From<Coordinate> for FieldValue {
    fn from(value: Coordinate) -> Self {
        FieldValue::Location(Some(value))
    }
}
