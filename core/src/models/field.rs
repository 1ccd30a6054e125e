//! Field definitions
//!
//! A field stores every configuration key it has ever been given, whatever
//! its current type. [`FieldDefinition::kind`] projects out the part that is
//! meaningful for the declared type.

use serde::{Deserialize, Serialize};

use crate::registry::{FieldType, TypeDescriptor};
use super::value::FieldValue;

/// Numeric constraints for number and measurement fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Inclusive lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Inclusive upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Value the answer must differ from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neq: Option<f64>,
}

impl Constraints {
    /// Bounds without a forbidden value
    pub fn range(min: f64, max: f64) -> Self {
        Constraints {
            min: Some(min),
            max: Some(max),
            neq: None,
        }
    }
}

/// Type-specific configuration payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    /// Options of a select field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    /// Numeric constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,

    /// Units of a measurement field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,

    /// Extension or MIME patterns for file and photo fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_types: Option<Vec<String>>,
}

/// Declared data type of a field.
///
/// Stored data may carry a tag from a newer or corrupted catalog; such fields
/// deserialize as [`DataType::Unsupported`] instead of failing the whole form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataType {
    /// A catalog type
    Known(FieldType),

    /// A tag outside the catalog
    Unsupported(String),
}

impl DataType {
    /// Catalog type, if known
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            DataType::Known(t) => Some(*t),
            DataType::Unsupported(_) => None,
        }
    }

    /// Wire name of the tag
    pub fn as_str(&self) -> &str {
        match self {
            DataType::Known(t) => t.as_str(),
            DataType::Unsupported(tag) => tag,
        }
    }
}

impl From<FieldType> for DataType {
    fn from(value: FieldType) -> Self {
        DataType::Known(value)
    }
}

/// Configuration relevant to a field's declared type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind<'a> {
    /// Free text
    String,

    /// Number with optional constraints
    Number {
        /// Numeric constraints
        constraints: Constraints,
    },

    /// Checkbox
    Boolean,

    /// Calendar date
    Date,

    /// Choice among options
    Select {
        /// Declared options
        options: &'a [String],
    },

    /// Number with units
    Measurement {
        /// Units label
        units: Option<&'a str>,
        /// Numeric constraints
        constraints: Constraints,
    },

    /// File attachment
    File {
        /// Configured filter
        file_types: &'a [String],
    },

    /// Coordinate
    Location,

    /// Image attachment
    Photo {
        /// Configured filter, empty when the default list applies
        file_types: &'a [String],
    },

    /// Free-text request for information
    RequestForInformation,

    /// Tag outside the catalog
    Unsupported(&'a str),
}

/// One question in a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Stable identifier, never reused
    #[serde(rename = "_id")]
    pub id: String,

    /// Declared data type
    pub data_type: DataType,

    /// Label shown to the user
    pub label: String,

    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether an answer is mandatory
    #[serde(default)]
    pub required: bool,

    /// Type-specific configuration
    #[serde(flatten)]
    pub config: FieldConfig,

    /// Value used when a response supplies none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
}

impl FieldDefinition {
    /// Create an optional field with no configuration
    pub fn new(id: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        FieldDefinition {
            id: id.into(),
            data_type: DataType::Known(field_type),
            label: label.into(),
            description: None,
            required: false,
            config: FieldConfig::default(),
            default_value: None,
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set select options
    pub fn with_options<S: Into<String>>(mut self, options: impl IntoIterator<Item = S>) -> Self {
        self.config.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Set numeric constraints
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.config.constraints = Some(constraints);
        self
    }

    /// Set measurement units
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.config.units = Some(units.into());
        self
    }

    /// Set the file type filter
    pub fn with_file_types<S: Into<String>>(mut self, file_types: impl IntoIterator<Item = S>) -> Self {
        self.config.file_types = Some(file_types.into_iter().map(Into::into).collect());
        self
    }

    /// Set the default value
    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Catalog type, `None` when the stored tag is unsupported
    pub fn field_type(&self) -> Option<FieldType> {
        self.data_type.field_type()
    }

    /// Registry entry for the declared type
    pub fn descriptor(&self) -> Option<&'static TypeDescriptor> {
        self.field_type().map(FieldType::descriptor)
    }

    /// Project the configuration relevant to the declared type
    pub fn kind(&self) -> FieldKind<'_> {
        let field_type = match &self.data_type {
            DataType::Known(t) => *t,
            DataType::Unsupported(tag) => return FieldKind::Unsupported(tag),
        };
        let constraints = self.config.constraints.unwrap_or_default();
        let options = self.config.options.as_deref().unwrap_or_default();
        let file_types = self.config.file_types.as_deref().unwrap_or_default();

        match field_type {
            FieldType::String => FieldKind::String,
            FieldType::Number => FieldKind::Number { constraints },
            FieldType::Boolean => FieldKind::Boolean,
            FieldType::Date => FieldKind::Date,
            FieldType::Select => FieldKind::Select { options },
            FieldType::Measurement => FieldKind::Measurement {
                units: self.config.units.as_deref(),
                constraints,
            },
            FieldType::File => FieldKind::File { file_types },
            FieldType::Location => FieldKind::Location,
            FieldType::Photo => FieldKind::Photo { file_types },
            FieldType::RequestForInformation => FieldKind::RequestForInformation,
        }
    }

    /// File type filter in effect, falling back to the type's default list
    pub fn accepted_file_types(&self) -> Vec<String> {
        match self.kind() {
            FieldKind::File { file_types } => file_types.to_vec(),
            FieldKind::Photo { file_types } if !file_types.is_empty() => file_types.to_vec(),
            FieldKind::Photo { .. } => self
                .descriptor()
                .map(|d| d.default_file_types.iter().map(|t| t.to_string()).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}
