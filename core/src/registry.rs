//! Field type registry
//!
//! The closed catalog of field data types. Each entry describes the canonical
//! value kind a field of that type produces, the configuration keys it
//! recognizes, and a pure predicate over its configuration. The table is a
//! process-wide constant; nothing here is mutable.

use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::FieldConfig;

/// Registry lookup error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The tag is not part of the catalog
    #[error("Unknown field type: {0}")]
    UnknownFieldType(String),
}

/// Supported field data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single line of text
    String,

    /// Floating point number
    Number,

    /// Checkbox
    Boolean,

    /// Calendar date
    Date,

    /// One value out of a declared option list
    Select,

    /// Number with units
    Measurement,

    /// Arbitrary file attachment
    File,

    /// Geographic coordinate
    Location,

    /// Image attachment
    Photo,

    /// Free-text request for information
    #[serde(rename = "request for information", alias = "request-for-information")]
    RequestForInformation,
}

impl FieldType {
    /// Every catalog entry, in editor order
    pub const ALL: [FieldType; 10] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Select,
        FieldType::Measurement,
        FieldType::File,
        FieldType::Location,
        FieldType::Photo,
        FieldType::RequestForInformation,
    ];

    /// Wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Select => "select",
            FieldType::Measurement => "measurement",
            FieldType::File => "file",
            FieldType::Location => "location",
            FieldType::Photo => "photo",
            FieldType::RequestForInformation => "request for information",
        }
    }

    /// Registry entry for this type
    pub fn descriptor(self) -> &'static TypeDescriptor {
        // DESCRIPTORS is laid out in declaration order
        &DESCRIPTORS[self as usize]
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "request-for-information" => Ok(FieldType::RequestForInformation),
            other => FieldType::ALL
                .iter()
                .copied()
                .find(|t| t.as_str() == other)
                .ok_or_else(|| RegistryError::UnknownFieldType(other.to_string())),
        }
    }
}

/// Canonical representation a field's value is coerced into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Text
    Text,

    /// 64-bit float
    Number,

    /// true/false
    Boolean,

    /// ISO calendar date
    Date,

    /// One of the declared options
    #[serde(rename = "option")]
    Choice,

    /// Opaque blob reference
    Blob,

    /// Coordinate or null
    Coordinate,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            ValueKind::Text => "text",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Date => "date",
            ValueKind::Choice => "option",
            ValueKind::Blob => "blob",
            ValueKind::Coordinate => "coordinate",
        };
        f.write_str(name)
    }
}

/// Configuration keys a field definition may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// `options`
    Options,

    /// `constraints`
    Constraints,

    /// `units`
    Units,

    /// `fileTypes`
    FileTypes,
}

impl ConfigKey {
    /// Serialized key name
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Options => "options",
            ConfigKey::Constraints => "constraints",
            ConfigKey::Units => "units",
            ConfigKey::FileTypes => "fileTypes",
        }
    }
}

/// A problem found in a field's configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigIssue {
    /// Select field without options
    EmptyOptions,

    /// Option listed more than once (case-sensitive)
    DuplicateOption(String),

    /// Lower bound above upper bound
    MinAboveMax {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Blank entry in a file type filter
    BlankFileType(usize),
}

impl ConfigIssue {
    /// Key the issue belongs to
    pub fn key(&self) -> ConfigKey {
        match self {
            ConfigIssue::EmptyOptions | ConfigIssue::DuplicateOption(_) => ConfigKey::Options,
            ConfigIssue::MinAboveMax { .. } => ConfigKey::Constraints,
            ConfigIssue::BlankFileType(_) => ConfigKey::FileTypes,
        }
    }
}

/// Accept list used by photo fields that declare no file types
pub const DEFAULT_PHOTO_TYPES: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Registry entry for one field type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Type this entry describes
    pub field_type: FieldType,

    /// Canonical value kind
    pub value_kind: ValueKind,

    /// Configuration keys meaningful for this type
    pub config_keys: &'static [ConfigKey],

    /// Implicit file type filter when none is configured
    pub default_file_types: &'static [&'static str],
}

impl TypeDescriptor {
    /// Whether `key` is meaningful for this type
    pub fn recognizes(&self, key: ConfigKey) -> bool {
        self.config_keys.contains(&key)
    }

    /// Issues in the recognized part of `config`, in key order.
    ///
    /// Keys belonging to other types are ignored so that switching a field's
    /// type back and forth keeps its earlier configuration intact.
    pub fn config_issues(&self, config: &FieldConfig) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.recognizes(ConfigKey::Options) {
            let options = config.options.as_deref().unwrap_or_default();
            if options.is_empty() {
                issues.push(ConfigIssue::EmptyOptions);
            }
            let mut seen = HashSet::new();
            for option in options {
                if !seen.insert(option.as_str()) {
                    issues.push(ConfigIssue::DuplicateOption(option.clone()));
                    break;
                }
            }
        }

        if self.recognizes(ConfigKey::Constraints) {
            if let Some(constraints) = &config.constraints {
                if let (Some(min), Some(max)) = (constraints.min, constraints.max) {
                    if min > max {
                        issues.push(ConfigIssue::MinAboveMax { min, max });
                    }
                }
            }
        }

        if self.recognizes(ConfigKey::FileTypes) {
            if let Some(file_types) = &config.file_types {
                if let Some(index) = file_types.iter().position(|t| t.trim().is_empty()) {
                    issues.push(ConfigIssue::BlankFileType(index));
                }
            }
        }

        issues
    }

    /// Pure predicate over a field configuration
    pub fn is_valid_config(&self, config: &FieldConfig) -> bool {
        self.config_issues(config).is_empty()
    }
}

const NO_KEYS: &[ConfigKey] = &[];
const NUMERIC_KEYS: &[ConfigKey] = &[ConfigKey::Constraints];
const MEASUREMENT_KEYS: &[ConfigKey] = &[ConfigKey::Units, ConfigKey::Constraints];
const SELECT_KEYS: &[ConfigKey] = &[ConfigKey::Options];
const FILE_KEYS: &[ConfigKey] = &[ConfigKey::FileTypes];

const fn entry(
    field_type: FieldType,
    value_kind: ValueKind,
    config_keys: &'static [ConfigKey],
) -> TypeDescriptor {
    TypeDescriptor {
        field_type,
        value_kind,
        config_keys,
        default_file_types: &[],
    }
}

static DESCRIPTORS: [TypeDescriptor; 10] = [
    entry(FieldType::String, ValueKind::Text, NO_KEYS),
    entry(FieldType::Number, ValueKind::Number, NUMERIC_KEYS),
    entry(FieldType::Boolean, ValueKind::Boolean, NO_KEYS),
    entry(FieldType::Date, ValueKind::Date, NO_KEYS),
    entry(FieldType::Select, ValueKind::Choice, SELECT_KEYS),
    entry(FieldType::Measurement, ValueKind::Number, MEASUREMENT_KEYS),
    entry(FieldType::File, ValueKind::Blob, FILE_KEYS),
    entry(FieldType::Location, ValueKind::Coordinate, NO_KEYS),
    TypeDescriptor {
        field_type: FieldType::Photo,
        value_kind: ValueKind::Blob,
        config_keys: FILE_KEYS,
        default_file_types: DEFAULT_PHOTO_TYPES,
    },
    entry(FieldType::RequestForInformation, ValueKind::Text, NO_KEYS),
];

/// Look up a type by its wire name
pub fn describe(data_type: &str) -> Result<&'static TypeDescriptor, RegistryError> {
    data_type.parse::<FieldType>().map(FieldType::descriptor)
}

/// The whole catalog
pub fn catalog() -> &'static [TypeDescriptor] {
    &DESCRIPTORS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Constraints;
    use rstest::rstest;

    #[rstest]
    #[case("string", ValueKind::Text)]
    #[case("number", ValueKind::Number)]
    #[case("boolean", ValueKind::Boolean)]
    #[case("date", ValueKind::Date)]
    #[case("select", ValueKind::Choice)]
    #[case("measurement", ValueKind::Number)]
    #[case("file", ValueKind::Blob)]
    #[case("location", ValueKind::Coordinate)]
    #[case("photo", ValueKind::Blob)]
    #[case("request for information", ValueKind::Text)]
    #[case("request-for-information", ValueKind::Text)]
    fn test_describe_known_types(#[case] tag: &str, #[case] kind: ValueKind) {
        let descriptor = describe(tag).unwrap();
        assert_eq!(descriptor.value_kind, kind);
    }

    #[rstest]
    #[case("")]
    #[case("String")]
    #[case("signature")]
    #[case("request_for_information")]
    fn test_describe_unknown_type(#[case] tag: &str) {
        assert_eq!(
            describe(tag),
            Err(RegistryError::UnknownFieldType(tag.to_string()))
        );
    }

    #[test]
    fn test_descriptor_table_alignment() {
        for field_type in FieldType::ALL {
            assert_eq!(field_type.descriptor().field_type, field_type);
        }
        assert_eq!(catalog().len(), FieldType::ALL.len());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&FieldType::RequestForInformation).unwrap();
        assert_eq!(json, "\"request for information\"");

        let parsed: FieldType = serde_json::from_str("\"request-for-information\"").unwrap();
        assert_eq!(parsed, FieldType::RequestForInformation);

        for field_type in FieldType::ALL {
            let json = serde_json::to_string(&field_type).unwrap();
            assert_eq!(json, format!("\"{}\"", field_type.as_str()));
        }
    }

    #[test]
    fn test_select_config_issues() {
        let descriptor = FieldType::Select.descriptor();

        let mut config = FieldConfig::default();
        assert_eq!(descriptor.config_issues(&config), vec![ConfigIssue::EmptyOptions]);

        config.options = Some(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(
            descriptor.config_issues(&config),
            vec![ConfigIssue::DuplicateOption("a".into())]
        );

        // Case-sensitive comparison
        config.options = Some(vec!["a".into(), "A".into()]);
        assert!(descriptor.is_valid_config(&config));
    }

    #[test]
    fn test_foreign_keys_are_ignored() {
        let config = FieldConfig {
            options: Some(vec![]),
            constraints: Some(Constraints { min: Some(5.0), max: Some(1.0), neq: None }),
            units: Some("kg".into()),
            file_types: Some(vec!["".into()]),
        };

        assert!(FieldType::String.descriptor().is_valid_config(&config));
        assert_eq!(
            FieldType::Number.descriptor().config_issues(&config),
            vec![ConfigIssue::MinAboveMax { min: 5.0, max: 1.0 }]
        );
        assert_eq!(
            FieldType::Photo.descriptor().config_issues(&config),
            vec![ConfigIssue::BlankFileType(0)]
        );
    }

    #[test]
    fn test_photo_default_file_types() {
        assert_eq!(FieldType::Photo.descriptor().default_file_types, DEFAULT_PHOTO_TYPES);
        assert!(FieldType::File.descriptor().default_file_types.is_empty());
        assert!(FieldType::Measurement.descriptor().recognizes(ConfigKey::Units));
        assert!(!FieldType::Number.descriptor().recognizes(ConfigKey::Units));
    }
}
