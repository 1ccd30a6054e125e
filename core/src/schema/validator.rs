//! Schema validation
//!
//! Field rules are applied in a fixed order and the first failure wins:
//! label, type, then the type-specific configuration checks supplied by the
//! registry. Configuration keys that belong to other types are ignored.

use std::collections::HashSet;
use thiserror::Error;

use crate::models::{FieldDefinition, FormDefinition};
use crate::registry::{self, ConfigIssue};

/// Schema validation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Label is blank
    #[error("Field {field_id} has an empty label")]
    EmptyLabel {
        /// Offending field
        field_id: String,
    },

    /// Data type outside the catalog
    #[error("Field {field_id} has unknown type {data_type}")]
    UnknownFieldType {
        /// Offending field
        field_id: String,
        /// Stored type tag
        data_type: String,
    },

    /// Select options missing or duplicated
    #[error("Field {field_id} has invalid options: {reason}")]
    InvalidOptions {
        /// Offending field
        field_id: String,
        /// What is wrong with the options
        reason: String,
    },

    /// Lower bound above upper bound
    #[error("Field {field_id} has min {min} greater than max {max}")]
    InvalidRange {
        /// Offending field
        field_id: String,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Blank file type entry
    #[error("Field {field_id} has a blank file type at position {index}")]
    InvalidFileTypes {
        /// Offending field
        field_id: String,
        /// Position of the blank entry
        index: usize,
    },

    /// Two fields share an id
    #[error("Duplicate field id {0}")]
    DuplicateFieldId(String),
}

impl SchemaError {
    /// Field the error refers to
    pub fn field_id(&self) -> &str {
        match self {
            SchemaError::EmptyLabel { field_id }
            | SchemaError::UnknownFieldType { field_id, .. }
            | SchemaError::InvalidOptions { field_id, .. }
            | SchemaError::InvalidRange { field_id, .. }
            | SchemaError::InvalidFileTypes { field_id, .. } => field_id,
            SchemaError::DuplicateFieldId(field_id) => field_id,
        }
    }
}

/// Schema validation result
pub type ValidationResult<T> = Result<T, SchemaError>;

/// How strictly to validate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// The form is still being edited; select fields may lack options
    Draft,

    /// The form is about to be saved or filled out
    Final,
}

/// Schema validator
#[derive(Debug, Clone)]
pub struct SchemaValidator;

impl SchemaValidator {
    /// Validate a single field definition
    pub fn validate_field(field: &FieldDefinition, mode: ValidationMode) -> ValidationResult<()> {
        if field.label.trim().is_empty() {
            return Err(SchemaError::EmptyLabel {
                field_id: field.id.clone(),
            });
        }

        let descriptor = registry::describe(field.data_type.as_str()).map_err(|_| {
            SchemaError::UnknownFieldType {
                field_id: field.id.clone(),
                data_type: field.data_type.as_str().to_string(),
            }
        })?;

        for issue in descriptor.config_issues(&field.config) {
            if let Some(error) = Self::to_schema_error(&field.id, issue, mode) {
                return Err(error);
            }
        }

        Ok(())
    }

    /// Validate every field of a form and the uniqueness of field ids.
    ///
    /// All problems are collected; each field contributes at most one.
    pub fn validate_form(form: &FormDefinition, mode: ValidationMode) -> Result<(), Vec<SchemaError>> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for field in &form.fields {
            if !seen.insert(field.id.as_str()) {
                errors.push(SchemaError::DuplicateFieldId(field.id.clone()));
                continue;
            }
            if let Err(error) = Self::validate_field(field, mode) {
                errors.push(error);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn to_schema_error(field_id: &str, issue: ConfigIssue, mode: ValidationMode) -> Option<SchemaError> {
        let field_id = field_id.to_string();
        match issue {
            ConfigIssue::EmptyOptions if mode == ValidationMode::Final => Some(SchemaError::InvalidOptions {
                field_id,
                reason: "no options declared".to_string(),
            }),
            ConfigIssue::DuplicateOption(option) if mode == ValidationMode::Final => {
                Some(SchemaError::InvalidOptions {
                    field_id,
                    reason: format!("duplicate option '{}'", option),
                })
            }
            ConfigIssue::EmptyOptions | ConfigIssue::DuplicateOption(_) => None,
            ConfigIssue::MinAboveMax { min, max } => Some(SchemaError::InvalidRange { field_id, min, max }),
            ConfigIssue::BlankFileType(index) => Some(SchemaError::InvalidFileTypes { field_id, index }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::{Constraints, DataType, FormMeta};
    use crate::registry::FieldType;

    fn form_with(fields: Vec<FieldDefinition>) -> FormDefinition {
        let mut form = FormDefinition::new("form", "Form", FormMeta::new("user-1", Utc::now()));
        form.fields = fields;
        form
    }

    #[test]
    fn test_label_checked_first() {
        let mut field = FieldDefinition::new("a", FieldType::Select, "   ");
        field.data_type = DataType::Unsupported("signature".into());

        assert_eq!(
            SchemaValidator::validate_field(&field, ValidationMode::Final),
            Err(SchemaError::EmptyLabel { field_id: "a".into() })
        );

        field.label = "Sign here".into();
        assert_eq!(
            SchemaValidator::validate_field(&field, ValidationMode::Final),
            Err(SchemaError::UnknownFieldType {
                field_id: "a".into(),
                data_type: "signature".into()
            })
        );
    }

    #[test]
    fn test_select_options_by_mode() {
        let field = FieldDefinition::new("s", FieldType::Select, "Pick");

        assert!(SchemaValidator::validate_field(&field, ValidationMode::Draft).is_ok());
        assert!(matches!(
            SchemaValidator::validate_field(&field, ValidationMode::Final),
            Err(SchemaError::InvalidOptions { .. })
        ));

        let duplicated = field.clone().with_options(["x", "y", "x"]);
        assert!(SchemaValidator::validate_field(&duplicated, ValidationMode::Draft).is_ok());
        assert!(matches!(
            SchemaValidator::validate_field(&duplicated, ValidationMode::Final),
            Err(SchemaError::InvalidOptions { .. })
        ));

        let valid = field.with_options(["x", "X"]);
        assert!(SchemaValidator::validate_field(&valid, ValidationMode::Final).is_ok());
    }

    #[test]
    fn test_range_checked_in_every_mode() {
        let field = FieldDefinition::new("n", FieldType::Number, "Count")
            .with_constraints(Constraints::range(10.0, 1.0));

        for mode in [ValidationMode::Draft, ValidationMode::Final] {
            assert_eq!(
                SchemaValidator::validate_field(&field, mode),
                Err(SchemaError::InvalidRange {
                    field_id: "n".into(),
                    min: 10.0,
                    max: 1.0
                })
            );
        }

        let equal = FieldDefinition::new("m", FieldType::Measurement, "Len")
            .with_constraints(Constraints::range(3.0, 3.0));
        assert!(SchemaValidator::validate_field(&equal, ValidationMode::Final).is_ok());
    }

    #[test]
    fn test_file_types() {
        let field = FieldDefinition::new("f", FieldType::File, "Attachment").with_file_types([".pdf", " "]);
        assert_eq!(
            SchemaValidator::validate_field(&field, ValidationMode::Final),
            Err(SchemaError::InvalidFileTypes {
                field_id: "f".into(),
                index: 1
            })
        );

        let photo = FieldDefinition::new("p", FieldType::Photo, "Photo");
        assert!(SchemaValidator::validate_field(&photo, ValidationMode::Final).is_ok());
    }

    #[test]
    fn test_foreign_configuration_ignored() {
        // A string field that used to be a select keeps its empty option list
        let field = FieldDefinition::new("t", FieldType::String, "Notes")
            .with_options(Vec::<String>::new())
            .with_constraints(Constraints::range(5.0, 1.0));
        assert!(SchemaValidator::validate_field(&field, ValidationMode::Final).is_ok());
    }

    #[test]
    fn test_validate_form_collects_all() {
        let form = form_with(vec![
            FieldDefinition::new("a", FieldType::String, ""),
            FieldDefinition::new("b", FieldType::Select, "Pick"),
            FieldDefinition::new("a", FieldType::Number, "Dup"),
            FieldDefinition::new("c", FieldType::Boolean, "Ok"),
        ]);

        let errors = SchemaValidator::validate_form(&form, ValidationMode::Final).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], SchemaError::EmptyLabel { field_id: "a".into() });
        assert!(matches!(errors[1], SchemaError::InvalidOptions { .. }));
        assert_eq!(errors[2], SchemaError::DuplicateFieldId("a".into()));
        assert_eq!(errors[1].field_id(), "b");

        let draft_errors = SchemaValidator::validate_form(&form, ValidationMode::Draft).unwrap_err();
        assert_eq!(draft_errors.len(), 2);
    }

    #[test]
    fn test_validate_empty_form() {
        assert!(SchemaValidator::validate_form(&form_with(vec![]), ValidationMode::Final).is_ok());
    }
}
