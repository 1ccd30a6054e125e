//! Value coercion and validation
//!
//! Turns a raw input value into the canonical representation of a field's
//! type, then checks it against the field's constraints. Required-ness is
//! checked last and uniformly for every type. Coercing a value that is
//! already canonical returns it unchanged.

use chrono::{DateTime, NaiveDate};
use thiserror::Error;

use crate::models::{BlobRef, Constraints, Coordinate, FieldDefinition, FieldKind, FieldValue};
use crate::registry::ValueKind;

/// Value coercion error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    /// Input is not a finite number
    #[error("Field {field_id}: '{input}' is not a number")]
    NotANumber {
        /// Offending field
        field_id: String,
        /// Raw input
        input: String,
    },

    /// Number outside the inclusive bounds
    #[error("Field {field_id}: {value} is out of range")]
    OutOfRange {
        /// Offending field
        field_id: String,
        /// Coerced value
        value: f64,
        /// Lower bound
        min: Option<f64>,
        /// Upper bound
        max: Option<f64>,
    },

    /// Number equal to the forbidden value
    #[error("Field {field_id}: value must not equal {value}")]
    ForbiddenValue {
        /// Offending field
        field_id: String,
        /// Coerced value
        value: f64,
    },

    /// Input is not a calendar date
    #[error("Field {field_id}: '{input}' is not a valid date")]
    InvalidDate {
        /// Offending field
        field_id: String,
        /// Raw input
        input: String,
    },

    /// Input is not one of the declared options
    #[error("Field {field_id}: '{value}' is not one of the options")]
    InvalidOption {
        /// Offending field
        field_id: String,
        /// Raw input
        value: String,
    },

    /// Input is not a well-formed coordinate
    #[error("Field {field_id}: invalid location ({reason})")]
    InvalidLocation {
        /// Offending field
        field_id: String,
        /// What is malformed
        reason: String,
    },

    /// Input kind cannot be coerced into the field's kind
    #[error("Field {field_id}: expected {expected}, got {found}")]
    TypeMismatch {
        /// Offending field
        field_id: String,
        /// Canonical kind of the field
        expected: ValueKind,
        /// Kind of the input
        found: ValueKind,
    },

    /// Required field left empty
    #[error("Field {field_id} is required")]
    RequiredFieldMissing {
        /// Offending field
        field_id: String,
    },

    /// Field type outside the catalog
    #[error("Field {field_id} has unsupported type {data_type}")]
    UnknownFieldType {
        /// Offending field
        field_id: String,
        /// Stored type tag
        data_type: String,
    },
}

impl CoercionError {
    /// Field the error refers to
    pub fn field_id(&self) -> &str {
        match self {
            CoercionError::NotANumber { field_id, .. }
            | CoercionError::OutOfRange { field_id, .. }
            | CoercionError::ForbiddenValue { field_id, .. }
            | CoercionError::InvalidDate { field_id, .. }
            | CoercionError::InvalidOption { field_id, .. }
            | CoercionError::InvalidLocation { field_id, .. }
            | CoercionError::TypeMismatch { field_id, .. }
            | CoercionError::RequiredFieldMissing { field_id }
            | CoercionError::UnknownFieldType { field_id, .. } => field_id,
        }
    }
}

/// Coerce `raw` into the canonical value for `field`
pub fn coerce(field: &FieldDefinition, raw: &FieldValue) -> Result<FieldValue, CoercionError> {
    let value = match field.kind() {
        FieldKind::String | FieldKind::RequestForInformation => coerce_text(field, raw)?,
        FieldKind::Number { constraints } | FieldKind::Measurement { constraints, .. } => {
            let value = coerce_number(field, raw)?;
            check_constraints(field, &value, &constraints)?;
            value
        }
        FieldKind::Boolean => coerce_boolean(raw),
        FieldKind::Date => coerce_date(field, raw)?,
        FieldKind::Select { options } => coerce_choice(field, raw, options)?,
        FieldKind::File { .. } | FieldKind::Photo { .. } => coerce_blob(field, raw)?,
        FieldKind::Location => coerce_location(field, raw)?,
        FieldKind::Unsupported(tag) => {
            return Err(CoercionError::UnknownFieldType {
                field_id: field.id.clone(),
                data_type: tag.to_string(),
            })
        }
    };

    if field.required && value.is_empty() {
        return Err(CoercionError::RequiredFieldMissing {
            field_id: field.id.clone(),
        });
    }

    Ok(value)
}

fn mismatch(field: &FieldDefinition, expected: ValueKind, raw: &FieldValue) -> CoercionError {
    CoercionError::TypeMismatch {
        field_id: field.id.clone(),
        expected,
        // Empty inputs never reach here
        found: raw.kind().unwrap_or(expected),
    }
}

fn coerce_text(field: &FieldDefinition, raw: &FieldValue) -> Result<FieldValue, CoercionError> {
    match raw {
        FieldValue::Empty => Ok(FieldValue::Empty),
        FieldValue::Text(s) => Ok(FieldValue::Text(s.clone())),
        FieldValue::Choice(_) | FieldValue::Number(_) | FieldValue::Boolean(_) | FieldValue::Date(_) => {
            Ok(FieldValue::Text(raw.to_string()))
        }
        FieldValue::Blob(_) | FieldValue::Location(_) => Err(mismatch(field, ValueKind::Text, raw)),
    }
}

fn coerce_number(field: &FieldDefinition, raw: &FieldValue) -> Result<FieldValue, CoercionError> {
    let not_a_number = |input: String| CoercionError::NotANumber {
        field_id: field.id.clone(),
        input,
    };

    match raw {
        FieldValue::Empty => Ok(FieldValue::Empty),
        FieldValue::Number(n) if n.is_finite() => Ok(FieldValue::Number(*n)),
        FieldValue::Number(n) => Err(not_a_number(n.to_string())),
        FieldValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(FieldValue::Empty);
            }
            match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(FieldValue::Number(n)),
                _ => Err(not_a_number(s.clone())),
            }
        }
        _ => Err(mismatch(field, ValueKind::Number, raw)),
    }
}

fn check_constraints(
    field: &FieldDefinition,
    value: &FieldValue,
    constraints: &Constraints,
) -> Result<(), CoercionError> {
    let n = match value.as_number() {
        Some(n) => n,
        None => return Ok(()),
    };

    let below = constraints.min.map_or(false, |min| n < min);
    let above = constraints.max.map_or(false, |max| n > max);
    if below || above {
        return Err(CoercionError::OutOfRange {
            field_id: field.id.clone(),
            value: n,
            min: constraints.min,
            max: constraints.max,
        });
    }

    if constraints.neq == Some(n) {
        return Err(CoercionError::ForbiddenValue {
            field_id: field.id.clone(),
            value: n,
        });
    }

    Ok(())
}

/// Truthiness of an arbitrary input.
///
/// Text is true unless blank or one of `false`, `0`, `no`, `off`
/// (case-insensitive).
pub fn truthiness(raw: &FieldValue) -> bool {
    match raw {
        FieldValue::Empty => false,
        FieldValue::Boolean(b) => *b,
        FieldValue::Number(n) => *n != 0.0 && !n.is_nan(),
        FieldValue::Text(s) => {
            let s = s.trim().to_ascii_lowercase();
            !matches!(s.as_str(), "" | "false" | "0" | "no" | "off")
        }
        FieldValue::Choice(s) => !s.trim().is_empty(),
        FieldValue::Date(_) => true,
        FieldValue::Blob(blob) => !blob.data.is_empty(),
        FieldValue::Location(c) => c.is_some(),
    }
}

fn coerce_boolean(raw: &FieldValue) -> FieldValue {
    match raw {
        // Absent stays absent so a required checkbox can be reported
        FieldValue::Empty => FieldValue::Empty,
        other => FieldValue::Boolean(truthiness(other)),
    }
}

fn coerce_date(field: &FieldDefinition, raw: &FieldValue) -> Result<FieldValue, CoercionError> {
    match raw {
        FieldValue::Empty => Ok(FieldValue::Empty),
        FieldValue::Date(d) => Ok(FieldValue::Date(*d)),
        FieldValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(FieldValue::Empty);
            }
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
                .map(FieldValue::Date)
                .map_err(|_| CoercionError::InvalidDate {
                    field_id: field.id.clone(),
                    input: s.clone(),
                })
        }
        _ => Err(mismatch(field, ValueKind::Date, raw)),
    }
}

fn coerce_choice(
    field: &FieldDefinition,
    raw: &FieldValue,
    options: &[String],
) -> Result<FieldValue, CoercionError> {
    let selected = match raw {
        FieldValue::Empty => return Ok(FieldValue::Empty),
        FieldValue::Text(s) | FieldValue::Choice(s) => s,
        _ => return Err(mismatch(field, ValueKind::Choice, raw)),
    };

    // Blank counts as unanswered, as for text
    if selected.trim().is_empty() {
        Ok(FieldValue::Empty)
    } else if options.iter().any(|o| o == selected) {
        Ok(FieldValue::Choice(selected.clone()))
    } else {
        Err(CoercionError::InvalidOption {
            field_id: field.id.clone(),
            value: selected.clone(),
        })
    }
}

fn coerce_blob(field: &FieldDefinition, raw: &FieldValue) -> Result<FieldValue, CoercionError> {
    match raw {
        FieldValue::Empty => Ok(FieldValue::Empty),
        FieldValue::Blob(blob) => Ok(FieldValue::Blob(BlobRef::clone(blob))),
        FieldValue::Text(s) if s.trim().is_empty() => Ok(FieldValue::Empty),
        _ => Err(mismatch(field, ValueKind::Blob, raw)),
    }
}

fn coerce_location(field: &FieldDefinition, raw: &FieldValue) -> Result<FieldValue, CoercionError> {
    let invalid = |reason: &str| CoercionError::InvalidLocation {
        field_id: field.id.clone(),
        reason: reason.to_string(),
    };

    match raw {
        FieldValue::Empty => Ok(FieldValue::Empty),
        FieldValue::Location(None) => Ok(FieldValue::Location(None)),
        FieldValue::Location(Some(c)) if c.is_well_formed() => Ok(FieldValue::Location(Some(*c))),
        FieldValue::Location(Some(_)) => Err(invalid("non-finite coordinate")),
        FieldValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(FieldValue::Empty);
            }
            let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
            match parts.as_slice() {
                [lat, lng] => match (lat.parse::<f64>(), lng.parse::<f64>()) {
                    (Ok(lat), Ok(lng)) => {
                        let coordinate = Coordinate::new(lat, lng);
                        if coordinate.is_well_formed() {
                            Ok(FieldValue::Location(Some(coordinate)))
                        } else {
                            Err(invalid("non-finite coordinate"))
                        }
                    }
                    _ => Err(invalid("expected two numbers")),
                },
                _ => Err(invalid("expected 'latitude,longitude'")),
            }
        }
        _ => Err(mismatch(field, ValueKind::Coordinate, raw)),
    }
}
