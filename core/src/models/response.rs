//! Response records

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::value::FieldValue;

/// Answer to one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datum {
    /// Field the answer belongs to
    #[serde(rename = "_id")]
    pub field_id: String,

    /// Answer value
    pub value: FieldValue,
}

impl Datum {
    /// Create a datum
    pub fn new(field_id: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Datum {
            field_id: field_id.into(),
            value: value.into(),
        }
    }
}

/// The answers given to one form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    /// Form this record answers; one record per form
    pub form_id: String,

    /// Answers to fields of the form
    pub datums: Vec<Datum>,

    /// Answers whose field has since been removed from the form
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orphaned: Vec<Datum>,

    /// Fingerprint of the form's field list at bind time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_fingerprint: Option<String>,
}

impl ResponseRecord {
    /// Create an empty record
    pub fn new(form_id: impl Into<String>) -> Self {
        ResponseRecord {
            form_id: form_id.into(),
            datums: Vec::new(),
            orphaned: Vec::new(),
            form_fingerprint: None,
        }
    }

    /// Get the active datum for a field
    pub fn datum(&self, field_id: &str) -> Option<&Datum> {
        self.datums.iter().find(|d| d.field_id == field_id)
    }

    /// Get the active value for a field
    pub fn value(&self, field_id: &str) -> Option<&FieldValue> {
        self.datum(field_id).map(|d| &d.value)
    }

    /// Number of non-empty active answers
    pub fn answered_count(&self) -> usize {
        self.datums.iter().filter(|d| !d.value.is_empty()).count()
    }

    /// Active values keyed by field id
    pub fn values_by_field(&self) -> HashMap<String, FieldValue> {
        self.datums
            .iter()
            .map(|d| (d.field_id.clone(), d.value.clone()))
            .collect()
    }
}
