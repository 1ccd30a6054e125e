//! Form definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto;
use super::domains;
use super::field::FieldDefinition;

/// Placeholder name for forms saved without one
pub const DEFAULT_FORM_NAME: &str = "Untitled Form";

/// Authoring metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormMeta {
    /// Author identifier
    pub creator_id: String,

    /// Whether the form is offered for filling
    pub is_active: bool,

    /// Creation time, fixed after the first save
    pub created: DateTime<Utc>,

    /// Time of the last edit or save
    pub modified: DateTime<Utc>,

    /// Number of saves so far
    #[serde(default)]
    pub revision: u32,

    /// Locations the form applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Option<String>>>,
}

impl FormMeta {
    /// Fresh metadata stamped at `now`
    pub fn new(creator_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        FormMeta {
            creator_id: creator_id.into(),
            is_active: true,
            created: now,
            modified: now,
            revision: 0,
            locations: None,
        }
    }
}

/// Comment attached to a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionItem {
    /// Author identifier
    pub creator_id: String,

    /// Time the comment was posted
    pub send_date: DateTime<Utc>,

    /// Comment body
    pub content: String,
}

/// A form: metadata plus an ordered field list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    /// Stable identifier
    #[serde(rename = "_id")]
    pub id: String,

    /// Display name
    pub name: String,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Users the form is assigned to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,

    /// Authoring metadata
    pub meta: FormMeta,

    /// Fields in display order
    #[serde(rename = "formFields")]
    pub fields: Vec<FieldDefinition>,

    /// Comments on the form
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discussion: Vec<DiscussionItem>,
}

impl FormDefinition {
    /// Create an empty form
    pub fn new(id: impl Into<String>, name: impl Into<String>, meta: FormMeta) -> Self {
        FormDefinition {
            id: id.into(),
            name: name.into(),
            description: None,
            assignees: None,
            meta,
            fields: Vec::new(),
            discussion: Vec::new(),
        }
    }

    /// Get a field by id
    pub fn field(&self, field_id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    /// Check if the form has a field
    pub fn has_field(&self, field_id: &str) -> bool {
        self.fields.iter().any(|f| f.id == field_id)
    }

    /// Position of a field in display order
    pub fn position(&self, field_id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id == field_id)
    }

    /// Field ids in display order
    pub fn field_ids(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.id.as_str()).collect()
    }

    /// Name, or the placeholder when blank
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            DEFAULT_FORM_NAME
        } else {
            &self.name
        }
    }

    /// Hex digest of the field list.
    ///
    /// Metadata and discussion are excluded, so only structural edits
    /// change the fingerprint.
    pub fn fingerprint(&self) -> String {
        let fields_json = serde_json::to_vec(&self.fields).unwrap_or_default();
        crypto::fingerprint(domains::FORM_FIELDS, &fields_json)
    }
}
