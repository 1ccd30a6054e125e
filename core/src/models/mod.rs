//! Data models for forms and responses
//!
//! This module provides the records that cross the persistence boundary:
//! field and form definitions, typed field values, and response records.

mod field;
mod form;
mod response;
mod value;

pub use field::{Constraints, DataType, FieldConfig, FieldDefinition, FieldKind};
pub use form::{DiscussionItem, FormDefinition, FormMeta, DEFAULT_FORM_NAME};
pub use response::{Datum, ResponseRecord};
pub use value::{BlobRef, Coordinate, FieldValue};

/// Domain constants for fingerprints
pub mod domains {
    /// Domain for a form's field list
    pub const FORM_FIELDS: &str = "FORMKIT_FORM_FIELDS";
}
