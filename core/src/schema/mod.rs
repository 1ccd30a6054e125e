//! Form schema validation
//!
//! This module checks field and form definitions for well-formedness before
//! they are saved or used to bind responses.

mod validator;

pub use validator::{SchemaError, SchemaValidator, ValidationMode, ValidationResult};
