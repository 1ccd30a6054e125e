//! # FormKit Core
//!
//! Typed form definitions and response binding.
//! This crate provides the field type registry, the schema validator, value
//! coercion, the response binder, and the edit and persistence layer built
//! on them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod binder;
pub mod blob;
pub mod coercion;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod registry;
pub mod schema;
pub mod session;
pub mod store;
pub mod utils;

/// Re-export common types for ease of use
pub use binder::{BoundResponse, Reconciliation, ResponseBinder};
pub use blob::{BlobEncoder, DataUrlEncoder};
pub use coercion::{coerce, CoercionError};
pub use config::CoreConfig;
pub use error::{CoreError, Result};
pub use models::{Datum, FieldDefinition, FieldValue, FormDefinition, ResponseRecord};
pub use registry::{describe, FieldType, ValueKind};
pub use schema::{SchemaError, SchemaValidator, ValidationMode};
pub use session::{EditorSession, ResponseSession};
pub use store::{FieldUpdate, FormBuilder, FormRepository, JsonFileStore, MemoryStore, Persistence};

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
