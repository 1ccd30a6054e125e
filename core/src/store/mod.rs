//! Form definition store
//!
//! Pure edit operations over form definitions, the persistence collaborator
//! interface, and the repository that upserts forms and responses by id.

mod builder;
mod persistence;
mod repository;

pub use builder::{FieldUpdate, FormBuilder};
pub use persistence::{JsonFileStore, MemoryStore, Persistence};
pub use repository::{FormRepository, FormSummary, SaveOutcome};
