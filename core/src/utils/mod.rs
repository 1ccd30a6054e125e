//! Utility functions and collaborators
//!
//! Identity and clock collaborators used by the form builder and the
//! repository, plus string helpers for list-valued editor inputs.

pub mod string;

pub use string::StringUtils;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of fresh identifiers
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator {
    /// A new identifier, never repeated within the process
    fn next_id(&self) -> String;
}

/// Source of the current time
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    /// Current timestamp
    fn now(&self) -> DateTime<Utc>;
}

/// Random 128-bit identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        generate_uuid().to_string()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Generate a UUID v4
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}
