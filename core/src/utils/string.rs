//! String utility functions
//!
//! Helpers for the comma-separated inputs the editor uses for select options
//! and file type filters.

/// String utility functions
#[derive(Debug)]
pub struct StringUtils;

impl StringUtils {
    /// Split a comma-separated list, trimming every entry.
    ///
    /// Empty entries are kept so the validator can point at them.
    pub fn split_list(s: &str) -> Vec<String> {
        if s.trim().is_empty() {
            return Vec::new();
        }
        s.split(',').map(|part| part.trim().to_string()).collect()
    }

    /// Join a list for display in a single text input
    pub fn join_list(items: &[String]) -> String {
        items.join(", ")
    }

    /// Check if a string is empty or whitespace only
    pub fn is_blank(s: &str) -> bool {
        s.trim().is_empty()
    }
}
