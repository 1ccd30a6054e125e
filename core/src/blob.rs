//! Blob encoding for file and photo answers
//!
//! The core never stores file bytes directly. A [`BlobEncoder`] turns a
//! selected file into a [`BlobRef`] whose `data` is an opaque encoded string;
//! [`DataUrlEncoder`] produces base64 data URLs.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;

use crate::error::{to_blob_error, CoreError, Result};
use crate::models::{BlobRef, FieldDefinition};
use crate::utils::StringUtils;

/// Turns file contents into blob references
#[cfg_attr(test, mockall::automock)]
pub trait BlobEncoder {
    /// Encode `bytes` read from a file called `name`
    fn encode(&self, name: &str, bytes: &[u8]) -> Result<BlobRef>;
}

/// Encodes files as `data:<mime>;base64,<payload>` URLs
#[derive(Debug, Clone, Default)]
pub struct DataUrlEncoder {
    /// Largest accepted file, in bytes; unlimited when `None`
    pub max_bytes: Option<usize>,
}

impl DataUrlEncoder {
    /// Create an encoder with no size limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder that refuses files larger than `max_bytes`
    pub fn with_limit(max_bytes: usize) -> Self {
        DataUrlEncoder {
            max_bytes: Some(max_bytes),
        }
    }
}

impl BlobEncoder for DataUrlEncoder {
    fn encode(&self, name: &str, bytes: &[u8]) -> Result<BlobRef> {
        if let Some(limit) = self.max_bytes {
            if bytes.len() > limit {
                return Err(CoreError::BlobError(format!(
                    "{} is {} bytes, limit is {}",
                    name,
                    bytes.len(),
                    limit
                )));
            }
        }

        let mime = mime_guess::from_path(name).first_or_octet_stream();
        let data = format!("data:{};base64,{}", mime.essence_str(), STANDARD.encode(bytes));
        debug!("Encoded {} ({} bytes) as {}", name, bytes.len(), mime.essence_str());

        Ok(BlobRef {
            name: name.to_string(),
            data,
            mime_type: Some(mime.essence_str().to_string()),
        })
    }
}

/// Split a base64 data URL into its MIME type and decoded bytes
pub fn decode_data_url(data: &str) -> Result<(String, Vec<u8>)> {
    let rest = data
        .strip_prefix("data:")
        .ok_or_else(|| CoreError::BlobError("not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CoreError::BlobError("data URL has no payload".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| CoreError::BlobError("data URL is not base64 encoded".to_string()))?;

    let bytes = STANDARD.decode(payload).map_err(to_blob_error)?;
    Ok((mime.to_string(), bytes))
}

/// Whether a file matches a file type filter.
///
/// Patterns are `.ext`, `type/subtype` or `type/*`, compared without regard
/// to case. An empty filter accepts everything; blank patterns match
/// nothing.
pub fn accepts_file_type(patterns: &[String], name: &str, mime: Option<&str>) -> bool {
    if patterns.is_empty() {
        return true;
    }

    let name = name.to_ascii_lowercase();
    let mime = mime
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| mime_guess::from_path(&name).first_or_octet_stream().essence_str().to_string());

    patterns.iter().any(|pattern| {
        let pattern = pattern.trim().to_ascii_lowercase();
        if pattern.is_empty() {
            false
        } else if pattern.starts_with('.') {
            name.ends_with(&pattern)
        } else if let Some(major) = pattern.strip_suffix("/*") {
            mime.split('/').next() == Some(major)
        } else {
            mime == pattern
        }
    })
}

/// Encode a file for `field`, enforcing the field's file type filter
pub fn encode_for_field(
    encoder: &dyn BlobEncoder,
    field: &FieldDefinition,
    name: &str,
    bytes: &[u8],
) -> Result<BlobRef> {
    let accepted = field.accepted_file_types();
    let blob = encoder.encode(name, bytes)?;
    if !accepts_file_type(&accepted, name, blob.mime_type.as_deref()) {
        return Err(CoreError::BlobError(format!(
            "{} is not accepted by field {} ({})",
            name,
            field.id,
            StringUtils::join_list(&accepted)
        )));
    }
    Ok(blob)
}
