//! Public identifiers, folder names and data URIs.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use uuid::Uuid;

use crate::storage::StorageError;

/// Length of the random suffix appended to public identifiers.
const SUFFIX_LEN: usize = 10;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Sanitize a filename for use in storage keys.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Sanitize a logical folder.
///
/// Each `/`-separated segment is sanitized on its own; empty, `.` and `..`
/// segments are dropped. Falls back to `fallback` when nothing remains.
#[must_use]
pub fn sanitize_folder(folder: &str, fallback: &str) -> String {
    let segments: Vec<String> = folder
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(sanitize_filename)
        .collect();

    if segments.is_empty() {
        fallback.to_string()
    } else {
        segments.join("/")
    }
}

/// Generates a filename-safe random suffix.
#[must_use]
pub fn unique_suffix() -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(SUFFIX_LEN);
    suffix
}

/// Builds the public identifier for a file: `{timestamp_ms}-{base}-{suffix}`.
///
/// `base` is the sanitized filename without its extension.
#[must_use]
pub fn build_public_id(file_name: &str, timestamp_ms: i64, suffix: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let base = sanitize_filename(stem);
    let base = if base.is_empty() { "file" } else { base.as_str() };

    format!("{timestamp_ms}-{base}-{suffix}")
}

/// Lowercased `type/subtype` of a declared MIME type, parameters dropped.
#[must_use]
pub(crate) fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Encodes bytes as a base64 data URI tagged with the essence of `content_type`.
#[must_use]
pub fn encode_data_uri(content_type: &str, bytes: &[u8]) -> String {
    let essence = mime_essence(content_type);
    let essence = if essence.is_empty() || essence.contains(',') {
        FALLBACK_MIME
    } else {
        essence.as_str()
    };
    format!("data:{essence};base64,{}", STANDARD.encode(bytes))
}

/// Decodes a base64 data URI into its MIME type and bytes.
///
/// # Errors
///
/// Returns `StorageError::InvalidDataUri` for anything that is not a base64 data URI.
pub fn decode_data_uri(data_uri: &str) -> Result<(String, Vec<u8>), StorageError> {
    let rest = data_uri
        .strip_prefix("data:")
        .ok_or_else(|| StorageError::InvalidDataUri("missing data: scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| StorageError::InvalidDataUri("missing payload separator".to_string()))?;
    let content_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| StorageError::InvalidDataUri("payload is not base64".to_string()))?;

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| StorageError::InvalidDataUri(e.to_string()))?;

    Ok((content_type.to_string(), bytes))
}
