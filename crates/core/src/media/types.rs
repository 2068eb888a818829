//! Media types and wire envelopes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Resource category assigned to an ingested file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Still image.
    Image,
    /// Video or animated media.
    Video,
    /// Anything else, stored as opaque bytes.
    #[default]
    Raw,
}

impl ResourceType {
    /// Detects the category from a declared MIME type.
    #[must_use]
    pub fn detect(content_type: &str) -> Self {
        let essence = super::naming::mime_essence(content_type);

        if essence.starts_with("image/") {
            Self::Image
        } else if essence.starts_with("video/") {
            Self::Video
        } else {
            Self::Raw
        }
    }

    /// Wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Raw => "raw",
        }
    }
}

/// One binary part received by the ingest endpoint.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Original filename as sent by the client.
    pub file_name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Raw bytes.
    pub bytes: Bytes,
}

impl IncomingFile {
    /// Creates an incoming file.
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Metadata of a file persisted by the provider, as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    /// Provider-assigned identifier, including the folder prefix.
    pub public_id: String,
    /// URL the file is served from.
    pub url: String,
    /// Filename the client submitted.
    pub original_name: String,
    /// Size in bytes.
    pub size: u64,
    /// Detected format (`png`, `jpeg`, `pdf`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Pixel width for images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Pixel height for images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Resource category.
    pub resource_type: ResourceType,
}

/// Successful ingest response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Always `true`.
    pub success: bool,
    /// Files in submission order.
    pub files: Vec<MediaFile>,
    /// Number of files.
    pub count: usize,
}

impl IngestResponse {
    /// Wraps an ordered list of files.
    #[must_use]
    pub fn new(files: Vec<MediaFile>) -> Self {
        Self {
            success: true,
            count: files.len(),
            files,
        }
    }
}

/// Failure envelope used by both endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always `false`.
    pub success: bool,
    /// Human readable message.
    #[serde(default)]
    pub message: String,
}

impl ErrorEnvelope {
    /// Creates a failure envelope.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Body of a removal request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestroyRequest {
    /// Identifier to remove.
    #[serde(default)]
    pub public_id: Option<String>,
}

/// Successful removal response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestroyResponse {
    /// Always `true`.
    pub success: bool,
    /// Acknowledgement text.
    pub message: String,
}
