//! Storage provider seam.

use async_trait::async_trait;

use super::types::ResourceType;
use crate::storage::StorageError;

/// Options passed along with every ingestion call.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Target folder.
    pub folder: String,
    /// Public identifier inside the folder.
    pub public_id: String,
    /// Resource category detected from the declared MIME type.
    pub resource_type: ResourceType,
    /// Filename the client submitted, kept as metadata.
    pub original_filename: String,
}

/// What the provider reports after ingesting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAsset {
    /// Full identifier (`{folder}/{public_id}`).
    pub public_id: String,
    /// URL the asset is served from.
    pub url: String,
    /// Stored size in bytes.
    pub bytes: u64,
    /// Detected format.
    pub format: Option<String>,
    /// Pixel width for images.
    pub width: Option<u32>,
    /// Pixel height for images.
    pub height: Option<u32>,
    /// Resource category.
    pub resource_type: ResourceType,
}

/// Result discriminator of a destroy call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// The asset was removed.
    Ok,
    /// Nothing is stored under the identifier.
    NotFound,
    /// Any other provider answer.
    Other(String),
}

impl DestroyOutcome {
    /// Provider wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ok => "ok",
            Self::NotFound => "not found",
            Self::Other(result) => result,
        }
    }
}

/// Object storage provider used by the media endpoints.
///
/// Implemented by [`crate::storage::StorageService`] and by test doubles.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Ingests one file given as a base64 data URI.
    async fn ingest(
        &self,
        data_uri: &str,
        options: &IngestOptions,
    ) -> Result<ProviderAsset, StorageError>;

    /// Destroys one asset by its full identifier.
    async fn destroy(&self, public_id: &str) -> Result<DestroyOutcome, StorageError>;
}
