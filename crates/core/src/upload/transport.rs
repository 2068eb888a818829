//! Seams to the remote endpoints.

use async_trait::async_trait;

use super::error::TransportError;
use super::types::{CommittedFile, LocalFile};

/// One batched round trip to the ingest endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Sends `files` to `folder` and returns one committed file per input,
    /// in input order.
    async fn ingest(
        &self,
        folder: &str,
        files: Vec<LocalFile>,
    ) -> Result<Vec<CommittedFile>, TransportError>;
}

/// Remote removal of a committed file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeleteAction: Send + Sync {
    /// Deletes the persisted file identified by `public_id`.
    async fn delete(&self, public_id: &str) -> Result<(), TransportError>;
}
