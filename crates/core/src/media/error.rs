//! Media operation errors.

use thiserror::Error;

use crate::storage::StorageError;

/// Media operation errors.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The request carried no file parts.
    #[error("no files provided")]
    NoFiles,

    /// A single provider call failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// At least one file of a batch failed; nothing is reported back.
    #[error("{failed} of {total} files failed to ingest: {source}")]
    BatchFailed {
        /// Number of failed files.
        failed: usize,
        /// Number of files in the batch.
        total: usize,
        /// Files the provider had accepted and that were destroyed again.
        compensated: usize,
        /// First failure in submission order.
        #[source]
        source: StorageError,
    },

    /// The provider answered a destroy call with something other than "ok".
    #[error("provider refused to destroy {public_id}: {result}")]
    DestroyRejected {
        /// Identifier that was targeted.
        public_id: String,
        /// Provider result discriminator.
        result: String,
    },
}

impl MediaError {
    /// Create a destroy rejected error.
    #[must_use]
    pub fn destroy_rejected(public_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self::DestroyRejected {
            public_id: public_id.into(),
            result: result.into(),
        }
    }
}
