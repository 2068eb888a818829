//! Upload pipeline errors.

use thiserror::Error;

use super::validator::format_megabytes;

fn megabytes_label(bytes: &u64) -> String {
    format_megabytes(*bytes)
}

/// Local rejection of a candidate or a selection. Never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// File larger than the configured maximum.
    #[error("File \"{name}\" exceeds the maximum size of {} MB", megabytes_label(.max))]
    FileTooLarge {
        /// Candidate filename.
        name: String,
        /// Candidate size in bytes.
        size: u64,
        /// Configured maximum in bytes.
        max: u64,
    },

    /// File rejected by the accept filter.
    #[error("File \"{name}\" is not an accepted file type")]
    NotAccepted {
        /// Candidate filename.
        name: String,
    },

    /// Selection larger than `max_files`.
    #[error("You can upload at most {max} files at once")]
    TooManyFiles {
        /// Files in the selection.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// More than one file while multi-selection is disabled.
    #[error("Only one file can be uploaded")]
    SingleFileOnly {
        /// Files in the selection.
        count: usize,
    },
}

/// Failure of a round trip to one of the remote endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The endpoint answered 401.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The endpoint refused the request as malformed (400).
    #[error("{message}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Message from the failure envelope.
        message: String,
    },

    /// The provider behind the endpoint failed (500).
    #[error("{0}")]
    Provider(String),

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The response did not match the expected shape.
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

/// Errors returned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// The ingest round trip failed; nothing from the batch was committed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
