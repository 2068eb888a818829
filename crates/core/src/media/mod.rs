//! Media service for the ingest and removal endpoints.
//!
//! This module provides the server-side half of the upload pipeline:
//! - Batch ingestion with concurrent provider calls and ordered fan-in
//! - Compensation of partially ingested batches
//! - Removal of one persisted file by public identifier
//! - The wire envelopes shared by the endpoints and the HTTP client

mod error;
mod naming;
mod provider;
mod service;
mod types;

pub use error::MediaError;
pub use naming::{
    build_public_id, decode_data_uri, encode_data_uri, sanitize_filename, sanitize_folder,
};
pub use provider::{DestroyOutcome, IngestOptions, MediaProvider, ProviderAsset};
pub use service::MediaService;
pub use types::{
    DestroyRequest, DestroyResponse, ErrorEnvelope, IncomingFile, IngestResponse, MediaFile,
    ResourceType,
};

/// Path of the ingest endpoint.
pub const INGEST_PATH: &str = "/api/upload";

/// Path of the removal endpoint.
pub const DESTROY_PATH: &str = "/api/cloudinary/delete";

/// Multipart field carrying file parts.
pub const FILE_FIELD: &str = "file";

/// Multipart field carrying the logical folder.
pub const FOLDER_FIELD: &str = "folder";
