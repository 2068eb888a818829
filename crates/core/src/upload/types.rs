//! Upload session types.

use bytes::Bytes;

use super::error::ValidationError;
use super::preview::PreviewRef;
use crate::media::MediaFile;

/// A file persisted by the provider, as the ingest endpoint describes it.
pub type CommittedFile = MediaFile;

/// A file picked or dropped on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Filename without directories.
    pub name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Raw bytes.
    pub bytes: Bytes,
}

impl LocalFile {
    /// Creates a local file.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Size in bytes, always the length of `bytes`.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Session-local identity of a pending file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PendingId(pub u64);

impl std::fmt::Display for PendingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pending-{}", self.0)
    }
}

/// A selected file awaiting or undergoing ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    /// Session-local identity.
    pub id: PendingId,
    /// The local handle.
    pub file: LocalFile,
    /// Transient preview reference, absent once released.
    pub preview: Option<PreviewRef>,
}

/// Lifecycle phase of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPhase {
    /// Nothing happened yet, or the session was cleared.
    #[default]
    Idle,
    /// A selection is being screened.
    Validating,
    /// At least one batch is in flight.
    Uploading,
    /// The last batch finished, successfully or not.
    Settled,
}

/// Read-only view of the session published on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current phase.
    pub phase: UploadPhase,
    /// Whether any batch is in flight.
    pub uploading: bool,
    /// Error shown to the user, if any.
    pub error: Option<String>,
    /// Pending files in selection order.
    pub pending: Vec<PendingFile>,
    /// Committed files in arrival order.
    pub committed: Vec<CommittedFile>,
}

/// Result of a settled `submit` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Files committed by this call, in submission order.
    pub committed: Vec<CommittedFile>,
    /// Candidates the validator turned away.
    pub rejected: Vec<ValidationError>,
}

impl SubmitOutcome {
    /// True when the call neither committed nor rejected anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.rejected.is_empty()
    }
}
