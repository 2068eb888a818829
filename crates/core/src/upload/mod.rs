//! Client-side upload pipeline.
//!
//! ```text
//! candidates ──▶ validator ──▶ preview registry ──▶ orchestrator ──▶ transport
//!                                                        │
//!                           surface ◀── snapshots ───────┘
//! ```
//!
//! The [`UploadSurface`] receives picks and drops and only issues intents;
//! the [`UploadOrchestrator`] owns the session and is the single writer of
//! its pending and committed lists.

mod error;
mod orchestrator;
mod preview;
mod surface;
mod transport;
mod types;
mod validator;

#[cfg(test)]
mod validator_props;

pub use error::{TransportError, UploadError, ValidationError};
pub use orchestrator::UploadOrchestrator;
pub use preview::{PreviewRef, PreviewRegistry};
pub use surface::{ItemState, ItemView, SurfaceEvent, SurfaceOutcome, SurfaceView, UploadSurface};
pub use transport::{DeleteAction, UploadTransport};
pub use types::{
    CommittedFile, LocalFile, PendingFile, PendingId, SessionSnapshot, SubmitOutcome, UploadPhase,
};
pub use validator::{AcceptFilter, Screening, UploadOptions, format_megabytes, format_size};
