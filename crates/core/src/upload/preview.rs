//! Transient preview references for files not yet persisted.

use std::collections::HashMap;
use std::fmt;

use tracing::warn;
use uuid::Uuid;

use super::types::PendingId;

const PREVIEW_SCHEME: &str = "blob:kindred/";

/// Locally resolvable reference to the bytes of a pending file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewRef(String);

impl PreviewRef {
    fn fresh() -> Self {
        Self(format!("{PREVIEW_SCHEME}{}", Uuid::new_v4()))
    }

    /// The reference as a URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owned map from pending file to its preview reference.
///
/// Every reference handed out by [`allocate`](Self::allocate) must come back
/// through [`release`](Self::release) or [`release_all`](Self::release_all)
/// exactly once.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    live: HashMap<PendingId, PreviewRef>,
    allocated: u64,
    released: u64,
}

impl PreviewRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the reference for `id`. An id that already holds a reference
    /// keeps it.
    pub fn allocate(&mut self, id: PendingId) -> PreviewRef {
        if let Some(existing) = self.live.get(&id) {
            warn!(pending_id = %id, "Preview already allocated");
            return existing.clone();
        }
        let preview = PreviewRef::fresh();
        self.live.insert(id, preview.clone());
        self.allocated += 1;
        preview
    }

    /// Releases the reference for `id`. Returns false if nothing was held.
    pub fn release(&mut self, id: PendingId) -> bool {
        if self.live.remove(&id).is_some() {
            self.released += 1;
            true
        } else {
            warn!(pending_id = %id, "Preview release without a live reference");
            false
        }
    }

    /// Releases every outstanding reference and returns how many were freed.
    pub fn release_all(&mut self) -> usize {
        let count = self.live.len();
        self.live.clear();
        self.released += count as u64;
        count
    }

    /// The live reference for `id`.
    #[must_use]
    pub fn get(&self, id: PendingId) -> Option<&PreviewRef> {
        self.live.get(&id)
    }

    /// References currently held.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.live.len()
    }

    /// Total references ever allocated.
    #[must_use]
    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    /// Total references ever released.
    #[must_use]
    pub fn released(&self) -> u64 {
        self.released
    }
}
