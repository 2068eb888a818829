//! Interactive boundary of the upload pipeline.
//!
//! The surface turns user events into orchestrator intents and renders the
//! latest session snapshot. It never edits session state itself.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use super::error::UploadError;
use super::orchestrator::UploadOrchestrator;
use super::transport::DeleteAction;
use super::types::{LocalFile, PendingId, SessionSnapshot, SubmitOutcome};
use super::validator::{format_megabytes, format_size};

const PROMPT_IDLE: &str = "Drag & drop files here, or click to select";
const PROMPT_DRAG: &str = "Drop the files here...";
const PROMPT_UPLOADING: &str = "Uploading...";

/// User interaction delivered to the surface.
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    /// A drag entered the drop zone.
    DragEnter,
    /// The drag left without dropping.
    DragLeave,
    /// Files dropped on the zone.
    Drop(Vec<LocalFile>),
    /// Files chosen from the picker.
    Pick(Vec<LocalFile>),
    /// Remove button on a pending item.
    RemovePending(PendingId),
    /// Remove button on a committed item.
    RemoveCommitted(String),
    /// Clear all button.
    ClearAll,
    /// Close button on the error banner.
    DismissError,
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOutcome {
    /// Nothing changed.
    Ignored,
    /// Local state changed.
    Changed,
    /// A selection settled.
    Submitted(SubmitOutcome),
    /// A selection failed in transport.
    Failed(UploadError),
}

/// State of one rendered item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    /// Bytes are on their way to the provider.
    Uploading,
    /// Persisted by the provider.
    Committed,
}

/// One row of the rendered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    /// Key to address the item in a remove event.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Human readable size.
    pub size: String,
    /// Preview reference for pending items, served URL for committed ones.
    pub source: Option<String>,
    /// Item state.
    pub state: ItemState,
}

/// Rendered surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceView {
    /// Drop zone prompt.
    pub prompt: String,
    /// Limits hint under the prompt.
    pub hint: String,
    /// Whether a drag hovers the zone.
    pub drag_active: bool,
    /// Whether new selections are accepted.
    pub accepting: bool,
    /// Dismissable error banner.
    pub error: Option<String>,
    /// Pending items first, then committed ones.
    pub items: Vec<ItemView>,
    /// Whether the clear all control is shown.
    pub can_clear: bool,
}

impl fmt::Display for SurfaceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[ {} ]", self.prompt)?;
        writeln!(f, "  {}", self.hint)?;
        if let Some(error) = &self.error {
            writeln!(f, "  ! {error}")?;
        }
        for item in &self.items {
            let marker = match item.state {
                ItemState::Uploading => "..",
                ItemState::Committed => "ok",
            };
            write!(f, "  [{marker}] {} ({})", item.name, item.size)?;
            if let Some(source) = &item.source {
                write!(f, " {source}")?;
            }
            writeln!(f)?;
        }
        if self.can_clear {
            writeln!(f, "  {} file(s), clear all available", self.items.len())?;
        }
        Ok(())
    }
}

/// Drop zone bound to one orchestrator.
pub struct UploadSurface {
    orchestrator: Arc<UploadOrchestrator>,
    delete_action: Option<Arc<dyn DeleteAction>>,
    drag_active: AtomicBool,
}

impl UploadSurface {
    /// Mounts a surface over `orchestrator`.
    #[must_use]
    pub fn new(orchestrator: Arc<UploadOrchestrator>) -> Self {
        Self {
            orchestrator,
            delete_action: None,
            drag_active: AtomicBool::new(false),
        }
    }

    /// Wires a remote delete that runs after a committed item is removed.
    #[must_use]
    pub fn with_delete_action(mut self, action: Arc<dyn DeleteAction>) -> Self {
        self.delete_action = Some(action);
        self
    }

    /// The orchestrator behind the surface.
    #[must_use]
    pub fn orchestrator(&self) -> &Arc<UploadOrchestrator> {
        &self.orchestrator
    }

    /// Handles one event.
    pub async fn handle(&self, event: SurfaceEvent) -> SurfaceOutcome {
        match event {
            SurfaceEvent::DragEnter => self.set_drag(true),
            SurfaceEvent::DragLeave => self.set_drag(false),
            SurfaceEvent::Drop(files) | SurfaceEvent::Pick(files) => {
                self.drag_active.store(false, Ordering::SeqCst);
                self.admit(files).await
            }
            SurfaceEvent::RemovePending(id) => match self.orchestrator.remove_pending(id) {
                Some(_) => SurfaceOutcome::Changed,
                None => SurfaceOutcome::Ignored,
            },
            SurfaceEvent::RemoveCommitted(public_id) => self.remove_committed(&public_id).await,
            SurfaceEvent::ClearAll => {
                self.orchestrator.clear_all();
                SurfaceOutcome::Changed
            }
            SurfaceEvent::DismissError => {
                self.orchestrator.dismiss_error();
                SurfaceOutcome::Changed
            }
        }
    }

    /// Renders the current snapshot.
    #[must_use]
    pub fn view(&self) -> SurfaceView {
        self.render(&self.orchestrator.snapshot())
    }

    fn set_drag(&self, active: bool) -> SurfaceOutcome {
        if self.drag_active.swap(active, Ordering::SeqCst) == active {
            SurfaceOutcome::Ignored
        } else {
            SurfaceOutcome::Changed
        }
    }

    async fn admit(&self, files: Vec<LocalFile>) -> SurfaceOutcome {
        if files.is_empty() {
            return SurfaceOutcome::Ignored;
        }
        if self.orchestrator.snapshot().uploading {
            debug!(files = files.len(), "Selection ignored while uploading");
            return SurfaceOutcome::Ignored;
        }
        match self.orchestrator.submit(files).await {
            Ok(outcome) => SurfaceOutcome::Submitted(outcome),
            Err(e) => SurfaceOutcome::Failed(e),
        }
    }

    async fn remove_committed(&self, public_id: &str) -> SurfaceOutcome {
        if self.orchestrator.remove_committed(public_id).is_none() {
            return SurfaceOutcome::Ignored;
        }
        if let Some(action) = &self.delete_action
            && let Err(e) = action.delete(public_id).await
        {
            warn!(public_id, error = %e, "Remote delete failed");
            self.orchestrator.record_error(e.to_string());
        }
        SurfaceOutcome::Changed
    }

    fn render(&self, snapshot: &SessionSnapshot) -> SurfaceView {
        let drag_active = self.drag_active.load(Ordering::SeqCst);
        let prompt = if snapshot.uploading {
            PROMPT_UPLOADING
        } else if drag_active {
            PROMPT_DRAG
        } else {
            PROMPT_IDLE
        };

        let pending = snapshot.pending.iter().map(|p| ItemView {
            key: p.id.to_string(),
            name: p.file.name.clone(),
            size: format_size(p.file.size()),
            source: p.preview.as_ref().map(ToString::to_string),
            state: ItemState::Uploading,
        });
        let committed = snapshot.committed.iter().map(|c| ItemView {
            key: c.public_id.clone(),
            name: c.original_name.clone(),
            size: format_size(c.size),
            source: Some(c.url.clone()),
            state: ItemState::Committed,
        });
        let items: Vec<ItemView> = pending.chain(committed).collect();

        SurfaceView {
            prompt: prompt.to_string(),
            hint: self.hint(),
            drag_active,
            accepting: !snapshot.uploading,
            error: snapshot.error.clone(),
            can_clear: !items.is_empty(),
            items,
        }
    }

    fn hint(&self) -> String {
        let options = self.orchestrator.options();
        let size = format_megabytes(options.max_size);
        let mut hint = if options.multiple {
            format!("Up to {} files, {size} MB each", options.max_files)
        } else {
            format!("One file, up to {size} MB")
        };
        if !options.accept.is_any() {
            hint.push_str(&format!(" ({})", options.accept));
        }
        hint
    }
}

impl Drop for UploadSurface {
    fn drop(&mut self) {
        self.orchestrator.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ResourceType;
    use crate::upload::error::TransportError;
    use crate::upload::transport::{MockDeleteAction, UploadTransport};
    use crate::upload::types::CommittedFile;
    use crate::upload::validator::{AcceptFilter, UploadOptions};
    use async_trait::async_trait;
    use mockall::predicate::eq;
    use tokio::sync::Notify;

    struct GatedTransport {
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl UploadTransport for GatedTransport {
        async fn ingest(
            &self,
            folder: &str,
            files: Vec<LocalFile>,
        ) -> Result<Vec<CommittedFile>, TransportError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(files
                .into_iter()
                .map(|f| CommittedFile {
                    public_id: format!("{folder}/{}", f.name),
                    url: format!("https://cdn.test/{folder}/{}", f.name),
                    size: f.size(),
                    original_name: f.name,
                    format: None,
                    width: None,
                    height: None,
                    resource_type: ResourceType::Raw,
                })
                .collect())
        }
    }

    fn surface_with(gate: Option<Arc<Notify>>, options: UploadOptions) -> UploadSurface {
        let orchestrator = UploadOrchestrator::new(Arc::new(GatedTransport { gate }), options);
        UploadSurface::new(Arc::new(orchestrator))
    }

    fn surface() -> UploadSurface {
        surface_with(None, UploadOptions::default())
    }

    fn file(name: &str) -> LocalFile {
        LocalFile::new(name, "text/plain", b"hello".to_vec())
    }

    #[tokio::test]
    async fn test_drag_changes_prompt() {
        let surface = surface();
        assert_eq!(surface.view().prompt, PROMPT_IDLE);

        assert_eq!(surface.handle(SurfaceEvent::DragEnter).await, SurfaceOutcome::Changed);
        assert_eq!(surface.handle(SurfaceEvent::DragEnter).await, SurfaceOutcome::Ignored);
        assert_eq!(surface.view().prompt, PROMPT_DRAG);

        surface.handle(SurfaceEvent::DragLeave).await;
        assert!(!surface.view().drag_active);
    }

    #[tokio::test]
    async fn test_drop_submits_and_renders_committed() {
        let surface = surface();
        surface.handle(SurfaceEvent::DragEnter).await;

        let outcome = surface
            .handle(SurfaceEvent::Drop(vec![file("a.txt"), file("b.txt")]))
            .await;

        let SurfaceOutcome::Submitted(outcome) = outcome else {
            panic!("expected a submitted outcome");
        };
        assert_eq!(outcome.committed.len(), 2);

        let view = surface.view();
        assert!(!view.drag_active);
        assert!(view.accepting);
        assert!(view.can_clear);
        assert_eq!(view.items[0].key, "uploads/a.txt");
        assert_eq!(view.items[0].size, "5 B");
        assert_eq!(view.items[1].state, ItemState::Committed);
    }

    #[tokio::test]
    async fn test_selection_ignored_while_uploading() {
        let gate = Arc::new(Notify::new());
        let surface = Arc::new(surface_with(Some(gate.clone()), UploadOptions::default()));

        let first = tokio::spawn({
            let surface = surface.clone();
            async move { surface.handle(SurfaceEvent::Pick(vec![file("a.txt")])).await }
        });
        surface
            .orchestrator()
            .subscribe()
            .wait_for(|s| s.uploading)
            .await
            .unwrap();

        let view = surface.view();
        assert_eq!(view.prompt, PROMPT_UPLOADING);
        assert!(!view.accepting);
        assert_eq!(view.items[0].state, ItemState::Uploading);
        assert!(
            view.items[0]
                .source
                .as_deref()
                .is_some_and(|s| s.starts_with("blob:kindred/"))
        );
        assert_eq!(
            surface.handle(SurfaceEvent::Drop(vec![file("b.txt")])).await,
            SurfaceOutcome::Ignored
        );

        gate.notify_one();
        assert!(matches!(
            first.await.unwrap(),
            SurfaceOutcome::Submitted(_)
        ));
        assert_eq!(surface.view().items.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_committed_calls_delete_action() {
        let mut action = MockDeleteAction::new();
        action
            .expect_delete()
            .with(eq("uploads/a.txt"))
            .times(1)
            .returning(|_| Ok(()));
        let surface = surface().with_delete_action(Arc::new(action));
        surface.handle(SurfaceEvent::Pick(vec![file("a.txt")])).await;

        let outcome = surface
            .handle(SurfaceEvent::RemoveCommitted("uploads/a.txt".to_string()))
            .await;

        assert_eq!(outcome, SurfaceOutcome::Changed);
        assert!(surface.view().items.is_empty());
        assert!(surface.view().error.is_none());
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_local_removal() {
        let mut action = MockDeleteAction::new();
        action
            .expect_delete()
            .returning(|_| Err(TransportError::Provider("Failed to delete file".to_string())));
        let surface = surface().with_delete_action(Arc::new(action));
        surface.handle(SurfaceEvent::Pick(vec![file("a.txt")])).await;

        surface
            .handle(SurfaceEvent::RemoveCommitted("uploads/a.txt".to_string()))
            .await;

        let view = surface.view();
        assert!(view.items.is_empty());
        assert_eq!(
            view.error.as_deref(),
            Some("Failed to delete file")
        );

        surface.handle(SurfaceEvent::DismissError).await;
        assert!(surface.view().error.is_none());
    }

    #[tokio::test]
    async fn test_unknown_removal_is_ignored() {
        let mut action = MockDeleteAction::new();
        action.expect_delete().never();
        let surface = surface().with_delete_action(Arc::new(action));

        assert_eq!(
            surface
                .handle(SurfaceEvent::RemoveCommitted("uploads/none".to_string()))
                .await,
            SurfaceOutcome::Ignored
        );
        assert_eq!(
            surface.handle(SurfaceEvent::RemovePending(PendingId(9))).await,
            SurfaceOutcome::Ignored
        );
    }

    #[tokio::test]
    async fn test_dropping_surface_releases_previews() {
        let gate = Arc::new(Notify::new());
        let surface = surface_with(Some(gate.clone()), UploadOptions::default());
        let orchestrator = surface.orchestrator().clone();

        let task = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.submit(vec![file("a.txt"), file("b.txt")]).await }
        });
        orchestrator
            .subscribe()
            .wait_for(|s| s.uploading)
            .await
            .unwrap();
        assert_eq!(orchestrator.preview_stats(), (2, 0, 2));

        drop(surface);
        assert_eq!(orchestrator.preview_stats(), (2, 2, 0));
        assert!(orchestrator.snapshot().pending.iter().all(|p| p.preview.is_none()));

        gate.notify_one();
        task.await.unwrap().unwrap();
        assert_eq!(orchestrator.preview_stats(), (2, 2, 0));
    }

    #[tokio::test]
    async fn test_hint_and_display() {
        let options = UploadOptions::default()
            .single()
            .with_accept(AcceptFilter::parse("image/*"));
        let surface = surface_with(None, options);
        surface.handle(SurfaceEvent::Pick(vec![file("a.txt")])).await;

        let view = surface.view();
        assert_eq!(view.hint, "One file, up to 10.00 MB (image/*)");
        let rendered = view.to_string();
        assert!(rendered.starts_with("[ Drag & drop files here, or click to select ]"));
        assert!(rendered.contains("! File \"a.txt\" is not an accepted file type"));

        let defaults = surface_with(None, UploadOptions::default());
        assert_eq!(defaults.view().hint, "Up to 5 files, 10.00 MB each");
    }
}
