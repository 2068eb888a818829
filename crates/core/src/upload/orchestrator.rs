//! Upload session owner.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::{TransportError, UploadError, ValidationError};
use super::preview::PreviewRegistry;
use super::transport::UploadTransport;
use super::types::{
    CommittedFile, LocalFile, PendingFile, PendingId, SessionSnapshot, SubmitOutcome, UploadPhase,
};
use super::validator::{UploadOptions, screen};

#[derive(Debug, Default)]
struct SessionState {
    phase: UploadPhase,
    error: Option<String>,
    pending: Vec<PendingFile>,
    committed: Vec<CommittedFile>,
    previews: PreviewRegistry,
    next_id: u64,
    in_flight: usize,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            uploading: self.in_flight > 0,
            error: self.error.clone(),
            pending: self.pending.clone(),
            committed: self.committed.clone(),
        }
    }

    fn take_pending(&mut self, id: PendingId) -> Option<PendingFile> {
        let index = self.pending.iter().position(|p| p.id == id)?;
        let entry = self.pending.remove(index);
        if entry.preview.is_some() {
            self.previews.release(id);
        }
        Some(entry)
    }

    fn settle(&mut self) {
        self.phase = if self.in_flight > 0 {
            UploadPhase::Uploading
        } else {
            UploadPhase::Settled
        };
    }
}

/// Owns one upload session.
///
/// All mutation goes through `&self` methods; the lock is never held across
/// the transport round trip, so overlapping `submit` calls proceed
/// independently and merge into the same committed list.
pub struct UploadOrchestrator {
    transport: Arc<dyn UploadTransport>,
    options: UploadOptions,
    state: Mutex<SessionState>,
    status: watch::Sender<SessionSnapshot>,
}

impl UploadOrchestrator {
    /// Creates an idle session.
    #[must_use]
    pub fn new(transport: Arc<dyn UploadTransport>, options: UploadOptions) -> Self {
        let (status, _) = watch::channel(SessionSnapshot::default());
        Self {
            transport,
            options,
            state: Mutex::new(SessionState::default()),
            status,
        }
    }

    /// Options the session screens against.
    #[must_use]
    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    /// Current session state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.status.subscribe()
    }

    /// Screens `candidates`, then sends the survivors as one batch.
    ///
    /// Rejected candidates are reported in the outcome and in the session
    /// error; they never reach the transport. With no survivors nothing is
    /// sent.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Transport` when the round trip fails. The
    /// committed list is left unchanged and the batch's pending entries are
    /// discarded.
    pub async fn submit(&self, candidates: Vec<LocalFile>) -> Result<SubmitOutcome, UploadError> {
        let (batch, rejected, files) = {
            let mut state = self.lock();
            state.error = None;
            if state.in_flight == 0 {
                state.phase = UploadPhase::Validating;
            }
            self.publish(&state);

            let screening = screen(&self.options, candidates);
            if !screening.rejected.is_empty() {
                state.error = Some(join_messages(&screening.rejected));
                debug!(rejected = screening.rejected.len(), "Candidates rejected");
            }

            if screening.admitted.is_empty() {
                if state.in_flight == 0 {
                    state.phase = UploadPhase::Idle;
                }
                self.publish(&state);
                return Ok(SubmitOutcome {
                    committed: Vec::new(),
                    rejected: screening.rejected,
                });
            }

            let mut batch = Vec::with_capacity(screening.admitted.len());
            for file in &screening.admitted {
                let id = PendingId(state.next_id);
                state.next_id += 1;
                let preview = state.previews.allocate(id);
                state.pending.push(PendingFile {
                    id,
                    file: file.clone(),
                    preview: Some(preview),
                });
                batch.push(id);
            }
            state.in_flight += 1;
            state.phase = UploadPhase::Uploading;
            self.publish(&state);

            (batch, screening.rejected, screening.admitted)
        };

        info!(
            files = batch.len(),
            folder = %self.options.folder,
            "Submitting upload batch"
        );
        let result = self
            .transport
            .ingest(&self.options.folder, files)
            .await
            .and_then(|committed| check_response(batch.len(), committed));

        let mut state = self.lock();
        state.in_flight -= 1;

        let outcome = match result {
            Ok(returned) => {
                let known: HashSet<String> =
                    state.committed.iter().map(|f| f.public_id.clone()).collect();
                if let Some(dup) = returned.iter().find(|f| known.contains(&f.public_id)) {
                    Err(TransportError::InvalidResponse(format!(
                        "duplicate public id {}",
                        dup.public_id
                    )))
                } else {
                    Ok(returned)
                }
            }
            Err(e) => Err(e),
        };

        let result = match outcome {
            Ok(returned) => {
                let mut committed = Vec::with_capacity(returned.len());
                for (id, file) in batch.iter().zip(returned) {
                    if state.take_pending(*id).is_some() {
                        state.committed.push(file.clone());
                        committed.push(file);
                    } else {
                        debug!(pending_id = %id, "Pending entry removed before commit");
                    }
                }
                info!(committed = committed.len(), "Upload batch committed");
                Ok(SubmitOutcome {
                    committed,
                    rejected,
                })
            }
            Err(e) => {
                warn!(error = %e, files = batch.len(), "Upload batch failed");
                for id in &batch {
                    state.take_pending(*id);
                }
                state.error = Some(e.to_string());
                Err(UploadError::from(e))
            }
        };

        state.settle();
        self.publish(&state);
        result
    }

    /// Removes the committed file with `public_id` and returns it.
    ///
    /// Touches local state only.
    pub fn remove_committed(&self, public_id: &str) -> Option<CommittedFile> {
        let mut state = self.lock();
        let index = state
            .committed
            .iter()
            .position(|f| f.public_id == public_id)?;
        let removed = state.committed.remove(index);
        self.publish(&state);
        Some(removed)
    }

    /// Discards one pending entry and releases its preview. If its batch later
    /// succeeds, the entry is not committed.
    pub fn remove_pending(&self, id: PendingId) -> Option<PendingFile> {
        let mut state = self.lock();
        let removed = state.take_pending(id)?;
        self.publish(&state);
        Some(removed)
    }

    /// Empties both lists, releases every preview and clears the error.
    pub fn clear_all(&self) {
        let mut state = self.lock();
        state.pending.clear();
        let released = state.previews.release_all();
        state.committed.clear();
        state.error = None;
        if state.in_flight == 0 {
            state.phase = UploadPhase::Idle;
        }
        debug!(released, "Upload session cleared");
        self.publish(&state);
    }

    /// Clears the error message.
    pub fn dismiss_error(&self) {
        let mut state = self.lock();
        if state.error.take().is_some() {
            self.publish(&state);
        }
    }

    /// Records an error raised outside the ingest path, such as a failed
    /// remote delete.
    pub fn record_error(&self, message: impl Into<String>) {
        let mut state = self.lock();
        state.error = Some(message.into());
        self.publish(&state);
    }

    /// Releases every outstanding preview. Pending entries lose their
    /// reference but stay listed until their batch settles.
    pub fn teardown(&self) {
        let mut state = self.lock();
        let released = state.previews.release_all();
        if released == 0 {
            return;
        }
        for entry in &mut state.pending {
            entry.preview = None;
        }
        debug!(released, "Previews released on teardown");
        self.publish(&state);
    }

    /// Preview counters: `(allocated, released, outstanding)`.
    #[must_use]
    pub fn preview_stats(&self) -> (u64, u64, usize) {
        let state = self.lock();
        (
            state.previews.allocated(),
            state.previews.released(),
            state.previews.outstanding(),
        )
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &SessionState) {
        self.status.send_replace(state.snapshot());
    }
}

fn check_response(
    expected: usize,
    committed: Vec<CommittedFile>,
) -> Result<Vec<CommittedFile>, TransportError> {
    if committed.len() != expected {
        return Err(TransportError::InvalidResponse(format!(
            "expected {expected} files, got {}",
            committed.len()
        )));
    }
    let mut seen = HashSet::with_capacity(committed.len());
    if let Some(dup) = committed.iter().find(|f| !seen.insert(f.public_id.as_str())) {
        return Err(TransportError::InvalidResponse(format!(
            "duplicate public id {}",
            dup.public_id
        )));
    }
    Ok(committed)
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ResourceType;
    use crate::upload::transport::MockUploadTransport;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn local(name: &str, size: usize) -> LocalFile {
        LocalFile::new(name, "image/png", vec![1u8; size])
    }

    fn committed_for(folder: &str, file: &LocalFile) -> CommittedFile {
        let public_id = format!("{folder}/{}", file.name);
        CommittedFile {
            url: format!("https://cdn.test/{public_id}"),
            public_id,
            original_name: file.name.clone(),
            size: file.size(),
            format: Some("png".to_string()),
            width: None,
            height: None,
            resource_type: ResourceType::Image,
        }
    }

    /// Echoes every file back after an optional gate, counting round trips.
    #[derive(Default)]
    struct EchoTransport {
        calls: AtomicUsize,
        fail: bool,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl UploadTransport for EchoTransport {
        async fn ingest(
            &self,
            folder: &str,
            files: Vec<LocalFile>,
        ) -> Result<Vec<CommittedFile>, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            } else {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            if self.fail {
                return Err(TransportError::Provider("Failed to upload files".to_string()));
            }
            Ok(files.iter().map(|f| committed_for(folder, f)).collect())
        }
    }

    fn orchestrator(transport: Arc<dyn UploadTransport>) -> UploadOrchestrator {
        UploadOrchestrator::new(transport, UploadOptions::default().with_max_size(1024))
    }

    fn names(files: &[CommittedFile]) -> Vec<&str> {
        files.iter().map(|f| f.original_name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_oversized_files_never_reach_transport() {
        let mut transport = MockUploadTransport::new();
        transport.expect_ingest().never();
        let orchestrator = orchestrator(Arc::new(transport));

        let outcome = orchestrator.submit(vec![local("big.png", 2048)]).await.unwrap();

        assert!(outcome.committed.is_empty());
        assert_eq!(outcome.rejected.len(), 1);
        let snapshot = orchestrator.snapshot();
        assert!(snapshot.pending.is_empty());
        assert!(snapshot.committed.is_empty());
        assert_eq!(snapshot.phase, UploadPhase::Idle);
        assert_eq!(
            snapshot.error.as_deref(),
            Some("File \"big.png\" exceeds the maximum size of 0.00 MB")
        );
        assert_eq!(orchestrator.preview_stats(), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_single_batch_with_survivors_only() {
        let mut transport = MockUploadTransport::new();
        transport
            .expect_ingest()
            .times(1)
            .withf(|folder, files| {
                folder.to_string() == "uploads" && files.len() == 2 && files[0].name == "a.png"
            })
            .returning(|folder, files| {
                Ok(files.iter().map(|f| committed_for(folder, f)).collect())
            });
        let orchestrator = orchestrator(Arc::new(transport));

        let outcome = orchestrator
            .submit(vec![
                local("a.png", 10),
                local("huge.png", 4096),
                local("b.png", 10),
            ])
            .await
            .unwrap();

        assert_eq!(names(&outcome.committed), ["a.png", "b.png"]);
        assert_eq!(outcome.rejected.len(), 1);
        let snapshot = orchestrator.snapshot();
        assert_eq!(snapshot.phase, UploadPhase::Settled);
        assert!(!snapshot.uploading);
        assert!(snapshot.error.is_some());
        assert_eq!(orchestrator.preview_stats(), (2, 2, 0));
    }

    #[tokio::test]
    async fn test_commit_keeps_submission_order() {
        let orchestrator = orchestrator(Arc::new(EchoTransport::default()));
        let outcome = orchestrator
            .submit(vec![local("c.png", 1), local("a.png", 1), local("b.png", 1)])
            .await
            .unwrap();

        assert_eq!(names(&outcome.committed), ["c.png", "a.png", "b.png"]);
        assert_eq!(names(&orchestrator.snapshot().committed), ["c.png", "a.png", "b.png"]);
    }

    #[tokio::test]
    async fn test_failure_leaves_committed_untouched() {
        let orchestrator = orchestrator(Arc::new(EchoTransport::default()));
        orchestrator.submit(vec![local("keep.png", 1)]).await.unwrap();

        let failing = UploadOrchestrator::new(
            Arc::new(EchoTransport {
                fail: true,
                ..EchoTransport::default()
            }),
            UploadOptions::default(),
        );
        let err = failing.submit(vec![local("x.png", 1)]).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to upload files");
        let snapshot = failing.snapshot();
        assert!(snapshot.committed.is_empty());
        assert!(snapshot.pending.is_empty());
        assert_eq!(snapshot.error.as_deref(), Some("Failed to upload files"));
        assert_eq!(snapshot.phase, UploadPhase::Settled);
        assert_eq!(failing.preview_stats(), (1, 1, 0));
        assert_eq!(names(&orchestrator.snapshot().committed), ["keep.png"]);
    }

    #[tokio::test]
    async fn test_short_response_is_rejected() {
        let mut transport = MockUploadTransport::new();
        transport.expect_ingest().returning(|_, _| Ok(Vec::new()));
        let orchestrator = orchestrator(Arc::new(transport));

        let err = orchestrator.submit(vec![local("a.png", 1)]).await.unwrap_err();

        assert!(matches!(
            err,
            UploadError::Transport(TransportError::InvalidResponse(_))
        ));
        assert!(orchestrator.snapshot().committed.is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_is_idempotent() {
        let transport = Arc::new(EchoTransport::default());
        let orchestrator = orchestrator(transport.clone());
        orchestrator
            .submit(vec![local("a.png", 1), local("b.png", 1)])
            .await
            .unwrap();
        orchestrator.record_error("boom");

        orchestrator.clear_all();
        let first = orchestrator.snapshot();
        orchestrator.clear_all();
        let second = orchestrator.snapshot();

        assert_eq!(first, second);
        assert!(second.committed.is_empty());
        assert!(second.error.is_none());
        assert_eq!(second.phase, UploadPhase::Idle);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_all_mid_flight_releases_once() {
        let gate = Arc::new(Notify::new());
        let orchestrator = Arc::new(orchestrator(Arc::new(EchoTransport {
            gate: Some(gate.clone()),
            ..EchoTransport::default()
        })));

        let task = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.submit(vec![local("a.png", 1)]).await }
        });
        orchestrator
            .subscribe()
            .wait_for(|s| s.uploading)
            .await
            .unwrap();

        orchestrator.clear_all();
        let snapshot = orchestrator.snapshot();
        assert!(snapshot.pending.is_empty());
        assert_eq!(snapshot.phase, UploadPhase::Uploading);
        assert_eq!(orchestrator.preview_stats(), (1, 1, 0));

        gate.notify_one();
        let outcome = task.await.unwrap().unwrap();
        assert!(outcome.committed.is_empty());

        let snapshot = orchestrator.snapshot();
        assert!(snapshot.committed.is_empty());
        assert!(!snapshot.uploading);
        assert_eq!(orchestrator.preview_stats(), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_concurrent_disjoint_submits() {
        let orchestrator = orchestrator(Arc::new(EchoTransport::default()));

        let (left, right) = tokio::join!(
            orchestrator.submit(vec![local("l1.png", 1), local("l2.png", 1)]),
            orchestrator.submit(vec![local("r1.png", 1), local("r2.png", 1), local("r3.png", 1)]),
        );
        let left = left.unwrap();
        let right = right.unwrap();

        assert_eq!(names(&left.committed), ["l1.png", "l2.png"]);
        assert_eq!(names(&right.committed), ["r1.png", "r2.png", "r3.png"]);

        let snapshot = orchestrator.snapshot();
        let mut all = names(&snapshot.committed);
        all.sort_unstable();
        assert_eq!(all, ["l1.png", "l2.png", "r1.png", "r2.png", "r3.png"]);
        assert!(!snapshot.uploading);
        assert_eq!(orchestrator.preview_stats(), (5, 5, 0));
    }

    #[tokio::test]
    async fn test_remove_pending_mid_flight_skips_commit() {
        let gate = Arc::new(Notify::new());
        let orchestrator = Arc::new(orchestrator(Arc::new(EchoTransport {
            gate: Some(gate.clone()),
            ..EchoTransport::default()
        })));

        let task = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move {
                orchestrator
                    .submit(vec![local("a.png", 1), local("b.png", 1)])
                    .await
            }
        });

        let mut status = orchestrator.subscribe();
        status.wait_for(|s| s.uploading).await.unwrap();
        let snapshot = orchestrator.snapshot();
        assert_eq!(snapshot.phase, UploadPhase::Uploading);
        assert!(snapshot.pending.iter().all(|p| p.preview.is_some()));

        let first = snapshot.pending[0].id;
        assert!(orchestrator.remove_pending(first).is_some());
        assert!(orchestrator.remove_pending(first).is_none());
        gate.notify_one();

        let outcome = task.await.unwrap().unwrap();
        assert_eq!(names(&outcome.committed), ["b.png"]);
        assert_eq!(orchestrator.preview_stats(), (2, 2, 0));
    }

    #[tokio::test]
    async fn test_teardown_releases_in_flight_previews_once() {
        let gate = Arc::new(Notify::new());
        let orchestrator = Arc::new(orchestrator(Arc::new(EchoTransport {
            gate: Some(gate.clone()),
            ..EchoTransport::default()
        })));

        let task = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.submit(vec![local("a.png", 1)]).await }
        });
        orchestrator
            .subscribe()
            .wait_for(|s| s.uploading)
            .await
            .unwrap();

        orchestrator.teardown();
        orchestrator.teardown();
        assert_eq!(orchestrator.preview_stats(), (1, 1, 0));

        gate.notify_one();
        task.await.unwrap().unwrap();
        assert_eq!(orchestrator.preview_stats(), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_remove_committed_keeps_remaining_order() {
        let orchestrator = orchestrator(Arc::new(EchoTransport::default()));
        orchestrator
            .submit(vec![
                local("a.png", 1),
                local("b.png", 1),
                local("c.png", 1),
                local("d.png", 1),
            ])
            .await
            .unwrap();

        let removed = orchestrator.remove_committed("uploads/b.png").unwrap();
        assert_eq!(removed.original_name, "b.png");
        assert!(orchestrator.remove_committed("uploads/missing.png").is_none());
        assert_eq!(
            names(&orchestrator.snapshot().committed),
            ["a.png", "c.png", "d.png"]
        );
    }

    #[tokio::test]
    async fn test_every_mutation_publishes() {
        let orchestrator = orchestrator(Arc::new(EchoTransport::default()));
        let mut status = orchestrator.subscribe();

        orchestrator.submit(vec![local("a.png", 1)]).await.unwrap();
        assert!(status.has_changed().unwrap());
        assert_eq!(status.borrow_and_update().committed.len(), 1);

        orchestrator.remove_committed("uploads/a.png");
        assert!(status.has_changed().unwrap());
        assert!(status.borrow_and_update().committed.is_empty());

        orchestrator.dismiss_error();
        assert!(!status.has_changed().unwrap());
    }
}
