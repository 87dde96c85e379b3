//! The session engine: owns the in-memory review session, executes
//! keep/delete/undo, and drives every write to the progress and snapshot
//! stores.
//!
//! Deletes are optimistic: the local decision is committed and the cursor
//! advanced immediately, while the remote quarantine runs in the background.
//! The engine hands the caller a [`DeleteTicket`] tagged with the issuing
//! session's id; when the remote call settles, the caller delivers the
//! outcome back through [`TriageEngine::quarantine_confirmed`] or
//! [`TriageEngine::quarantine_failed`]. A completion whose tag no longer
//! matches the live session is dropped.

use crate::error::TriageError;
use crate::models::{
    EngineState, PhotoEntry, QuarantineRecord, Session, SessionCounts, TriageConfig,
    UndoStackEntry,
};
use crate::progress::{self, FolderProgress};
use crate::queue::{self, EmptyReason, QueueOutcome, Truncation};
use crate::remote::RemoteMutations;
use crate::snapshot;
use crate::storage::KeyValueStore;
use uuid::Uuid;

/// Result of starting a session.
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    Started {
        total: usize,
        truncation: Option<Truncation>,
    },
    /// The engine stays idle; the reason distinguishes an empty folder from
    /// a fully-reviewed one.
    NothingToReview(EmptyReason),
}

/// Context for one in-flight delete.
///
/// Carries exactly what is needed to deliver the completion and to re-issue
/// the identical operation after a failure, independent of where the cursor
/// has moved since.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteTicket {
    pub session_id: String,
    pub folder: String,
    pub path: String,
    pub entry: PhotoEntry,
}

/// What a front end needs to offer "resume?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeInfo {
    pub index: usize,
    pub total: usize,
    pub saved_at: i64,
}

/// The triage session engine.
///
/// Owns its session explicitly (`Option<Session>`, never a hidden
/// singleton), so independent engines can coexist. Generic over the storage
/// backend; remote mutations are passed in at the call sites that need them.
pub struct TriageEngine<S: KeyValueStore> {
    config: TriageConfig,
    storage: S,
    progress: FolderProgress,
    session: Option<Session>,
    undo_in_flight: bool,
}

impl<S: KeyValueStore> TriageEngine<S> {
    /// Creates an engine over the given storage backend. Corrupt or missing
    /// persisted progress starts empty.
    pub fn new(config: TriageConfig, storage: S) -> Self {
        let progress = progress::load(&storage);
        Self {
            config,
            storage,
            progress,
            session: None,
            undo_in_flight: false,
        }
    }

    pub fn state(&self) -> EngineState {
        match &self.session {
            None => EngineState::Idle,
            Some(s) if s.is_complete() => EngineState::Complete,
            Some(_) => EngineState::Active,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The entry under the cursor, i.e. the photo currently being reviewed.
    pub fn current(&self) -> Option<&PhotoEntry> {
        self.session
            .as_ref()
            .filter(|s| !s.is_complete())
            .map(|s| &s.queue[s.cursor])
    }

    /// Up to `n` entries after the current one, for prefetching.
    pub fn upcoming(&self, n: usize) -> &[PhotoEntry] {
        match &self.session {
            Some(s) if !s.is_complete() => {
                let start = s.cursor + 1;
                let end = (start + n).min(s.queue.len());
                &s.queue[start.min(end)..end]
            }
            _ => &[],
        }
    }

    /// Derived counters: `kept = cursor - undo_stack.len()`. The identity
    /// holds as long as no undone photo has been re-decided.
    pub fn counts(&self) -> Option<SessionCounts> {
        let s = self.session.as_ref()?;
        let deleted = s.undo_stack.len();
        Some(SessionCounts {
            total: s.queue.len(),
            reviewed: s.cursor,
            kept: s.cursor - deleted,
            deleted,
            remaining: s.queue.len() - s.cursor,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Non-destructive check whether an unexpired snapshot for this folder
    /// is available.
    pub fn resumable(&self, folder: &str) -> Option<ResumeInfo> {
        let snap = snapshot::peek(&self.storage, Self::now_ms(), self.config.snapshot_ttl_ms)?;
        if progress::folder_key(&snap.folder) != progress::folder_key(folder) {
            return None;
        }
        Some(ResumeInfo {
            index: snap.index,
            total: snap.queue.len(),
            saved_at: snap.saved_at,
        })
    }

    /// Starts a new session over `folder` from a raw remote listing.
    ///
    /// An abandoned snapshot for the same folder first has its reviewed
    /// prefix merged into the folder's progress, so restarting never
    /// re-shows photos decided in the abandoned session. With `fresh_start`
    /// the folder's progress is cleared instead and every photo is eligible
    /// again.
    pub fn start(
        &mut self,
        folder: &str,
        raw_entries: Vec<PhotoEntry>,
        fresh_start: bool,
    ) -> StartOutcome {
        let fkey = progress::folder_key(folder);
        let now = Self::now_ms();

        if let Some(snap) = snapshot::load(&mut self.storage, now, self.config.snapshot_ttl_ms) {
            if progress::folder_key(&snap.folder) == fkey {
                if !fresh_start {
                    let set = self.progress.entry(fkey.clone()).or_default();
                    for entry in snap.queue.iter().take(snap.index) {
                        set.insert(entry.key.clone());
                    }
                    log::info!(
                        "merged {} decisions from an abandoned session into progress",
                        snap.index
                    );
                }
                snapshot::clear(&mut self.storage);
            }
        }

        if fresh_start {
            log::info!("fresh start requested, clearing progress for {}", fkey);
            self.progress.remove(&fkey);
        }
        self.persist_progress();

        let reviewed = self.progress.get(&fkey).cloned().unwrap_or_default();
        match queue::build(raw_entries, &reviewed, self.config.queue_cap) {
            QueueOutcome::Empty(reason) => {
                self.session = None;
                StartOutcome::NothingToReview(reason)
            }
            QueueOutcome::Built {
                entries,
                truncation,
            } => {
                let total = entries.len();
                let session = Session {
                    id: Uuid::new_v4().to_string(),
                    folder: folder.to_string(),
                    queue: entries,
                    cursor: 0,
                    undo_stack: Vec::new(),
                    started_at: now,
                };
                log::info!(
                    "started session {} over {} with {} photos",
                    session.id,
                    folder,
                    total
                );
                self.session = Some(session);
                self.undo_in_flight = false;
                self.persist_snapshot();
                StartOutcome::Started { total, truncation }
            }
        }
    }

    /// Restores the persisted session for `folder` verbatim: same id, queue
    /// order, cursor, and undo stack.
    pub fn resume(&mut self, folder: &str) -> Result<(), TriageError> {
        let fkey = progress::folder_key(folder);
        let snap = snapshot::load(&mut self.storage, Self::now_ms(), self.config.snapshot_ttl_ms)
            .filter(|s| progress::folder_key(&s.folder) == fkey)
            .ok_or(TriageError::NoResumableSession)?;
        log::info!(
            "resuming session {} at photo {} of {}",
            snap.session_id,
            snap.index + 1,
            snap.queue.len()
        );
        self.session = Some(snap.into_session());
        self.undo_in_flight = false;
        Ok(())
    }

    /// Keeps the current photo. Synchronous and local: records progress,
    /// advances the cursor, persists. Never waits on any remote call.
    pub fn keep(&mut self) -> Result<(), TriageError> {
        self.require_active()?;
        let Some(session) = self.session.as_mut() else {
            return Err(TriageError::NoActiveSession);
        };
        let key = session.queue[session.cursor].key.clone();
        let fkey = progress::folder_key(&session.folder);
        session.cursor += 1;

        log::debug!("keep {}", key);
        self.progress.entry(fkey).or_default().insert(key);
        self.persist_progress();
        self.finish_advance();
        Ok(())
    }

    /// Deletes the current photo optimistically: progress and cursor move
    /// immediately, and the returned ticket is the caller's handle for
    /// issuing the remote quarantine and delivering its outcome.
    pub fn delete(&mut self) -> Result<DeleteTicket, TriageError> {
        self.require_active()?;
        let Some(session) = self.session.as_mut() else {
            return Err(TriageError::NoActiveSession);
        };
        let entry = session.queue[session.cursor].clone();
        let ticket = DeleteTicket {
            session_id: session.id.clone(),
            folder: session.folder.clone(),
            path: entry.path.clone(),
            entry,
        };
        let fkey = progress::folder_key(&session.folder);
        session.cursor += 1;

        log::debug!("delete {} issued by session {}", ticket.path, ticket.session_id);
        self.progress
            .entry(fkey)
            .or_default()
            .insert(ticket.entry.key.clone());
        self.persist_progress();
        self.finish_advance();
        Ok(ticket)
    }

    /// Delivers a successful quarantine. Returns `false` when the ticket is
    /// stale (its session is no longer the live one) and the completion was
    /// dropped.
    pub fn quarantine_confirmed(&mut self, ticket: DeleteTicket, record: QuarantineRecord) -> bool {
        let matches = self
            .session
            .as_ref()
            .is_some_and(|s| s.id == ticket.session_id);
        if !matches {
            log::debug!(
                "dropping stale quarantine completion for {} (session {})",
                ticket.path,
                ticket.session_id
            );
            return false;
        }

        // Idempotent on the normal path; re-marks the photo as reviewed when
        // this confirmation follows a retried failure that rolled it back.
        let fkey = progress::folder_key(&ticket.folder);
        self.progress
            .entry(fkey)
            .or_default()
            .insert(ticket.entry.key.clone());
        self.persist_progress();

        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let complete = session.is_complete();
        session.undo_stack.push(UndoStackEntry {
            record,
            entry: ticket.entry,
        });
        if !complete {
            self.persist_snapshot();
        }
        true
    }

    /// Delivers a failed quarantine: rolls back the optimistic progress
    /// write so the photo is never hidden without having been quarantined,
    /// and hands the ticket back as the exact retry context.
    pub fn quarantine_failed(&mut self, ticket: DeleteTicket) -> DeleteTicket {
        log::warn!("quarantine failed for {}, rolling back review mark", ticket.path);
        let fkey = progress::folder_key(&ticket.folder);
        if let Some(set) = self.progress.get_mut(&fkey) {
            set.remove(&ticket.entry.key);
            if set.is_empty() {
                self.progress.remove(&fkey);
            }
        }
        self.persist_progress();
        ticket
    }

    /// Undoes the most recent delete. Blocks on the remote restore (undo is
    /// rare and must not race with itself); on success the photo re-enters
    /// the queue at the current cursor, so it is the very next one reviewed.
    /// On failure the session is unchanged and the error is retryable.
    pub async fn undo<R: RemoteMutations>(&mut self, remote: &R) -> Result<PhotoEntry, TriageError> {
        self.require_active()?;
        if self.undo_in_flight {
            return Err(TriageError::UndoInFlight);
        }
        let (trashed, original) = {
            let Some(session) = self.session.as_ref() else {
                return Err(TriageError::NoActiveSession);
            };
            let Some(top) = session.undo_stack.last() else {
                return Err(TriageError::NothingToUndo);
            };
            (
                top.record.trashed_path.clone(),
                top.record.original_path.clone(),
            )
        };

        self.undo_in_flight = true;
        let result = remote.restore(&trashed, &original).await;
        self.undo_in_flight = false;
        if let Err(e) = result {
            log::warn!("restore failed for {}: {}", trashed, e);
            return Err(TriageError::Remote(e));
        }

        let (entry, fkey) = {
            let Some(session) = self.session.as_mut() else {
                return Err(TriageError::NoActiveSession);
            };
            let Some(top) = session.undo_stack.pop() else {
                return Err(TriageError::NothingToUndo);
            };
            let fkey = progress::folder_key(&session.folder);
            let cursor = session.cursor;
            session.queue.insert(cursor, top.entry.clone());
            (top.entry, fkey)
        };

        if let Some(set) = self.progress.get_mut(&fkey) {
            set.remove(&entry.key);
            if set.is_empty() {
                self.progress.remove(&fkey);
            }
        }
        self.persist_progress();
        self.persist_snapshot();
        log::info!("restored {} for re-review", entry.path);
        Ok(entry)
    }

    /// Explicitly abandons the current session and its snapshot.
    pub fn reset(&mut self) {
        if self.session.take().is_some() {
            log::info!("abandoning review session");
        }
        snapshot::clear(&mut self.storage);
        self.undo_in_flight = false;
    }

    /// Forgets every decision recorded for `folder` ("start completely
    /// fresh" without starting a session).
    pub fn clear_progress(&mut self, folder: &str) {
        let fkey = progress::folder_key(folder);
        if self.progress.remove(&fkey).is_some() {
            log::info!("cleared review progress for {}", fkey);
            self.persist_progress();
        }
    }

    fn require_active(&self) -> Result<(), TriageError> {
        match &self.session {
            None => Err(TriageError::NoActiveSession),
            Some(s) if s.is_complete() => Err(TriageError::SessionComplete),
            Some(_) => Ok(()),
        }
    }

    /// After any cursor move: a completed session immediately loses its
    /// snapshot (it must never be offered for resume), otherwise the latest
    /// state is persisted.
    fn finish_advance(&mut self) {
        let complete = self
            .session
            .as_ref()
            .is_some_and(Session::is_complete);
        if complete {
            log::info!("review session complete");
            snapshot::clear(&mut self.storage);
        } else {
            self.persist_snapshot();
        }
    }

    fn persist_progress(&mut self) {
        if let Err(e) = progress::save(&mut self.storage, &self.progress) {
            log::warn!("failed to persist folder progress, continuing in memory: {}", e);
        }
    }

    fn persist_snapshot(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        if let Err(e) = snapshot::save(&mut self.storage, session, Self::now_ms()) {
            log::warn!("failed to persist session snapshot, resume unavailable: {}", e);
        }
    }

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;
    use crate::storage::{MemoryStore, StorageError};
    use std::cell::RefCell;

    const FOLDER: &str = "/Photos/Camera";

    fn entry(name: &str) -> PhotoEntry {
        PhotoEntry {
            key: format!("/photos/camera/{}", name),
            path: format!("/Photos/Camera/{}", name),
            size: 4096,
            modified: None,
            downloadable: true,
        }
    }

    fn listing(n: usize) -> Vec<PhotoEntry> {
        (0..n).map(|i| entry(&format!("{}.jpg", i))).collect()
    }

    fn engine() -> TriageEngine<MemoryStore> {
        TriageEngine::new(TriageConfig::default(), MemoryStore::new())
    }

    fn record_for(ticket: &DeleteTicket) -> QuarantineRecord {
        QuarantineRecord {
            original_path: ticket.path.clone(),
            trashed_path: format!("/quarantine/{}", ticket.entry.key.replace('/', "_")),
            session_id: ticket.session_id.clone(),
            timestamp: 1,
        }
    }

    struct FakeRemote {
        fail_restore: bool,
        restored: RefCell<Vec<(String, String)>>,
    }

    impl FakeRemote {
        fn new() -> Self {
            Self {
                fail_restore: false,
                restored: RefCell::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail_restore: true,
                restored: RefCell::new(Vec::new()),
            }
        }
    }

    impl RemoteMutations for FakeRemote {
        async fn quarantine(
            &self,
            path: &str,
            session_id: &str,
        ) -> Result<QuarantineRecord, RemoteError> {
            Ok(QuarantineRecord {
                original_path: path.to_string(),
                trashed_path: format!("/quarantine{}", path),
                session_id: session_id.to_string(),
                timestamp: 1,
            })
        }

        async fn restore(
            &self,
            trashed_path: &str,
            original_path: &str,
        ) -> Result<(), RemoteError> {
            if self.fail_restore {
                return Err(RemoteError::Network("offline".to_string()));
            }
            self.restored
                .borrow_mut()
                .push((trashed_path.to_string(), original_path.to_string()));
            Ok(())
        }
    }

    /// Storage that accepts nothing, as if the quota were exhausted.
    struct FullStore;

    impl KeyValueStore for FullStore {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }
        fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::QuotaExceeded)
        }
        fn remove_item(&mut self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn start_activates_and_persists_a_snapshot() {
        let mut engine = engine();
        let outcome = engine.start(FOLDER, listing(4), false);

        assert!(matches!(
            outcome,
            StartOutcome::Started {
                total: 4,
                truncation: None
            }
        ));
        assert_eq!(engine.state(), EngineState::Active);
        assert!(engine.current().is_some());
        assert!(engine.resumable(FOLDER).is_some());
    }

    #[test]
    fn keep_records_progress_and_advances() {
        let mut engine = engine();
        engine.start(FOLDER, listing(3), false);
        let key = engine.current().unwrap().key.clone();

        engine.keep().unwrap();

        let counts = engine.counts().unwrap();
        assert_eq!(counts.reviewed, 1);
        assert_eq!(counts.kept, 1);
        assert_eq!(counts.deleted, 0);

        let progress = progress::load(engine.storage());
        assert!(progress[&progress::folder_key(FOLDER)].contains(&key));
    }

    #[test]
    fn reviewed_photos_never_reappear_in_later_sessions() {
        let mut engine = engine();
        engine.start(FOLDER, listing(3), false);
        engine.keep().unwrap();
        engine.keep().unwrap();
        engine.keep().unwrap();
        assert_eq!(engine.state(), EngineState::Complete);

        match engine.start(FOLDER, listing(3), false) {
            StartOutcome::NothingToReview(reason) => {
                assert_eq!(reason, EmptyReason::AllReviewed)
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn empty_listing_is_distinguished_from_fully_reviewed() {
        let mut engine = engine();
        match engine.start(FOLDER, Vec::new(), false) {
            StartOutcome::NothingToReview(reason) => assert_eq!(reason, EmptyReason::NoPhotos),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn delete_is_optimistic_and_confirmation_pushes_undo() {
        let mut engine = engine();
        engine.start(FOLDER, listing(3), false);
        let key = engine.current().unwrap().key.clone();

        let ticket = engine.delete().unwrap();
        // Cursor moved before any completion arrived
        assert_eq!(engine.counts().unwrap().reviewed, 1);
        assert_eq!(engine.counts().unwrap().deleted, 0);
        let progress = progress::load(engine.storage());
        assert!(progress[&progress::folder_key(FOLDER)].contains(&key));

        let record = record_for(&ticket);
        assert!(engine.quarantine_confirmed(ticket, record));
        let counts = engine.counts().unwrap();
        assert_eq!(counts.deleted, 1);
        assert_eq!(counts.kept, 0);
    }

    #[test]
    fn failed_delete_rolls_back_the_review_mark() {
        let mut engine = engine();
        engine.start(FOLDER, listing(3), false);
        let key = engine.current().unwrap().key.clone();

        let ticket = engine.delete().unwrap();
        let retry = engine.quarantine_failed(ticket);

        // Cursor stays advanced, but the photo is no longer marked reviewed
        assert_eq!(engine.counts().unwrap().reviewed, 1);
        let progress = progress::load(engine.storage());
        assert!(!progress
            .get(&progress::folder_key(FOLDER))
            .is_some_and(|set| set.contains(&key)));

        // The ticket survives as the exact retry context
        assert_eq!(retry.entry.key, key);
        assert_eq!(retry.path, retry.entry.path);
    }

    #[test]
    fn retried_delete_confirmation_restores_the_review_mark() {
        let mut engine = engine();
        engine.start(FOLDER, listing(3), false);
        let key = engine.current().unwrap().key.clone();

        let ticket = engine.delete().unwrap();
        let retry = engine.quarantine_failed(ticket);
        let record = record_for(&retry);
        assert!(engine.quarantine_confirmed(retry, record));

        let progress = progress::load(engine.storage());
        assert!(progress[&progress::folder_key(FOLDER)].contains(&key));
        assert_eq!(engine.counts().unwrap().deleted, 1);
    }

    #[test]
    fn stale_completion_is_dropped() {
        let mut engine = engine();
        engine.start(FOLDER, listing(3), false);
        let ticket = engine.delete().unwrap();

        // Abandon the first session and start another over the same folder
        engine.start(FOLDER, listing(3), false);
        let record = record_for(&ticket);
        assert!(!engine.quarantine_confirmed(ticket, record));

        let counts = engine.counts().unwrap();
        assert_eq!(counts.deleted, 0);
        assert_eq!(counts.reviewed, 0);
    }

    #[test]
    fn restarting_merges_the_abandoned_prefix_into_progress() {
        // Craft a snapshot as an interrupted session would have left it:
        // two photos reviewed, but progress writes lost.
        let mut store = MemoryStore::new();
        let session = Session {
            id: "stale".to_string(),
            folder: FOLDER.to_string(),
            queue: listing(5),
            cursor: 2,
            undo_stack: Vec::new(),
            started_at: 0,
        };
        snapshot::save(&mut store, &session, chrono::Utc::now().timestamp_millis()).unwrap();

        let mut engine = TriageEngine::new(TriageConfig::default(), store);
        match engine.start(FOLDER, listing(5), false) {
            StartOutcome::Started { total, .. } => assert_eq!(total, 3),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn fresh_start_clears_folder_progress() {
        let mut engine = engine();
        engine.start(FOLDER, listing(3), false);
        engine.keep().unwrap();
        engine.keep().unwrap();
        engine.reset();

        match engine.start(FOLDER, listing(3), true) {
            StartOutcome::Started { total, .. } => assert_eq!(total, 3),
            other => panic!("unexpected outcome: {:?}", other),
        }
        let progress = progress::load(engine.storage());
        assert!(!progress.contains_key(&progress::folder_key(FOLDER)));
    }

    #[test]
    fn resume_restores_the_session_verbatim() {
        let mut engine = engine();
        engine.start(FOLDER, listing(10), false);
        engine.keep().unwrap();
        engine.keep().unwrap();
        let ticket = engine.delete().unwrap();
        let record = record_for(&ticket);
        engine.quarantine_confirmed(ticket, record);
        let before = engine.session().unwrap().clone();

        let store = engine.into_storage();
        let mut resumed = TriageEngine::new(TriageConfig::default(), store);
        resumed.resume(FOLDER).unwrap();

        let after = resumed.session().unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.cursor, 3);
        assert_eq!(after.queue, before.queue);
        assert_eq!(after.undo_stack, before.undo_stack);
    }

    #[test]
    fn resume_refuses_other_folders() {
        let mut engine = engine();
        engine.start(FOLDER, listing(3), false);
        engine.keep().unwrap();

        let store = engine.into_storage();
        let mut other = TriageEngine::new(TriageConfig::default(), store);
        assert_eq!(
            other.resume("/Photos/Other"),
            Err(TriageError::NoResumableSession)
        );
    }

    #[test]
    fn completion_discards_the_snapshot() {
        let mut engine = engine();
        engine.start(FOLDER, listing(1), false);
        engine.keep().unwrap();

        assert_eq!(engine.state(), EngineState::Complete);
        assert!(engine.resumable(FOLDER).is_none());

        let store = engine.into_storage();
        let mut next = TriageEngine::new(TriageConfig::default(), store);
        assert_eq!(next.resume(FOLDER), Err(TriageError::NoResumableSession));
    }

    #[test]
    fn actions_require_an_active_session() {
        let mut engine = engine();
        assert_eq!(engine.keep(), Err(TriageError::NoActiveSession));
        assert!(engine.delete().is_err());

        engine.start(FOLDER, listing(1), false);
        engine.keep().unwrap();
        assert_eq!(engine.keep(), Err(TriageError::SessionComplete));
    }

    #[test]
    fn quota_exhaustion_degrades_to_memory_only() {
        let mut engine = TriageEngine::new(TriageConfig::default(), FullStore);
        match engine.start(FOLDER, listing(3), false) {
            StartOutcome::Started { total, .. } => assert_eq!(total, 3),
            other => panic!("unexpected outcome: {:?}", other),
        }

        engine.keep().unwrap();
        let ticket = engine.delete().unwrap();
        let record = record_for(&ticket);
        assert!(engine.quarantine_confirmed(ticket, record));

        let counts = engine.counts().unwrap();
        assert_eq!(counts.reviewed, 2);
        assert_eq!(counts.kept, 1);
        assert_eq!(counts.deleted, 1);
        // Nothing durable, so nothing to resume
        assert!(engine.resumable(FOLDER).is_none());
    }

    #[tokio::test]
    async fn undo_reinserts_the_photo_at_the_cursor() {
        let mut engine = engine();
        engine.start(FOLDER, listing(3), false);
        let deleted_key = engine.current().unwrap().key.clone();

        let ticket = engine.delete().unwrap();
        let record = record_for(&ticket);
        let trashed = record.trashed_path.clone();
        engine.quarantine_confirmed(ticket, record);

        let remote = FakeRemote::new();
        let restored = engine.undo(&remote).await.unwrap();

        assert_eq!(restored.key, deleted_key);
        // The restored photo is the very next one reviewed
        assert_eq!(engine.current().unwrap().key, deleted_key);
        assert_eq!(engine.counts().unwrap().total, 4);
        assert_eq!(engine.counts().unwrap().deleted, 0);

        // The restore used the quarantine record's paths
        let calls = remote.restored.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, trashed);

        // And the photo is reviewable again in later sessions
        let progress = progress::load(engine.storage());
        assert!(!progress
            .get(&progress::folder_key(FOLDER))
            .is_some_and(|set| set.contains(&deleted_key)));
    }

    #[tokio::test]
    async fn failed_undo_leaves_the_session_unchanged() {
        let mut engine = engine();
        engine.start(FOLDER, listing(3), false);
        let ticket = engine.delete().unwrap();
        let record = record_for(&ticket);
        engine.quarantine_confirmed(ticket, record);
        let before = engine.session().unwrap().clone();

        let remote = FakeRemote::failing();
        let err = engine.undo(&remote).await.unwrap_err();
        assert!(matches!(err, TriageError::Remote(_)));
        assert_eq!(engine.session().unwrap(), &before);

        // Still retryable afterwards
        let remote = FakeRemote::new();
        engine.undo(&remote).await.unwrap();
        assert_eq!(engine.counts().unwrap().deleted, 0);
    }

    #[tokio::test]
    async fn undo_with_empty_stack_is_rejected() {
        let mut engine = engine();
        engine.start(FOLDER, listing(2), false);
        engine.keep().unwrap();

        let remote = FakeRemote::new();
        assert_eq!(
            engine.undo(&remote).await,
            Err(TriageError::NothingToUndo)
        );
    }

    #[tokio::test]
    async fn kept_count_identity_holds_across_undo() {
        let mut engine = engine();
        engine.start(FOLDER, listing(5), false);
        engine.keep().unwrap();
        for _ in 0..2 {
            let ticket = engine.delete().unwrap();
            let record = record_for(&ticket);
            engine.quarantine_confirmed(ticket, record);
        }

        let counts = engine.counts().unwrap();
        assert_eq!(counts.reviewed, 3);
        assert_eq!(counts.kept, 1);
        assert_eq!(counts.deleted, 2);

        let remote = FakeRemote::new();
        engine.undo(&remote).await.unwrap();
        let counts = engine.counts().unwrap();
        assert_eq!(counts.deleted, 1);
        assert_eq!(counts.kept, counts.reviewed - counts.deleted);
    }

    #[test]
    fn upcoming_previews_the_next_entries() {
        let mut engine = engine();
        engine.start(FOLDER, listing(5), false);

        let upcoming = engine.upcoming(3);
        assert_eq!(upcoming.len(), 3);
        assert_eq!(upcoming[0].key, engine.session().unwrap().queue[1].key);

        engine.keep().unwrap();
        assert_eq!(engine.upcoming(10).len(), 3);
    }
}
