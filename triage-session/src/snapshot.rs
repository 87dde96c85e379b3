//! Single-slot persistence of the most recent in-progress session.
//!
//! The snapshot is overwritten on every cursor or undo-stack mutation so a
//! reload at any point resumes from the latest committed decision. Expiry is
//! enforced by the reader: snapshots older than the configured window are
//! discarded instead of offered for resume.

use crate::models::{PhotoEntry, Session, UndoStackEntry};
use crate::storage::{KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};

/// Storage slot for the session snapshot
pub const SNAPSHOT_KEY: &str = "photo-triage.session.v1";

/// Wire shape of a persisted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSessionSnapshot {
    pub session_id: String,
    pub folder: String,
    pub queue: Vec<PhotoEntry>,
    pub index: usize,
    pub undo_stack: Vec<UndoStackEntry>,
    /// Epoch milliseconds at save time
    pub saved_at: i64,
}

impl PersistedSessionSnapshot {
    pub fn from_session(session: &Session, now_ms: i64) -> Self {
        Self {
            session_id: session.id.clone(),
            folder: session.folder.clone(),
            queue: session.queue.clone(),
            index: session.cursor,
            undo_stack: session.undo_stack.clone(),
            saved_at: now_ms,
        }
    }

    pub fn into_session(self) -> Session {
        Session {
            id: self.session_id,
            folder: self.folder,
            queue: self.queue,
            cursor: self.index,
            undo_stack: self.undo_stack,
            started_at: self.saved_at,
        }
    }

    /// A snapshot that violates the cursor or undo-stack invariants is a
    /// schema mismatch and must be treated as absent.
    fn is_valid(&self) -> bool {
        self.index <= self.queue.len() && self.undo_stack.len() <= self.index
    }
}

/// Persists the session (whole-value overwrite of the single slot).
pub fn save<S: KeyValueStore>(
    store: &mut S,
    session: &Session,
    now_ms: i64,
) -> Result<(), StorageError> {
    let snapshot = PersistedSessionSnapshot::from_session(session, now_ms);
    let raw = serde_json::to_string(&snapshot)
        .map_err(|e| StorageError::Backend(format!("serialize snapshot: {}", e)))?;
    store.set_item(SNAPSHOT_KEY, &raw)
}

/// Reads the snapshot without discarding anything. Absent, corrupt, invalid,
/// or expired snapshots all yield `None`.
pub fn peek<S: KeyValueStore>(store: &S, now_ms: i64, ttl_ms: i64) -> Option<PersistedSessionSnapshot> {
    let raw = match store.get_item(SNAPSHOT_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("failed to read session snapshot: {}", e);
            return None;
        }
    };

    let snapshot: PersistedSessionSnapshot = match serde_json::from_str(&raw) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            log::warn!("discarding corrupt session snapshot: {}", e);
            return None;
        }
    };

    if !snapshot.is_valid() {
        log::warn!(
            "discarding invalid session snapshot (index {} of {}, {} undo entries)",
            snapshot.index,
            snapshot.queue.len(),
            snapshot.undo_stack.len()
        );
        return None;
    }

    if now_ms - snapshot.saved_at > ttl_ms {
        log::info!("session snapshot expired, not offering resume");
        return None;
    }

    Some(snapshot)
}

/// Reads the snapshot, discarding it from the store when it is present but
/// no longer usable (corrupt, invalid, or expired).
pub fn load<S: KeyValueStore>(
    store: &mut S,
    now_ms: i64,
    ttl_ms: i64,
) -> Option<PersistedSessionSnapshot> {
    let present = matches!(store.get_item(SNAPSHOT_KEY), Ok(Some(_)));
    let snapshot = peek(store, now_ms, ttl_ms);
    if present && snapshot.is_none() {
        clear(store);
    }
    snapshot
}

/// Removes the snapshot. Failures are logged and ignored; a lingering
/// snapshot is re-checked for expiry on the next read anyway.
pub fn clear<S: KeyValueStore>(store: &mut S) {
    if let Err(e) = store.remove_item(SNAPSHOT_KEY) {
        log::warn!("failed to clear session snapshot: {}", e);
    }
}
