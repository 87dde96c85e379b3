use serde::{Deserialize, Serialize};

/// A single remote photo file as produced by the listing collaborator.
///
/// `key` is the stable identity (lower-cased remote path) used for
/// deduplication and progress tracking; `path` is the display path handed to
/// remote mutations. Entries are immutable once listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoEntry {
    pub key: String,
    pub path: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    pub downloadable: bool,
}

/// Receipt returned by a successful quarantine, carrying everything needed
/// to restore the file later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarantineRecord {
    pub original_path: String,
    pub trashed_path: String,
    pub session_id: String,
    /// Epoch milliseconds at quarantine time
    pub timestamp: i64,
}

/// One undoable delete: the quarantine receipt paired with the entry it
/// removed from review. The stack is LIFO; only the top is undoable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoStackEntry {
    pub record: QuarantineRecord,
    pub entry: PhotoEntry,
}

/// One continuous review pass over a folder's queue.
///
/// `id` is a fresh random identifier per start and guards in-flight remote
/// completions against being applied to a later session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub folder: String,
    pub queue: Vec<PhotoEntry>,
    /// Index of the next unreviewed entry; `cursor == queue.len()` means the
    /// session is complete.
    pub cursor: usize,
    pub undo_stack: Vec<UndoStackEntry>,
    /// Epoch milliseconds at session start
    pub started_at: i64,
}

impl Session {
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.queue.len()
    }
}

/// Lifecycle of the engine as seen by a front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Active,
    Complete,
}

/// Derived per-session counters for display. Never stored; recomputed from
/// cursor and undo stack on every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCounts {
    pub total: usize,
    pub reviewed: usize,
    pub kept: usize,
    pub deleted: usize,
    pub remaining: usize,
}

/// Configuration for the session engine.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Maximum number of photos in one review queue
    pub queue_cap: usize,
    /// How long a persisted snapshot remains resumable, in milliseconds
    pub snapshot_ttl_ms: i64,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            queue_cap: 5000,
            snapshot_ttl_ms: 24 * 60 * 60 * 1000,
        }
    }
}
