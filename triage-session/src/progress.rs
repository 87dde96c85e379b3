//! Durable per-folder record of already-reviewed photos.
//!
//! Progress outlives any single session: a photo decided in an earlier
//! session is excluded when building the next queue for the same folder.
//! The set grows on every keep/delete and shrinks only when an undo reverses
//! a delete, or when the caller explicitly clears a folder.

use crate::storage::{KeyValueStore, StorageError};
use std::collections::{BTreeMap, BTreeSet};

/// Persisted JSON shape: `{ [folderKey]: [photoKey, ...] }`
pub type FolderProgress = BTreeMap<String, BTreeSet<String>>;

/// Storage slot for the whole progress map
pub const PROGRESS_KEY: &str = "photo-triage.progress.v1";

/// Normalizes a folder path so the same folder always maps to the same
/// progress entry, regardless of trailing slashes or casing.
pub fn folder_key(folder: &str) -> String {
    let trimmed = folder.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// Loads the progress map. Absent, unreadable, or corrupt state is treated
/// as empty, never as an error.
pub fn load<S: KeyValueStore>(store: &S) -> FolderProgress {
    let raw = match store.get_item(PROGRESS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return FolderProgress::new(),
        Err(e) => {
            log::warn!("failed to read folder progress: {}", e);
            return FolderProgress::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(progress) => progress,
        Err(e) => {
            log::warn!("discarding corrupt folder progress: {}", e);
            FolderProgress::new()
        }
    }
}

/// Persists the whole progress map (whole-value overwrite).
pub fn save<S: KeyValueStore>(
    store: &mut S,
    progress: &FolderProgress,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(progress)
        .map_err(|e| StorageError::Backend(format!("serialize progress: {}", e)))?;
    store.set_item(PROGRESS_KEY, &raw)
}
