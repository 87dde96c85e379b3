//! Builds the review queue from a raw remote listing.
//!
//! Remote listings may contain duplicates across pagination boundaries, so
//! entries are deduplicated by key (first occurrence wins) before photos
//! already reviewed in earlier sessions are filtered out. The survivors are
//! shuffled with an unbiased permutation and capped.

use crate::models::PhotoEntry;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::fmt;

/// Why a build produced nothing to review. The two cases are distinct
/// user-facing conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The folder contains no photos at all
    NoPhotos,
    /// Every photo in the folder has already been reviewed
    AllReviewed,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::NoPhotos => write!(f, "no photos found in this folder"),
            EmptyReason::AllReviewed => {
                write!(f, "all photos in this folder have already been reviewed")
            }
        }
    }
}

/// Emitted when the queue was cut down to the configured cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncation {
    /// Unreviewed photos available before capping
    pub total: usize,
    /// Photos actually queued
    pub capped: usize,
}

/// Result of building a review queue.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueOutcome {
    Empty(EmptyReason),
    Built {
        entries: Vec<PhotoEntry>,
        truncation: Option<Truncation>,
    },
}

/// Builds a review queue: dedupe, exclude reviewed keys, shuffle, cap.
///
/// `reviewed` is the folder's progress set; callers starting fresh pass an
/// empty set. Listing failures never reach this function, the caller owns
/// the fetch.
pub fn build(raw_entries: Vec<PhotoEntry>, reviewed: &BTreeSet<String>, cap: usize) -> QueueOutcome {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw_entries.len());
    let mut deduped: Vec<PhotoEntry> = Vec::with_capacity(raw_entries.len());
    for entry in raw_entries {
        if seen.insert(entry.key.clone()) {
            deduped.push(entry);
        }
    }

    if deduped.is_empty() {
        return QueueOutcome::Empty(EmptyReason::NoPhotos);
    }

    let mut entries: Vec<PhotoEntry> = deduped
        .into_iter()
        .filter(|entry| !reviewed.contains(&entry.key))
        .collect();

    if entries.is_empty() {
        return QueueOutcome::Empty(EmptyReason::AllReviewed);
    }

    entries.shuffle(&mut rand::rng());

    let total = entries.len();
    let truncation = if total > cap {
        entries.truncate(cap);
        log::info!("review queue truncated: {} of {} photos", cap, total);
        Some(Truncation { total, capped: cap })
    } else {
        None
    };

    QueueOutcome::Built {
        entries,
        truncation,
    }
}
