//! # Triage Session
//!
//! A library for reviewing a large, unordered set of remote photo files one
//! at a time: keep or delete (soft-quarantine), with undo for the most recent
//! delete, crash-safe resume, and a durable per-folder record ensuring no
//! photo is shown twice across sessions.
//!
//! The crate is built around four pieces:
//! - A durable per-folder progress record of already-reviewed photos
//! - A single-slot session snapshot for resuming an interrupted review
//! - A queue builder producing a deduplicated, shuffled, capped review queue
//! - The session engine driving keep/delete/undo with optimistic remote
//!   mutation and rollback on failure
//!
//! ## Platform Separation
//!
//! This crate contains no I/O of its own. Durability goes through the
//! [`KeyValueStore`] trait and remote file moves through the
//! [`RemoteMutations`] trait, so applications inject their own backends and
//! tests run against in-memory fakes.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use triage_session::{MemoryStore, TriageConfig, TriageEngine};
//!
//! let mut engine = TriageEngine::new(TriageConfig::default(), MemoryStore::new());
//! match engine.start("/photos/2024", listing, false) {
//!     StartOutcome::Started { total, .. } => println!("{} photos to review", total),
//!     StartOutcome::NothingToReview(reason) => println!("{}", reason),
//! }
//! ```

pub mod engine;
pub mod error;
pub mod models;
pub mod progress;
pub mod queue;
pub mod remote;
pub mod snapshot;
pub mod storage;

pub use engine::{DeleteTicket, ResumeInfo, StartOutcome, TriageEngine};
pub use error::TriageError;
pub use models::{
    EngineState, PhotoEntry, QuarantineRecord, Session, SessionCounts, TriageConfig,
    UndoStackEntry,
};
pub use progress::FolderProgress;
pub use queue::{EmptyReason, QueueOutcome, Truncation};
pub use remote::{RemoteError, RemoteMutations};
pub use snapshot::PersistedSessionSnapshot;
pub use storage::{KeyValueStore, MemoryStore, StorageError};
