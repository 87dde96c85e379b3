use crate::remote::RemoteError;
use std::fmt;

/// Errors surfaced by the session engine.
///
/// Persistence problems are intentionally absent: a failed snapshot or
/// progress write degrades to in-memory operation and is only logged.
#[derive(Debug, Clone, PartialEq)]
pub enum TriageError {
    /// A quarantine or restore call failed; retryable
    Remote(RemoteError),
    /// No session has been started or resumed
    NoActiveSession,
    /// The session has reviewed its whole queue
    SessionComplete,
    /// The undo stack is empty
    NothingToUndo,
    /// An undo is already in flight
    UndoInFlight,
    /// No snapshot exists for this folder, or it has expired
    NoResumableSession,
}

impl fmt::Display for TriageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriageError::Remote(e) => write!(f, "remote mutation failed: {}", e),
            TriageError::NoActiveSession => write!(f, "no active review session"),
            TriageError::SessionComplete => write!(f, "the review session is complete"),
            TriageError::NothingToUndo => write!(f, "nothing to undo"),
            TriageError::UndoInFlight => write!(f, "an undo is already in progress"),
            TriageError::NoResumableSession => {
                write!(f, "no resumable session for this folder")
            }
        }
    }
}

impl std::error::Error for TriageError {}

impl From<RemoteError> for TriageError {
    fn from(e: RemoteError) -> Self {
        TriageError::Remote(e)
    }
}
