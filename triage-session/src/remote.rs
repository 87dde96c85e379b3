//! Interface to the remote mutation collaborator.
//!
//! The engine never talks to the network itself. Quarantine calls are issued
//! by the application between [`TriageEngine::delete`] and the completion
//! delivery; restore calls are awaited inside [`TriageEngine::undo`].
//!
//! [`TriageEngine::delete`]: crate::engine::TriageEngine::delete
//! [`TriageEngine::undo`]: crate::engine::TriageEngine::undo

use crate::models::QuarantineRecord;
use std::fmt;

/// Errors surfaced by a remote mutation backend. All of them are retryable
/// from the engine's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// Transport-level failure (connection, timeout, DNS)
    Network(String),
    /// The server refused the operation (permissions, locked file)
    Denied(String),
    Other(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Network(msg) => write!(f, "network error: {}", msg),
            RemoteError::Denied(msg) => write!(f, "remote operation denied: {}", msg),
            RemoteError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Remote file moves backing delete and undo.
///
/// `quarantine` moves a file into a holding location and returns the record
/// needed to reverse it; `restore` moves it back. Neither call is cancelled
/// by the engine; abandonment is handled by the session-id tag carried on
/// each in-flight delete.
#[allow(async_fn_in_trait)]
pub trait RemoteMutations {
    async fn quarantine(
        &self,
        path: &str,
        session_id: &str,
    ) -> Result<QuarantineRecord, RemoteError>;

    async fn restore(&self, trashed_path: &str, original_path: &str) -> Result<(), RemoteError>;
}
