//! Failure taxonomy for coordination-service reads.

use thiserror::Error;

/// Error returned by a child-listing call against the coordination service.
///
/// Every variant is transient from the dispatcher's point of view: the read
/// is retried on the next poll and the loop never terminates because of one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    /// The coordination service cannot currently be reached.
    #[error("coordination service unavailable: {0}")]
    Unavailable(String),

    /// The requested node does not exist.
    #[error("coordination node not found: {0}")]
    NotFound(String),

    /// The client is not allowed to read the requested node.
    #[error("permission denied reading coordination node: {0}")]
    PermissionDenied(String),

    /// The read exceeded the client-supplied deadline.
    #[error("coordination read timed out after {ms}ms")]
    Timeout {
        /// Deadline that was exceeded, in milliseconds.
        ms: u64,
    },
}
