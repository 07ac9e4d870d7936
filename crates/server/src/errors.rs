use battle_core::{InvariantViolation, ResolveError};
use std::fmt;

/// Error from a coordinator operation.
///
/// None of these reach a client as a message; invariant faults have already
/// ended the affected session by the time they are returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// The player is not in an active session.
    NoActiveSession,
    /// The request came over a connection that no longer speaks for the
    /// player.
    StaleConnection,
    /// A session broke one of its invariants and was aborted.
    SessionAborted(ResolveError),
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorError::NoActiveSession => write!(f, "no active session"),
            CoordinatorError::StaleConnection => write!(f, "connection has been superseded"),
            CoordinatorError::SessionAborted(e) => write!(f, "session aborted: {}", e),
        }
    }
}

impl std::error::Error for CoordinatorError {}

impl From<ResolveError> for CoordinatorError {
    fn from(e: ResolveError) -> Self {
        CoordinatorError::SessionAborted(e)
    }
}

impl From<InvariantViolation> for CoordinatorError {
    fn from(e: InvariantViolation) -> Self {
        CoordinatorError::SessionAborted(ResolveError::Invariant(e))
    }
}
