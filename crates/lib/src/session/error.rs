//! Error types for the session coordination module.

use thiserror::Error;

/// Errors that can occur during session coordination operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// Attempted to attach to a logout bus that has been closed.
    #[error("Logout bus is closed")]
    BusClosed,
}

impl SessionError {
    /// Check if this is a medium availability error.
    pub fn is_medium_unavailable(&self) -> bool {
        matches!(self, SessionError::BusClosed)
    }
}

impl From<SessionError> for crate::Error {
    fn from(err: SessionError) -> Self {
        crate::Error::Session(err)
    }
}
