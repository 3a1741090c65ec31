//! Error types for the auth module.

use thiserror::Error;

use crate::client::ClientError;

/// Errors that can occur during auth operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// The server rejected the submitted credentials.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// An operation that needs an authenticated session ran without one.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Transport-level failure underneath an auth operation.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl AuthError {
    /// Check if the submitted credentials were rejected.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, AuthError::InvalidCredentials)
    }

    /// Check if this error is authentication-related (bad credentials,
    /// missing session, or a rejected session underneath).
    pub fn is_authentication_error(&self) -> bool {
        match self {
            AuthError::InvalidCredentials | AuthError::NotAuthenticated => true,
            AuthError::Client(e) => e.is_unauthorized(),
        }
    }

    /// Check if this is a network/connection error.
    pub fn is_network_error(&self) -> bool {
        matches!(self, AuthError::Client(e) if e.is_network_error())
    }
}

impl From<AuthError> for crate::Error {
    fn from(err: AuthError) -> Self {
        crate::Error::Auth(err)
    }
}
