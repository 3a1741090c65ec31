//! Error types for the API client module.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur during API client operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The configured base URL could not be parsed.
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A request path could not be joined onto the base URL.
    #[error("Invalid request path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The underlying HTTP client could not be constructed.
    #[error("Failed to initialize HTTP client: {0}")]
    Init(String),

    /// The request never produced a response.
    #[error("Failed to connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// The server rejected the session.
    #[error("Unauthorized response from {path}")]
    Unauthorized { path: String },

    /// Any other non-success status.
    #[error("Server returned {status} for {path}")]
    Status { status: StatusCode, path: String },

    /// The response body could not be decoded.
    #[error("Failed to decode response from {path}: {reason}")]
    Decode { path: String, reason: String },
}

impl ClientError {
    /// Check if this is a configuration error (bad URL or client init).
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidBaseUrl { .. }
                | ClientError::InvalidPath { .. }
                | ClientError::Init(_)
        )
    }

    /// Check if this is a network/connection error.
    pub fn is_network_error(&self) -> bool {
        matches!(self, ClientError::ConnectionFailed { .. })
    }

    /// Check if the server rejected the session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    /// Check if this is a not found response.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }

    /// Check if the server reported an internal failure.
    pub fn is_server_error(&self) -> bool {
        matches!(self, ClientError::Status { status, .. } if status.is_server_error())
    }
}

impl From<ClientError> for crate::Error {
    fn from(err: ClientError) -> Self {
        crate::Error::Client(err)
    }
}
