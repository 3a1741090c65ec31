//!
//! Client SDK for the Hub Chantier construction-site management API.
//!
//! The crate keeps several concurrent client instances of one
//! application session agreed on whether that session still exists, and
//! gives them a typed surface over the API.
//!
//! ## Core concepts
//!
//! * **Session coordination (`session`)**: a [`SessionCoordinator`] per
//!   client instance fans session-expiry events out to subscribers and
//!   propagates logout signals to the other instances, over a
//!   [`LogoutBus`] when one can be attached and the [`SharedStorage`]
//!   sentinel protocol otherwise.
//! * **API client (`client`)**: [`HubClient`] carries the HTTP-only
//!   session cookie and the CSRF header, and watches for the
//!   consecutive-unauthorized streak that marks a lost session.
//! * **Auth state (`auth`)**: [`AuthSession`] holds the reactive view of
//!   who is logged in and is the coordinator's one production
//!   subscriber.
//!
//! ```no_run
//! use chantier_hub::{AuthSession, HubClient, LogoutBus, SessionCoordinator};
//!
//! # async fn demo() -> chantier_hub::Result<()> {
//! let bus = LogoutBus::new();
//! let coordinator = SessionCoordinator::builder().bus(&bus).build();
//! let client = HubClient::builder("https://hub.chantier.example")
//!     .coordinator(&coordinator)
//!     .build()?;
//! let auth = AuthSession::new(client.clone());
//!
//! if auth.bootstrap().await?.is_none() {
//!     // No cookie-backed session; show the login screen.
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod session;

pub use auth::{AuthPhase, AuthSession};
pub use client::{HubClient, HubClientBuilder};
pub use session::{LogoutBus, SessionCoordinator, SessionSubscription, SharedStorage};

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured session coordination errors from the session module
    #[error(transparent)]
    Session(session::SessionError),

    /// Structured API client errors from the client module
    #[error(transparent)]
    Client(client::ClientError),

    /// Structured auth errors from the auth module
    #[error(transparent)]
    Auth(auth::AuthError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
            Error::Session(_) => "session",
            Error::Client(_) => "client",
            Error::Auth(_) => "auth",
        }
    }

    /// Check if this error means the session was rejected or the
    /// credentials were bad.
    pub fn is_authentication_error(&self) -> bool {
        match self {
            Error::Client(client_err) => client_err.is_unauthorized(),
            Error::Auth(auth_err) => auth_err.is_authentication_error(),
            _ => false,
        }
    }

    /// Check if this error is network/connection related.
    pub fn is_network_error(&self) -> bool {
        match self {
            Error::Client(client_err) => client_err.is_network_error(),
            Error::Auth(auth_err) => auth_err.is_network_error(),
            _ => false,
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Client(client_err) => client_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is configuration-related.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Error::Client(client_err) => client_err.is_configuration_error(),
            _ => false,
        }
    }
}
