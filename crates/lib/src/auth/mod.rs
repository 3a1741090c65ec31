//! Auth state for one client instance.
//!
//! [`AuthSession`] is the one production subscriber of the session
//! coordinator. It owns the local view of who is logged in, published
//! through a watch channel so callers can both read the current phase
//! and react to changes. Server truth arrives three ways: explicit
//! login/logout calls, the `/api/auth/me` bootstrap probe, and
//! session-expired notifications from the coordinator.

mod error;
mod types;

pub use error::AuthError;
pub use types::{Credentials, CurrentUser, UserRole};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::{
    client::{HubClient, paths},
    session::SessionSubscription,
};

/// Where the local session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPhase {
    /// Nothing is known yet; `bootstrap` has not completed.
    Unknown,
    /// A login or bootstrap call is in flight.
    Loading,
    /// The server recognized the session.
    Authenticated(CurrentUser),
    /// No session, by explicit logout, rejection, or expiry.
    Unauthenticated,
}

impl AuthPhase {
    /// The authenticated user, when there is one.
    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            AuthPhase::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthPhase::Authenticated(_))
    }
}

/// Reactive auth state holder bound to one [`HubClient`].
///
/// Construction subscribes to the client's coordinator; the subscription
/// lives exactly as long as the session object. On a session-expired
/// notification the user is cleared, unless the session is already
/// unauthenticated, in which case nothing happens and watchers are not
/// woken (the guard that keeps expiry storms from looping a login
/// screen).
#[derive(Debug)]
pub struct AuthSession {
    client: HubClient,
    phase: watch::Sender<AuthPhase>,
    _expiry_subscription: SessionSubscription,
}

impl AuthSession {
    /// Creates the holder and registers it with the client's coordinator.
    pub fn new(client: HubClient) -> Self {
        let (phase, _) = watch::channel(AuthPhase::Unknown);

        let expiry_subscription = client.coordinator().subscribe({
            let phase = phase.clone();
            move || {
                let cleared = phase.send_if_modified(|current| {
                    if matches!(current, AuthPhase::Unauthenticated) {
                        false
                    } else {
                        *current = AuthPhase::Unauthenticated;
                        true
                    }
                });
                if cleared {
                    info!("session expired, local auth state cleared");
                }
            }
        });

        Self {
            client,
            phase,
            _expiry_subscription: expiry_subscription,
        }
    }

    /// The client this session authenticates.
    pub fn client(&self) -> &HubClient {
        &self.client
    }

    /// Current phase snapshot.
    pub fn phase(&self) -> AuthPhase {
        self.phase.borrow().clone()
    }

    /// The authenticated user, when there is one.
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.phase.borrow().user().cloned()
    }

    /// The authenticated user, or [`AuthError::NotAuthenticated`].
    pub fn require_user(&self) -> Result<CurrentUser, AuthError> {
        self.current_user().ok_or(AuthError::NotAuthenticated)
    }

    /// Subscribes to phase changes. The receiver sees every transition
    /// made after this call.
    pub fn watch(&self) -> watch::Receiver<AuthPhase> {
        self.phase.subscribe()
    }

    /// Probes `/api/auth/me` to restore a session carried by the cookie.
    ///
    /// Returns the user when the server recognizes the session, `None`
    /// when it does not. Being told "no session" here is a normal answer,
    /// not a session loss; it never feeds the expiry heuristic.
    pub async fn bootstrap(&self) -> Result<Option<CurrentUser>, AuthError> {
        let previous = self.phase.borrow().clone();
        self.phase.send_replace(AuthPhase::Loading);

        match self.client.get_json::<CurrentUser>(paths::AUTH_ME).await {
            Ok(user) => {
                debug!(user = %user.id, "session restored");
                self.phase.send_replace(AuthPhase::Authenticated(user.clone()));
                Ok(Some(user))
            }
            Err(e) if e.is_unauthorized() => {
                self.phase.send_replace(AuthPhase::Unauthenticated);
                Ok(None)
            }
            Err(e) => {
                // Transport failure; session knowledge is unchanged.
                self.phase.send_replace(previous);
                Err(e.into())
            }
        }
    }

    /// Exchanges credentials for a session cookie.
    pub async fn login(&self, credentials: &Credentials) -> Result<CurrentUser, AuthError> {
        let previous = self.phase.borrow().clone();
        self.phase.send_replace(AuthPhase::Loading);

        match self
            .client
            .post_json::<Credentials, CurrentUser>(paths::AUTH_LOGIN, credentials)
            .await
        {
            Ok(user) => {
                info!(user = %user.id, "logged in");
                self.phase.send_replace(AuthPhase::Authenticated(user.clone()));
                Ok(user)
            }
            Err(e) if e.is_unauthorized() => {
                self.phase.send_replace(AuthPhase::Unauthenticated);
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => {
                self.phase.send_replace(previous);
                Err(e.into())
            }
        }
    }

    /// Ends the session everywhere.
    ///
    /// The server call is best effort; local state clears regardless, the
    /// CSRF token cache empties, and other instances are told to follow.
    /// Local subscribers are not re-notified, the transition below
    /// already covers this instance.
    pub async fn logout(&self) {
        if let Err(e) = self.client.post_unit(paths::AUTH_LOGOUT).await {
            debug!(error = %e, "logout request failed, clearing local session anyway");
        }
        self.client.clear_csrf_token().await;
        self.phase.send_replace(AuthPhase::Unauthenticated);
        self.client.coordinator().emit_logout();
        info!("logged out");
    }
}
