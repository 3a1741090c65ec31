//! CSRF token caching.
//!
//! The server issues a CSRF token at `/api/auth/csrf-token`; mutating
//! requests echo it back in a header. The token is fetched lazily on the
//! first mutating request, cached for the life of the session, and
//! cleared on logout. A failed fetch is not fatal: the request goes out
//! without the header and the server's rejection follows the normal
//! error path.

use tokio::sync::Mutex;
use tracing::debug;

use super::error::ClientError;

/// Header carrying the CSRF token on mutating requests.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Body of the token issuance endpoint.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CsrfTokenResponse {
    pub csrf_token: String,
}

/// Single-slot, lazily filled token cache.
///
/// The slot lock is held across the fetch, so concurrent first requests
/// trigger one fetch and share its result.
#[derive(Debug, Default)]
pub(crate) struct CsrfCache {
    token: Mutex<Option<String>>,
}

impl CsrfCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token, running `fetch` to fill the slot on the
    /// first use. A fetch failure yields `None` and leaves the slot empty
    /// for the next attempt.
    pub(crate) async fn get_or_fetch<F>(&self, fetch: F) -> Option<String>
    where
        F: Future<Output = Result<String, ClientError>>,
    {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref() {
            return Some(token.clone());
        }
        match fetch.await {
            Ok(token) => {
                debug!("csrf token cached");
                *slot = Some(token.clone());
                Some(token)
            }
            Err(e) => {
                debug!(error = %e, "csrf token fetch failed, proceeding without header");
                None
            }
        }
    }

    /// Empties the slot; the next mutating request fetches a fresh token.
    pub(crate) async fn clear(&self) {
        *self.token.lock().await = None;
    }
}
