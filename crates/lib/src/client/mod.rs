//! HTTP client for the Hub Chantier API.
//!
//! [`HubClient`] owns the transport concerns every typed operation rides
//! on: joining paths onto the configured base URL, carrying the HTTP-only
//! session cookie, attaching the CSRF header to mutating requests, and
//! watching response statuses for the consecutive-unauthorized streak
//! that marks a lost session. When the streak trips, the client fires a
//! session-expired notification through its [`SessionCoordinator`].

pub mod chantiers;
mod csrf;
mod error;
mod failures;
pub mod paths;

pub use chantiers::{Chantier, ChantierFilter, ChantierStatut, ChantierUpdate, NewChantier, Page};
pub use csrf::CSRF_HEADER;
pub use error::ClientError;
pub use failures::DEFAULT_FAILURE_THRESHOLD;

use std::{sync::Arc, time::Duration};

use reqwest::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::warn;
use url::Url;

use crate::session::SessionCoordinator;
use csrf::{CsrfCache, CsrfTokenResponse};
use failures::FailureTracker;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of the `/health` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    /// Whether the server reported itself healthy.
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// API client for one Hub Chantier backend.
///
/// Cloning yields another handle onto the same client; clones share the
/// cookie jar, the CSRF cache, and the unauthorized-streak state.
#[derive(Debug, Clone)]
pub struct HubClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    coordinator: SessionCoordinator,
    csrf: CsrfCache,
    failures: FailureTracker,
}

impl HubClient {
    /// Start building a client for the API at `base_url`.
    pub fn builder(base_url: impl Into<String>) -> HubClientBuilder {
        HubClientBuilder {
            base_url: base_url.into(),
            coordinator: None,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// The coordinator this client reports session loss to.
    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.inner.coordinator
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Probes `/health` on the server.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.get_json("/health").await
    }

    /// Core request pipeline. Every API call funnels through here so the
    /// CSRF header and the unauthorized streak see consistent traffic.
    pub(crate) async fn send_request<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.join(path)?;

        let mut request = self.inner.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        if paths::is_mutating(&method) && !paths::is_bootstrap_path(path) {
            if let Some(token) = self.csrf_token().await {
                request = request.header(CSRF_HEADER, token);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::ConnectionFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        self.observe_status(path, response)
    }

    /// Feeds a response's status into the session-loss heuristic and maps
    /// failures to errors.
    ///
    /// Only successes and non-bootstrap 401s touch the streak; other
    /// failures leave it as it stands.
    fn observe_status(&self, path: &str, response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            self.inner.failures.record_success();
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            if !paths::is_bootstrap_path(path) && self.inner.failures.record_unauthorized() {
                warn!(path, "consecutive unauthorized responses, session considered expired");
                self.inner.coordinator.emit_session_expired();
            }
            return Err(ClientError::Unauthorized {
                path: path.to_string(),
            });
        }
        Err(ClientError::Status {
            status,
            path: path.to_string(),
        })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send_request::<()>(Method::GET, path, None).await?;
        Self::decode(path, response).await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send_request(Method::POST, path, Some(body)).await?;
        Self::decode(path, response).await
    }

    pub(crate) async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send_request(Method::PUT, path, Some(body)).await?;
        Self::decode(path, response).await
    }

    /// POST where the response body does not matter.
    pub(crate) async fn post_unit(&self, path: &str) -> Result<(), ClientError> {
        self.send_request::<()>(Method::POST, path, None).await?;
        Ok(())
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send_request::<()>(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Cached CSRF token, fetched lazily on the first mutating request.
    async fn csrf_token(&self) -> Option<String> {
        self.inner.csrf.get_or_fetch(self.fetch_csrf_token()).await
    }

    /// Fetches a token from the issuance endpoint.
    ///
    /// Sent directly instead of through [`send_request`]: the pipeline
    /// awaits this future from its CSRF step, so its future must not
    /// contain the pipeline's.
    async fn fetch_csrf_token(&self) -> Result<String, ClientError> {
        let url = self.join(paths::AUTH_CSRF_TOKEN)?;
        let response = self
            .inner
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ClientError::ConnectionFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let response = self.observe_status(paths::AUTH_CSRF_TOKEN, response)?;
        let body: CsrfTokenResponse = Self::decode(paths::AUTH_CSRF_TOKEN, response).await?;
        Ok(body.csrf_token)
    }

    fn join(&self, path: &str) -> Result<Url, ClientError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ClientError::InvalidPath {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Forgets the cached CSRF token, called on logout.
    pub(crate) async fn clear_csrf_token(&self) {
        self.inner.csrf.clear().await;
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        response: Response,
    ) -> Result<T, ClientError> {
        response.json().await.map_err(|e| ClientError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Builder for [`HubClient`].
#[derive(Debug)]
pub struct HubClientBuilder {
    base_url: String,
    coordinator: Option<SessionCoordinator>,
    failure_threshold: u32,
    timeout: Duration,
}

impl HubClientBuilder {
    /// Coordinator to report session loss to. Without one, the client
    /// builds a standalone coordinator of its own.
    pub fn coordinator(mut self, coordinator: &SessionCoordinator) -> Self {
        self.coordinator = Some(coordinator.clone());
        self
    }

    /// Number of consecutive unauthorized responses that mark the session
    /// as lost. Defaults to [`DEFAULT_FAILURE_THRESHOLD`]; clamped to at
    /// least 1.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Per-request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HubClient, ClientError> {
        let base_url = Url::parse(&self.base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .build()
            .map_err(|e| ClientError::Init(e.to_string()))?;
        let coordinator = self
            .coordinator
            .unwrap_or_else(|| SessionCoordinator::builder().build());

        Ok(HubClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                coordinator,
                csrf: CsrfCache::new(),
                failures: FailureTracker::new(self.failure_threshold),
            }),
        })
    }
}
