//! Authorized request gateway.
//!
//! ARCHITECTURE
//! ============
//! Every call to the remote API goes through `Gateway::send`, which runs two
//! phases around a single `reqwest` round trip:
//!
//! - request phase (`authorize`): unless the path contains one of the exempt
//!   substrings, the current session token is attached as a bearer
//!   credential. The token is read once and carried with the call.
//! - response phase (`settle`): 401 invalidates the session that issued the
//!   call and publishes `GatewayEvent::SessionInvalidated`; 5xx and timeouts
//!   are logged; every non-2xx outcome is returned to the caller as an error.
//!
//! Calls are fire-once. There is no retry, queueing or deduplication.

pub mod error;
pub mod request;

#[cfg(test)]
pub(crate) mod test_helpers;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use tokio::sync::broadcast;

pub use error::GatewayError;
pub use request::{ApiRequest, ApiResponse, AuthorizedRequest};

use crate::config::ClientConfig;
use crate::session::SessionStore;

const EVENT_CAPACITY: usize = 16;

/// Notifications published by the gateway for the hosting application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// The server answered 401. `cleared` reports whether the session that
    /// issued the call was still current and has been cleared.
    SessionInvalidated { path: String, cleared: bool },
}

pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    exempt_paths: Vec<String>,
    session: Arc<SessionStore>,
    events: broadcast::Sender<GatewayEvent>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url)
            .field("exempt_paths", &self.exempt_paths)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Build a gateway with one shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::ClientBuild` if the HTTP client cannot be
    /// constructed.
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| GatewayError::ClientBuild(e.to_string()))?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            exempt_paths: config.exempt_paths.clone(),
            session,
            events,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Subscribe to gateway events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.events.subscribe()
    }

    /// Whether `path` is on the allow-list that never receives a credential.
    #[must_use]
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|exempt| path.contains(exempt.as_str()))
    }

    /// Request phase: attach the current token unless the path is exempt.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidCredential` if the stored token cannot
    /// be encoded as a header value.
    pub fn authorize(&self, mut request: ApiRequest) -> Result<AuthorizedRequest, GatewayError> {
        if self.is_exempt(&request.path) {
            return Ok(AuthorizedRequest { request, token: None });
        }

        let token = self.session.token();
        if let Some(token) = &token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            request.headers.insert(AUTHORIZATION, value);
        }
        Ok(AuthorizedRequest { request, token })
    }

    /// Send one call through both phases.
    ///
    /// # Errors
    ///
    /// Returns a `GatewayError` for every non-2xx status, for timeouts and
    /// for transport failures. 401 errors are returned after the session has
    /// been invalidated.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, GatewayError> {
        let authorized = self.authorize(request)?;
        let path = authorized.request.path.clone();
        let url = format!("{}{}", self.base_url, path);

        let mut builder = self
            .http
            .request(authorized.request.method.clone(), url)
            .headers(authorized.request.headers.clone());
        if let Some(body) = &authorized.request.body {
            builder = builder.json(body);
        }

        tracing::debug!(
            method = %authorized.request.method,
            %path,
            credential = authorized.carries_credential(),
            "sending api request"
        );

        let response = builder.send().await.map_err(|e| transport_error(&path, e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_error(&path, e))?;

        self.settle(&authorized, status, body)
    }

    /// Response phase, applied to every call whether exempt or not.
    pub(crate) fn settle(
        &self,
        authorized: &AuthorizedRequest,
        status: u16,
        body: String,
    ) -> Result<ApiResponse, GatewayError> {
        let path = authorized.request.path.clone();
        match status {
            200..=299 => Ok(ApiResponse { status, body }),
            401 => {
                let cleared = authorized
                    .token
                    .as_deref()
                    .is_some_and(|token| self.session.clear_if_token(token));
                tracing::warn!(%path, cleared, "unauthorized response");
                // No subscribers is fine; the caller still gets the error.
                let _ = self.events.send(GatewayEvent::SessionInvalidated { path: path.clone(), cleared });
                Err(GatewayError::Unauthorized { path, body })
            }
            500..=599 => {
                tracing::error!(%path, status, "server error; please try again later");
                Err(GatewayError::Server { path, status, body })
            }
            _ => Err(GatewayError::Status { path, status, body }),
        }
    }
}

fn transport_error(path: &str, source: reqwest::Error) -> GatewayError {
    if source.is_timeout() {
        tracing::warn!(%path, "request timed out; please try again");
        GatewayError::Timeout { path: path.to_owned() }
    } else {
        tracing::warn!(%path, error = %source, "request failed");
        GatewayError::Transport { path: path.to_owned(), source }
    }
}
