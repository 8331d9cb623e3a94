//! HTTP client with transparent credential renewal.
//!
//! Every request goes through [`ApiClient::send`]. A 401 from any endpoint
//! other than the session endpoints themselves triggers a coalesced renewal
//! and a single replay of the original request.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use url::Url;

use crate::constants::{LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH};

use super::errors::ClientError;
use super::renewal::{RenewalCoordinator, RenewalError, RenewalOutcome};
use super::session::SessionState;

/// A request that can be replayed after renewal.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Whether a 401 from `path` should trigger renewal.
///
/// Session endpoints answer 401 for reasons renewal cannot fix.
fn triggers_renewal(path: &str) -> bool {
    ![LOGIN_PATH, REFRESH_PATH, LOGOUT_PATH].contains(&path)
}

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
    coordinator: RenewalCoordinator,
    state: watch::Sender<SessionState>,
}

/// Cookie-carrying API client. Cheap to clone; clones share cookies, the
/// renewal slot and the session state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl {
            reason: format!("{base_url}: {e}"),
        })?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()?;
        let (state, _) = watch::channel(SessionState::Anonymous);

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                jar,
                base,
                coordinator: RenewalCoordinator::new(),
                state,
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    pub fn coordinator(&self) -> &RenewalCoordinator {
        &self.inner.coordinator
    }

    pub(crate) fn state(&self) -> &watch::Sender<SessionState> {
        &self.inner.state
    }

    /// `Cookie` header the client would send to the server, if any.
    pub fn cookie_header(&self) -> Option<String> {
        self.inner
            .jar
            .cookies(&self.inner.base)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }

    /// Whether the client currently holds a non-empty cookie named `name`.
    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookie_header().is_some_and(|header| {
            header
                .split("; ")
                .filter_map(|pair| pair.split_once('='))
                .any(|(n, v)| n == name && !v.is_empty())
        })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.inner.base.join(path).map_err(|e| ClientError::InvalidUrl {
            reason: format!("{path}: {e}"),
        })
    }

    async fn execute(&self, request: &ApiRequest) -> Result<reqwest::Response, ClientError> {
        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), self.url(&request.path)?);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    async fn call_refresh(&self) -> RenewalOutcome {
        let url = self.url(REFRESH_PATH).map_err(|e| RenewalError::Transport {
            reason: e.to_string(),
        })?;
        let response = self.inner.http.post(url).send().await.map_err(|e| {
            RenewalError::Transport {
                reason: e.to_string(),
            }
        })?;

        if response.status().is_success() {
            tracing::debug!("Access credential renewed");
            Ok(())
        } else {
            Err(RenewalError::Rejected {
                status: response.status().as_u16(),
            })
        }
    }

    /// Clear server-side cookies and announce the expired session.
    async fn teardown(&self) {
        if let Err(e) = self.execute(&ApiRequest::post(LOGOUT_PATH)).await {
            tracing::warn!("Logout during teardown failed: {e}");
        }
        self.inner.state.send_replace(SessionState::Expired);
    }

    /// Send a request, renewing the session and replaying once on 401.
    pub async fn send(&self, request: &ApiRequest) -> Result<reqwest::Response, ClientError> {
        let epoch = self.inner.coordinator.epoch();
        let response = self.execute(request).await?;

        if response.status() != StatusCode::UNAUTHORIZED || !triggers_renewal(&request.path) {
            return Ok(response);
        }

        tracing::debug!(path = %request.path, "Access credential rejected, renewing session");
        self.inner
            .coordinator
            .renew(epoch, || self.call_refresh(), || self.teardown())
            .await
            .map_err(|source| ClientError::SessionExpired { source })?;

        self.execute(request).await
    }

    /// Send a request and decode a successful JSON response.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| status.to_string());
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }
        response.json().await.map_err(|e| ClientError::Decode {
            reason: e.to_string(),
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send_json(&ApiRequest::get(path)).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_value(body).map_err(|e| ClientError::Decode {
            reason: format!("Failed to serialize request body: {e}"),
        })?;
        self.send_json(&ApiRequest::post(path).json(body)).await
    }
}
