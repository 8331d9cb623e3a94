//! Client-side session state.

use serde_json::json;
use tokio::sync::watch;

use crate::constants::{LOGIN_PATH, LOGOUT_PATH, ME_PATH};
use crate::server::UserEnvelope;
use crate::user::Identity;

use super::api::{ApiClient, ApiRequest};
use super::errors::ClientError;

/// What the client currently knows about its session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No identity known.
    #[default]
    Anonymous,
    Authenticated(Identity),
    /// Renewal failed and the session was torn down. Callers should send
    /// the user back to login.
    Expired,
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Holds the last known identity in memory.
///
/// Nothing is persisted; after a restart call
/// [`fetch_identity`](Self::fetch_identity) to rehydrate from the server.
#[derive(Debug, Clone)]
pub struct SessionStore {
    api: ApiClient,
}

impl SessionStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Create a store with a fresh client for `base_url`.
    pub fn connect(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self::new(ApiClient::new(base_url)?))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> SessionState {
        self.api.state().borrow().clone()
    }

    /// Watch session transitions, including the `Expired` teardown signal.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.api.state().subscribe()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.api.state().borrow().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.identity().is_some_and(|i| i.is_admin())
    }

    /// Log in; the server sets both credential cookies.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, ClientError> {
        let envelope: UserEnvelope = self
            .api
            .post_json(
                LOGIN_PATH,
                &json!({"username": username, "password": password}),
            )
            .await?;
        self.api
            .state()
            .send_replace(SessionState::Authenticated(envelope.user.clone()));
        Ok(envelope.user)
    }

    /// Load the identity from the server unless it is already known.
    ///
    /// Failure is the normal outcome for a signed-out client and is not
    /// reported; the identity simply stays unknown.
    pub async fn fetch_identity(&self) -> Option<Identity> {
        if let Some(identity) = self.identity() {
            return Some(identity);
        }

        match self.api.get_json::<Identity>(ME_PATH).await {
            Ok(identity) => {
                self.api
                    .state()
                    .send_replace(SessionState::Authenticated(identity.clone()));
                Some(identity)
            }
            Err(e) => {
                tracing::debug!("No active session: {e}");
                self.api.state().send_if_modified(|state| {
                    let authenticated = matches!(state, SessionState::Authenticated(_));
                    if authenticated {
                        *state = SessionState::Anonymous;
                    }
                    authenticated
                });
                None
            }
        }
    }

    /// Log out. Always ends anonymous, even if the server is unreachable.
    pub async fn logout(&self) {
        match self.api.send(&ApiRequest::post(LOGOUT_PATH)).await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => tracing::warn!(status = %response.status(), "Logout refused"),
            Err(e) => tracing::warn!("Logout failed: {e}"),
        }
        self.api.state().send_replace(SessionState::Anonymous);
    }
}
