//! Authentication state.
//!
//! [`AuthStore`] keeps the signed-in [`User`] in an observable store and
//! talks to the backend through an [`AuthApi`]. Failed calls never surface
//! as errors to the caller; they land in [`AuthState::error`].

use crate::{
    config::Config,
    error::{Result, SessionError},
};
use async_trait::async_trait;
use dashkit_engine::{Store, SubscriptionId};
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

pub const FETCH_USER_FAILED: &str = "Failed to fetch user";
pub const LOGOUT_FAILED: &str = "Failed to logout";

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub credits: i64,
    #[serde(default)]
    pub monthly_credits: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Any further properties the backend sends
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<User>,
    pub error: Option<String>,
    /// True only while a request is outstanding
    pub loading: bool,
}

/// Backend calls used by [`AuthStore`].
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn current_user(&self) -> Result<User>;
    async fn logout(&self) -> Result<()>;
}

/// [`AuthApi`] over HTTP.
///
/// Cookies set by the backend are kept for later calls. A configured session
/// cookie is attached to every request.
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    client: Client,
    me_url: Url,
    logout_url: Url,
    session_cookie: Option<String>,
}

impl HttpAuthClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            client,
            me_url: endpoint(&config.api_url, "api/auth/me")?,
            logout_url: endpoint(&config.api_url, "api/auth/logout")?,
            session_cookie: config.session_cookie.clone(),
        })
    }

    fn with_cookie(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session_cookie {
            Some(cookie) => request.header(header::COOKIE, cookie),
            None => request,
        }
    }
}

/// Resolve `path` below `base`, keeping any path prefix the base carries.
fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    Ok(base.join(path)?)
}

fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SessionError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

#[async_trait]
impl AuthApi for HttpAuthClient {
    async fn current_user(&self) -> Result<User> {
        let response = self
            .with_cookie(self.client.get(self.me_url.clone()))
            .send()
            .await?;
        let body = ensure_success(response)?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn logout(&self) -> Result<()> {
        let response = self
            .with_cookie(self.client.post(self.logout_url.clone()))
            .send()
            .await?;
        ensure_success(response)?;
        Ok(())
    }
}

/// Observable authentication state.
pub struct AuthStore<A = HttpAuthClient> {
    api: A,
    store: Store<AuthState>,
}

impl<A: AuthApi> AuthStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            store: Store::new(AuthState::default()),
        }
    }

    pub fn state(&self) -> &AuthState {
        self.store.state()
    }

    pub fn user(&self) -> Option<&User> {
        self.state().user.as_ref()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&AuthState) + Send + 'static) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Load the signed-in user.
    ///
    /// On success the user replaces any previous one and the error clears;
    /// on failure the user is cleared and the error is set.
    pub async fn fetch_current_user(&mut self) {
        self.store.update(|state| state.loading = true);
        let result = self.api.current_user().await;
        self.store.update(|state| {
            state.loading = false;
            match result {
                Ok(user) => {
                    tracing::debug!(user = %user.id, "current user loaded");
                    state.user = Some(user);
                    state.error = None;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "fetching current user failed");
                    state.user = None;
                    state.error = Some(FETCH_USER_FAILED.to_string());
                }
            }
        });
    }

    /// End the session. Either way the local user is cleared.
    pub async fn logout(&mut self) {
        self.store.update(|state| state.loading = true);
        let result = self.api.logout().await;
        self.store.update(|state| {
            state.loading = false;
            state.user = None;
            state.error = match result {
                Ok(()) => {
                    tracing::debug!("logged out");
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "logout failed");
                    Some(LOGOUT_FAILED.to_string())
                }
            };
        });
    }
}

impl<A> std::fmt::Debug for AuthStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("state", self.store.state())
            .finish()
    }
}
