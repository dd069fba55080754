//! igen API client
//!
//! [`ApiClient`] authenticates every outgoing call with the stored access
//! credential. When the backend answers 401 it renews the credential once
//! through the refresh endpoint and replays the call; when renewal is
//! impossible it wipes the session and notifies the [`SessionListener`].

pub mod auth;
pub mod error;
pub mod interceptor;
mod refresh;
pub mod resources;
pub mod session;
pub mod store;

use error::ClientError;
use igen_core::ClientConfig;
use interceptor::CallState;
use refresh::Renewal;
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use session::{LoggingListener, SessionListener};
use std::sync::Arc;
use std::time::Duration;
use store::{CredentialStore, MemoryCredentialStore};
use tokio::sync::Mutex;

pub use auth::LOGIN_PATH;
pub use refresh::REFRESH_PATH;

/// Authenticated console API client
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    listener: Arc<dyn SessionListener>,
    refresh_gate: Arc<Mutex<()>>,
    login_path: String,
    max_refresh_attempts: u32,
}

impl ApiClient {
    /// Create a new client with default configuration and an in-memory store
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credential store shared by every clone of this client
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Absolute URL for a path relative to the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Create a request builder for a path relative to the base URL.
    ///
    /// Credentials are attached when the request goes through [`send`](Self::send).
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send a request with credential attachment and silent session renewal.
    ///
    /// Responses other than 401 are returned untouched, error statuses
    /// included. A 401 triggers at most `max_refresh_attempts` renew-and-replay
    /// cycles; once they are used up the last 401 response is returned.
    ///
    /// When the session is torn down instead, the result is
    /// [`ClientError::RefreshFailed`]: wrapping the refresh failure, or the
    /// request's own 401 when there was nothing to refresh with.
    pub async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, ClientError> {
        let mut pending = request.build()?;
        let mut bearer = self.attach_credential(&mut pending).await;
        let mut refreshes: u32 = 0;

        loop {
            let method = pending.method().clone();
            let url = pending.url().clone();
            let replay = pending.try_clone();

            debug!(%method, %url, state = %CallState::Sent, "Sending request");
            let response = self.client.execute(pending).await?;
            let status = response.status();

            if status != StatusCode::UNAUTHORIZED {
                let state = CallState::for_status(status);
                debug!(%method, %url, status = status.as_u16(), state = %state, "Request finished");
                return Ok(response);
            }

            debug!(%method, %url, state = %CallState::FailedAuth, "Request unauthorized");

            if refreshes >= self.max_refresh_attempts {
                if refreshes > 0 {
                    warn!(%method, %url, refreshes, "Replayed request still unauthorized");
                }
                return Ok(response);
            }

            let Some(mut next) = replay else {
                warn!(%method, %url, "Request body cannot be replayed; not renewing session");
                return Ok(response);
            };

            refreshes += 1;
            match self.renew_session(bearer.as_deref()).await? {
                Renewal::Renewed(access) => {
                    if !interceptor::insert_bearer(&mut next, &access) {
                        warn!(
                            %method,
                            %url,
                            state = %CallState::FailedAuth,
                            "Renewed access credential is unusable; not replaying"
                        );
                        return Ok(response);
                    }
                    debug!(%method, %url, state = %CallState::Replayed, "Replaying request");
                    bearer = Some(access);
                    pending = next;
                }
                Renewal::Unavailable => {
                    let rejected = error_from_response(response).await;
                    return Err(ClientError::RefreshFailed(Box::new(rejected)));
                }
            }
        }
    }

    /// Execute a request and decode a JSON success body
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Execute a request whose success body is ignored
    pub async fn execute_empty(&self, request: reqwest::RequestBuilder) -> Result<(), ClientError> {
        let response = self.send(request).await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }
}

/// Map a non-success response to a [`ClientError`]
pub(crate) async fn error_from_response(response: Response) -> ClientError {
    let status = response.status();
    let message = response.text().await.unwrap_or_else(|_| status.to_string());
    ClientError::from_status(status, message)
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    store: Option<Arc<dyn CredentialStore>>,
    listener: Option<Arc<dyn SessionListener>>,
    login_path: Option<String>,
    max_refresh_attempts: Option<u32>,
}

impl ApiClientBuilder {
    /// Start from a loaded configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut builder = Self::default()
            .base_url(config.api.base_url.clone())
            .login_path(config.session.login_path.clone())
            .max_refresh_attempts(config.session.max_refresh_attempts);

        if let Some(timeout) = config.api.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &config.api.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        builder
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the credential store (defaults to an empty in-memory store)
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the session listener (defaults to [`LoggingListener`])
    pub fn listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Set the login entry point reported on session teardown
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = Some(path.into());
        self
    }

    /// Cap renew-and-replay cycles per original request (0 disables renewal)
    pub fn max_refresh_attempts(mut self, attempts: u32) -> Self {
        self.max_refresh_attempts = Some(attempts);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url is empty".into()));
        }

        let mut client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(user_agent) = self.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        } else {
            client_builder =
                client_builder.user_agent(concat!("igen-client/", env!("CARGO_PKG_VERSION")));
        }

        let client = client_builder.build()?;

        Ok(ApiClient {
            client,
            base_url,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new())),
            listener: self.listener.unwrap_or_else(|| Arc::new(LoggingListener)),
            refresh_gate: Arc::new(Mutex::new(())),
            login_path: self.login_path.unwrap_or_else(|| "/".to_string()),
            max_refresh_attempts: self.max_refresh_attempts.unwrap_or(1),
        })
    }
}
