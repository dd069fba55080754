//! Request interception: bearer attachment and per-call state tracking

use super::ApiClient;
use super::store::CredentialKey;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use std::fmt;

/// Where a single call is in its lifecycle.
///
/// `Sent` leads to `Succeeded`, `FailedNonAuth` or `FailedAuth`. A
/// `FailedAuth` call moves through `Refreshing` to either `RefreshSucceeded`
/// and `Replayed`, or `RefreshFailed` and `SessionTerminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Sent,
    Succeeded,
    FailedNonAuth,
    FailedAuth,
    Refreshing,
    RefreshSucceeded,
    Replayed,
    RefreshFailed,
    SessionTerminated,
}

impl CallState {
    /// State reached by a response that is not a 401
    pub fn for_status(status: StatusCode) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            Self::FailedAuth
        } else if status.is_success() {
            Self::Succeeded
        } else {
            Self::FailedNonAuth
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Succeeded => "succeeded",
            Self::FailedNonAuth => "failed_non_auth",
            Self::FailedAuth => "failed_auth",
            Self::Refreshing => "refreshing",
            Self::RefreshSucceeded => "refresh_succeeded",
            Self::Replayed => "replayed",
            Self::RefreshFailed => "refresh_failed",
            Self::SessionTerminated => "session_terminated",
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set `Authorization: Bearer <token>` on a request.
///
/// Returns false, leaving the request untouched, when the token cannot be
/// carried in a header.
pub fn insert_bearer(request: &mut reqwest::Request, token: &str) -> bool {
    match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(mut value) => {
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
            true
        }
        Err(_) => {
            warn!("Stored access credential is not a valid header value; sending without it");
            false
        }
    }
}

impl ApiClient {
    /// Read a credential, treating store failures as absence
    pub(crate) async fn read_credential(&self, key: CredentialKey) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read credential");
                None
            }
        }
    }

    /// Attach the stored access credential to an outgoing request.
    ///
    /// Returns the credential that was attached. Never fails: without a usable
    /// credential the request goes out unauthenticated.
    pub(crate) async fn attach_credential(&self, request: &mut reqwest::Request) -> Option<String> {
        let token = self.read_credential(CredentialKey::Access).await?;
        insert_bearer(request, &token).then_some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::store::{CredentialStore, MemoryCredentialStore, StoreError};
    use async_trait::async_trait;
    use mockall::mock;
    use reqwest::Method;
    use std::sync::Arc;

    mock! {
        pub Store {}

        #[async_trait]
        impl CredentialStore for Store {
            async fn get(&self, key: CredentialKey) -> Result<Option<String>, StoreError>;
            async fn set(&self, key: CredentialKey, value: &str) -> Result<(), StoreError>;
            async fn clear(&self) -> Result<(), StoreError>;
        }
    }

    fn client_with(store: Arc<dyn CredentialStore>) -> ApiClient {
        ApiClient::builder()
            .base_url("http://127.0.0.1:8000/api/")
            .store(store)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_attaches_stored_access_credential() {
        let client = client_with(Arc::new(MemoryCredentialStore::with_credentials(
            Some("A1"),
            Some("R1"),
        )));
        let mut request = client.request(Method::GET, "transactions/").build().unwrap();

        let attached = client.attach_credential(&mut request).await;

        assert_eq!(attached.as_deref(), Some("A1"));
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer A1");
        assert!(request.headers()[AUTHORIZATION].is_sensitive());
    }

    #[tokio::test]
    async fn test_leaves_headers_alone_without_credential() {
        let client = client_with(Arc::new(MemoryCredentialStore::new()));
        let mut request = client.request(Method::GET, "companies/").build().unwrap();

        assert!(client.attach_credential(&mut request).await.is_none());
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_store_failure_sends_unauthenticated() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .withf(|key| *key == CredentialKey::Access)
            .times(1)
            .returning(|_| {
                Err(StoreError::Io(std::io::Error::other("storage unavailable")))
            });

        let client = client_with(Arc::new(store));
        let mut request = client.request(Method::GET, "banks/").build().unwrap();

        assert!(client.attach_credential(&mut request).await.is_none());
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_rejects_tokens_that_are_not_header_safe() {
        let mut request = reqwest::Request::new(
            Method::GET,
            "http://127.0.0.1:8000/api/assets/".parse().unwrap(),
        );
        assert!(!insert_bearer(&mut request, "bad\ntoken"));
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_call_states() {
        assert_eq!(CallState::for_status(StatusCode::OK), CallState::Succeeded);
        assert_eq!(
            CallState::for_status(StatusCode::INTERNAL_SERVER_ERROR),
            CallState::FailedNonAuth
        );
        assert_eq!(
            CallState::for_status(StatusCode::UNAUTHORIZED),
            CallState::FailedAuth
        );
        assert_eq!(CallState::RefreshSucceeded.to_string(), "refresh_succeeded");
    }
}
