//! Session renewal and teardown

use super::error::ClientError;
use super::interceptor::CallState;
use super::session::{SessionTerminated, TerminationReason};
use super::store::CredentialKey;
use super::{ApiClient, error_from_response};
use crate::types::{RefreshRequest, RefreshResponse};
use reqwest::header::HeaderValue;

/// Credential renewal endpoint, relative to the base URL
pub const REFRESH_PATH: &str = "users/token/refresh/";

/// Outcome of a renewal that did not fail outright
pub(crate) enum Renewal {
    /// A fresh access credential, already persisted
    Renewed(String),
    /// The session is gone: torn down now for lack of a refresh credential, or
    /// earlier by a concurrent caller
    Unavailable,
}

impl ApiClient {
    /// Renew the access credential after a 401.
    ///
    /// `stale` is the credential the rejected request carried. Renewals are
    /// serialized; a caller that finds the stored credential already replaced
    /// while it waited uses that one instead of refreshing again, and one that
    /// finds it gone leaves the teardown to whoever performed it.
    pub(crate) async fn renew_session(&self, stale: Option<&str>) -> Result<Renewal, ClientError> {
        let _gate = self.refresh_gate.lock().await;

        match self.read_credential(CredentialKey::Access).await {
            Some(current) if stale != Some(current.as_str()) => {
                debug!("Access credential already renewed by a concurrent request");
                return Ok(Renewal::Renewed(current));
            }
            None if stale.is_some() => {
                debug!(
                    state = %CallState::SessionTerminated,
                    "Session already torn down by a concurrent request"
                );
                return Ok(Renewal::Unavailable);
            }
            _ => {}
        }

        let Some(refresh) = self.read_credential(CredentialKey::Refresh).await else {
            self.terminate_session(TerminationReason::MissingRefreshCredential)
                .await;
            return Ok(Renewal::Unavailable);
        };

        debug!(state = %CallState::Refreshing, "Renewing access credential");
        match self.request_refresh(&refresh).await {
            Ok(access) => {
                if let Err(e) = self.store.set(CredentialKey::Access, &access).await {
                    warn!(error = %e, "Failed to persist renewed access credential");
                }
                info!(state = %CallState::RefreshSucceeded, "Access credential renewed");
                Ok(Renewal::Renewed(access))
            }
            Err(e) => {
                warn!(error = %e, state = %CallState::RefreshFailed, "Session refresh failed");
                self.terminate_session(TerminationReason::RefreshRejected)
                    .await;
                Err(ClientError::RefreshFailed(Box::new(e)))
            }
        }
    }

    /// Call the refresh endpoint directly, bypassing interception
    async fn request_refresh(&self, refresh: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .post(self.url(REFRESH_PATH))
            .json(&RefreshRequest {
                refresh: refresh.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: RefreshResponse = response.json().await?;
        if body.access.is_empty() {
            return Err(ClientError::AuthenticationFailed(
                "refresh response carried an empty access credential".into(),
            ));
        }
        if HeaderValue::from_str(&format!("Bearer {}", body.access)).is_err() {
            return Err(ClientError::AuthenticationFailed(
                "refresh response carried an access credential that is not a valid header value"
                    .into(),
            ));
        }
        Ok(body.access)
    }

    /// Wipe every stored credential and tell the listener
    pub(crate) async fn terminate_session(&self, reason: TerminationReason) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "Failed to clear stored credentials");
        }

        warn!(
            reason = %reason,
            login_path = %self.login_path,
            state = %CallState::SessionTerminated,
            "Session terminated"
        );
        self.listener.on_session_terminated(&SessionTerminated {
            reason,
            login_path: self.login_path.clone(),
        });
    }
}
