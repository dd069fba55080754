//! Authentication API client methods

use super::store::CredentialKey;
use super::{ApiClient, ClientError, error_from_response};
use crate::types::{LoginRequest, TokenPair};
use igen_core::{Claims, DASHBOARD_ROLES, Resource, Role};

/// Login endpoint, relative to the base URL
pub const LOGIN_PATH: &str = "users/token/";

impl ApiClient {
    /// Exchange a user id and password for a credential pair and persist both
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, user_id: &str, password: &str) -> Result<TokenPair, ClientError> {
        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(&LoginRequest {
                user_id: user_id.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let pair: TokenPair = response.json().await?;
        self.store.set(CredentialKey::Access, &pair.access).await?;
        self.store.set(CredentialKey::Refresh, &pair.refresh).await?;

        info!("Signed in");
        Ok(pair)
    }

    /// Forget the current session
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.store.clear().await?;
        info!("Signed out");
        Ok(())
    }

    /// Whether an access credential is stored
    pub async fn is_authenticated(&self) -> bool {
        self.read_credential(CredentialKey::Access).await.is_some()
    }

    /// Claims of the stored access credential
    pub async fn current_claims(&self) -> Result<Claims, ClientError> {
        let token = self
            .read_credential(CredentialKey::Access)
            .await
            .ok_or_else(|| ClientError::AuthenticationFailed("not signed in".into()))?;

        Claims::decode(&token).map_err(|e| ClientError::AuthenticationFailed(e.to_string()))
    }

    /// Check that the signed-in role may use `resource`
    pub async fn authorize(&self, resource: Resource) -> Result<Role, ClientError> {
        self.authorize_roles(resource.name(), resource.allowed_roles())
            .await
    }

    /// Check that the signed-in role may read the dashboard
    pub async fn authorize_dashboard(&self) -> Result<Role, ClientError> {
        self.authorize_roles("dashboard", DASHBOARD_ROLES).await
    }

    /// Check the signed-in role against an allowed set
    pub async fn authorize_roles(&self, area: &str, allowed: &[Role]) -> Result<Role, ClientError> {
        let claims = self.current_claims().await?;
        match claims.role {
            Some(role) if allowed.contains(&role) => Ok(role),
            role => Err(ClientError::AccessDenied {
                role,
                resource: area.to_string(),
            }),
        }
    }
}
