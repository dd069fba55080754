//! Roles, token claims and the console's role-to-resource access table

use crate::error::{CoreError, CoreResult};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role carried in the access token's `role` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperUser,
    CenterHead,
    Accountant,
    PropertyManager,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperUser => "SUPER_USER",
            Self::CenterHead => "CENTER_HEAD",
            Self::Accountant => "ACCOUNTANT",
            Self::PropertyManager => "PROPERTY_MANAGER",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles allowed to read the dashboard statistics
pub const DASHBOARD_ROLES: &[Role] = &[Role::SuperUser, Role::CenterHead];

/// Claims decoded from an access token payload.
///
/// The signature is not verified; the backend remains the authority and the
/// claims are only used to pick what to show and to skip calls that would be
/// refused anyway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Primary key of the user; issued as a number or a string
    #[serde(default, deserialize_with = "string_or_number")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    /// Expiry as a Unix timestamp
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl Claims {
    /// Decode the payload segment of a JWT
    pub fn decode(token: &str) -> CoreResult<Self> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_)) if segments.next().is_none() => payload,
            _ => return Err(CoreError::invalid_token("expected three dot-separated segments")),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| CoreError::invalid_token(format!("payload is not base64url: {e}")))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::invalid_token(format!("payload is not a claims object: {e}")))
    }

    /// Expiry instant, if the token carries one
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Whether the token has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expires_at| now >= expires_at)
    }

    /// Whether the carried role is one of `allowed`
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        self.role.is_some_and(|role| allowed.contains(&role))
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(value)) => Some(value),
        Some(serde_json::Value::Number(value)) => Some(value.to_string()),
        _ => None,
    })
}

/// Backend collections managed through the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Companies,
    Banks,
    CostCentres,
    TransactionTypes,
    Transactions,
    Projects,
    Properties,
    Entities,
    Receipts,
    Assets,
    Contacts,
    Vendors,
    Contracts,
    ContractMilestones,
}

impl Resource {
    pub const ALL: [Self; 15] = [
        Self::Users,
        Self::Companies,
        Self::Banks,
        Self::CostCentres,
        Self::TransactionTypes,
        Self::Transactions,
        Self::Projects,
        Self::Properties,
        Self::Entities,
        Self::Receipts,
        Self::Assets,
        Self::Contacts,
        Self::Vendors,
        Self::Contracts,
        Self::ContractMilestones,
    ];

    /// Name used on the command line and in the collection path
    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Companies => "companies",
            Self::Banks => "banks",
            Self::CostCentres => "cost-centres",
            Self::TransactionTypes => "transaction-types",
            Self::Transactions => "transactions",
            Self::Projects => "projects",
            Self::Properties => "properties",
            Self::Entities => "entities",
            Self::Receipts => "receipts",
            Self::Assets => "assets",
            Self::Contacts => "contacts",
            Self::Vendors => "vendors",
            Self::Contracts => "contracts",
            Self::ContractMilestones => "contract-milestones",
        }
    }

    /// Collection path relative to the API base URL
    pub fn collection_path(self) -> String {
        format!("{}/", self.name())
    }

    /// Item path relative to the API base URL
    pub fn item_path(self, id: &str) -> String {
        format!("{}/{}/", self.name(), id.trim_matches('/'))
    }

    /// Roles allowed to work with this collection
    pub const fn allowed_roles(self) -> &'static [Role] {
        use Role::{Accountant, CenterHead, PropertyManager, SuperUser};
        match self {
            Self::Users => &[SuperUser],
            Self::Companies => &[SuperUser, CenterHead],
            Self::Banks => &[SuperUser, CenterHead, Accountant],
            Self::CostCentres | Self::TransactionTypes | Self::Receipts | Self::Vendors => {
                &[SuperUser, Accountant]
            }
            Self::Transactions | Self::Contracts | Self::ContractMilestones => {
                &[SuperUser, Accountant, PropertyManager]
            }
            Self::Projects | Self::Properties | Self::Assets => {
                &[SuperUser, PropertyManager, CenterHead]
            }
            Self::Entities => &[SuperUser, PropertyManager],
            Self::Contacts => &[SuperUser, CenterHead, PropertyManager],
        }
    }

    /// Collections a role may work with
    pub fn accessible_to(role: Role) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(move |resource| resource.allowed_roles().contains(&role))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_matches('/').to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|resource| resource.name() == normalized)
            .ok_or_else(|| CoreError::unknown_resource(s))
    }
}
