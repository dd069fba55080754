//! Request and response bodies exchanged with the console backend

use serde::{Deserialize, Serialize};

/// Login request body for `users/token/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

/// Credential pair issued at login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer credential
    pub access: String,
    /// Longer-lived credential used only to mint a new access credential
    pub refresh: String,
}

/// Refresh request body for `users/token/refresh/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Refresh response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Summary returned by `dashboard-stats/`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_companies: u64,
    #[serde(default)]
    pub total_banks: u64,
    #[serde(default)]
    pub total_cost_centres: u64,
    #[serde(default)]
    pub total_transaction_types: u64,
    #[serde(default)]
    pub total_transactions: u64,
    #[serde(default)]
    pub total_credit: f64,
    #[serde(default)]
    pub total_debit: f64,
}

impl DashboardStats {
    /// Credit minus debit across all transactions
    pub fn net_balance(&self) -> f64 {
        self.total_credit - self.total_debit
    }
}
