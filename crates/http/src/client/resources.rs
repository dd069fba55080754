//! Console collection endpoints
//!
//! Every call here goes through [`ApiClient::send`], so it is authenticated
//! and renewed like any other request.

use super::{ApiClient, ClientError};
use crate::types::DashboardStats;
use igen_core::Resource;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Dashboard statistics endpoint, relative to the base URL
pub const DASHBOARD_PATH: &str = "dashboard-stats/";

impl ApiClient {
    /// List every record of a collection
    pub async fn list<T: DeserializeOwned>(&self, resource: Resource) -> Result<Vec<T>, ClientError> {
        let request = self.request(Method::GET, &resource.collection_path());
        self.execute(request).await
    }

    /// Fetch one record
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        resource: Resource,
        id: &str,
    ) -> Result<T, ClientError> {
        let request = self.request(Method::GET, &resource.item_path(id));
        self.execute(request).await
    }

    /// Create a record
    pub async fn create<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        resource: Resource,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = self
            .request(Method::POST, &resource.collection_path())
            .json(body);
        self.execute(request).await
    }

    /// Replace a record
    pub async fn update<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        resource: Resource,
        id: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = self
            .request(Method::PUT, &resource.item_path(id))
            .json(body);
        self.execute(request).await
    }

    /// Update some fields of a record
    pub async fn patch<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        resource: Resource,
        id: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = self
            .request(Method::PATCH, &resource.item_path(id))
            .json(body);
        self.execute(request).await
    }

    /// Delete a record
    pub async fn delete(&self, resource: Resource, id: &str) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, &resource.item_path(id));
        self.execute_empty(request).await
    }

    /// Summary counts and totals for the dashboard
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        let request = self.request(Method::GET, DASHBOARD_PATH);
        self.execute(request).await
    }

    /// GET any path relative to the base URL as raw JSON
    pub async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        let request = self.request(Method::GET, path);
        self.execute(request).await
    }
}
