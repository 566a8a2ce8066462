//! Catalog descriptors and the [`CatalogSource`] contract.
//!
//! A catalog source answers four questions: what does the marketplace publish,
//! what is installed locally, what is the current install state of one app,
//! and what does the marketplace say about one app at a given version.

use crate::types::{AppId, AppStatus};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Author information attached to a marketplace app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<String>,
}

/// An app as published by the remote marketplace.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceApp {
    pub id: AppId,
    pub name: String,
    #[serde(default)]
    pub author: AppAuthor,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Published version.
    pub version: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub purchase_type: String,
    #[serde(default)]
    pub pricing_plans: Vec<serde_json::Value>,
    /// Base64 encoded icon.
    #[serde(default, alias = "iconFileData", skip_serializing_if = "Option::is_none")]
    pub icon_data: Option<String>,
}

/// An entry in the local installed-app registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InstalledApp {
    pub id: AppId,
    pub version: String,
    pub status: AppStatus,
}

/// Authoritative install state of a single app.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppDetail {
    pub status: AppStatus,
    pub version: String,
}

/// Source of marketplace and installation data.
///
/// Every call may fail with a transport error; callers decide whether the
/// failure is fatal.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every app the marketplace publishes.
    async fn fetch_marketplace_catalog(&self) -> Result<Vec<MarketplaceApp>>;

    /// Fetch every locally installed app.
    async fn fetch_installed_apps(&self) -> Result<Vec<InstalledApp>>;

    /// Fetch the current install state of one app.
    async fn fetch_app_detail(&self, id: &AppId) -> Result<AppDetail>;

    /// Fetch the marketplace descriptor of one app for the given version.
    async fn fetch_marketplace_app(&self, id: &AppId, version: &str) -> Result<MarketplaceApp>;
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Arc<T> {
    async fn fetch_marketplace_catalog(&self) -> Result<Vec<MarketplaceApp>> {
        (**self).fetch_marketplace_catalog().await
    }

    async fn fetch_installed_apps(&self) -> Result<Vec<InstalledApp>> {
        (**self).fetch_installed_apps().await
    }

    async fn fetch_app_detail(&self, id: &AppId) -> Result<AppDetail> {
        (**self).fetch_app_detail(id).await
    }

    async fn fetch_marketplace_app(&self, id: &AppId, version: &str) -> Result<MarketplaceApp> {
        (**self).fetch_marketplace_app(id, version).await
    }
}
