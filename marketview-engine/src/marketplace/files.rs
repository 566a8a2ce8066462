//! A [`CatalogSource`] backed by local files.
//!
//! The catalog is a JSON array of marketplace descriptors. The installed
//! registry is TOML:
//!
//! ```toml
//! [[apps]]
//! id = "giphy"
//! version = "1.0.0"
//! status = "auto_enabled"
//! ```
//!
//! Both files are re-read on every call, so edits show up on the next
//! refetch or refresh.

use crate::config::SourcesConfig;
use async_trait::async_trait;
use marketview_client::{
    AppDetail, AppId, CatalogSource, ClientError, InstalledApp, MarketplaceApp, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk layout of the installed-app registry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct InstalledRegistry {
    #[serde(default)]
    pub apps: Vec<InstalledApp>,
}

#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    catalog_path: PathBuf,
    installed_path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(catalog_path: impl Into<PathBuf>, installed_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            installed_path: installed_path.into(),
        }
    }

    pub fn from_config(sources: &SourcesConfig) -> Self {
        Self::new(sources.catalog_path.clone(), sources.installed_path.clone())
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn installed_path(&self) -> &Path {
        &self.installed_path
    }

    async fn load_catalog(&self) -> Result<Vec<MarketplaceApp>> {
        let content = tokio::fs::read_to_string(&self.catalog_path).await?;
        serde_json::from_str(&content).map_err(|e| {
            ClientError::SerializationError(format!("{}: {e}", self.catalog_path.display()))
        })
    }

    /// A missing registry file means nothing is installed.
    async fn load_registry(&self) -> Result<InstalledRegistry> {
        if !tokio::fs::try_exists(&self.installed_path).await? {
            debug!(
                "No installed registry at {}, assuming none installed",
                self.installed_path.display()
            );
            return Ok(InstalledRegistry::default());
        }

        let content = tokio::fs::read_to_string(&self.installed_path).await?;
        toml::from_str(&content).map_err(|e| {
            ClientError::SerializationError(format!("{}: {e}", self.installed_path.display()))
        })
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    async fn fetch_marketplace_catalog(&self) -> Result<Vec<MarketplaceApp>> {
        self.load_catalog().await
    }

    async fn fetch_installed_apps(&self) -> Result<Vec<InstalledApp>> {
        Ok(self.load_registry().await?.apps)
    }

    async fn fetch_app_detail(&self, id: &AppId) -> Result<AppDetail> {
        self.load_registry()
            .await?
            .apps
            .into_iter()
            .find(|app| &app.id == id)
            .map(|app| AppDetail {
                status: app.status,
                version: app.version,
            })
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }

    /// The catalog holds one descriptor per app, so the entry is returned
    /// whatever version was asked for.
    async fn fetch_marketplace_app(&self, id: &AppId, version: &str) -> Result<MarketplaceApp> {
        let app = self
            .load_catalog()
            .await?
            .into_iter()
            .find(|app| &app.id == id)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))?;
        if app.version != version {
            debug!(
                "Catalog has '{id}' at {} rather than requested {version}",
                app.version
            );
        }
        Ok(app)
    }
}
