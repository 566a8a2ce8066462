//! Fixtures shared by the marketplace unit tests.

use super::record::AppRecord;
use async_trait::async_trait;
use marketview_client::{
    AppDetail, AppId, AppStatus, CatalogSource, ClientError, InstalledApp, MarketplaceApp, Result,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) fn id(value: &str) -> AppId {
    match AppId::new(value) {
        Ok(id) => id,
        Err(e) => panic!("invalid test id '{value}': {e}"),
    }
}

pub(crate) fn app(app_id: &str, name: &str, version: &str) -> MarketplaceApp {
    MarketplaceApp {
        id: id(app_id),
        name: name.to_string(),
        author: Default::default(),
        description: format!("{name} description"),
        categories: vec!["Testing".to_string()],
        version: version.to_string(),
        price: 0.0,
        purchase_type: "buy".to_string(),
        pricing_plans: Vec::new(),
        icon_data: None,
    }
}

pub(crate) fn installed(app_id: &str, version: &str, status: &str) -> InstalledApp {
    InstalledApp {
        id: id(app_id),
        version: version.to_string(),
        status: AppStatus::new(status),
    }
}

pub(crate) fn installed_record(
    app_id: &str,
    name: &str,
    marketplace_version: &str,
    version: &str,
    status: &str,
) -> AppRecord {
    AppRecord::installed(
        app(app_id, name, marketplace_version),
        AppStatus::new(status),
        version.to_string(),
    )
}

/// In-memory catalog with switchable failures and call counters.
#[derive(Default)]
pub(crate) struct MockCatalog {
    pub catalog: Vec<MarketplaceApp>,
    pub installed: Vec<InstalledApp>,
    pub details: Mutex<HashMap<AppId, AppDetail>>,
    pub fail_catalog: bool,
    pub fail_installed: bool,
    pub fail_detail: bool,
    pub detail_calls: AtomicUsize,
}

impl MockCatalog {
    pub(crate) fn new(catalog: Vec<MarketplaceApp>, installed: Vec<InstalledApp>) -> Self {
        Self {
            catalog,
            installed,
            ..Self::default()
        }
    }

    pub(crate) fn set_detail(&self, app_id: &str, version: &str, status: &str) {
        self.details
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(
                id(app_id),
                AppDetail {
                    status: AppStatus::new(status),
                    version: version.to_string(),
                },
            );
    }

    pub(crate) fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    async fn fetch_marketplace_catalog(&self) -> Result<Vec<MarketplaceApp>> {
        if self.fail_catalog {
            return Err(ClientError::Transport("catalog unavailable".to_string()));
        }
        Ok(self.catalog.clone())
    }

    async fn fetch_installed_apps(&self) -> Result<Vec<InstalledApp>> {
        if self.fail_installed {
            return Err(ClientError::Transport("registry unavailable".to_string()));
        }
        Ok(self.installed.clone())
    }

    async fn fetch_app_detail(&self, app_id: &AppId) -> Result<AppDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_detail {
            return Err(ClientError::Transport("detail unavailable".to_string()));
        }
        self.details
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(app_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(app_id.to_string()))
    }

    async fn fetch_marketplace_app(&self, app_id: &AppId, _version: &str) -> Result<MarketplaceApp> {
        self.catalog
            .iter()
            .find(|candidate| &candidate.id == app_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(app_id.to_string()))
    }
}
