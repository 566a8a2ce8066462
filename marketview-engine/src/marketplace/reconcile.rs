//! Merging the marketplace catalog with the installed-app registry.

use super::error::{ListingError, Result};
use super::record::{AppRecord, Collection};
use marketview_client::{AppId, CatalogSource, ClientError, InstalledApp, MarketplaceApp};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Merge a catalog with the installed registry (pure function).
///
/// Every catalog app becomes one record; apps found in the registry are
/// marked installed with the registry's status and version. Installed apps
/// the catalog does not publish are not shown. For repeated ids the first
/// entry of each source wins. The result is ordered by case-insensitive
/// name, ties keeping catalog order.
#[must_use]
pub fn reconcile(catalog: Vec<MarketplaceApp>, installed: Vec<InstalledApp>) -> Collection {
    let mut registry: HashMap<AppId, InstalledApp> = HashMap::with_capacity(installed.len());
    for app in installed {
        registry.entry(app.id.clone()).or_insert(app);
    }

    let mut seen: HashSet<AppId> = HashSet::with_capacity(catalog.len());
    let mut records: Vec<AppRecord> = catalog
        .into_iter()
        .filter(|app| {
            let first = seen.insert(app.id.clone());
            if !first {
                warn!("Dropping duplicate catalog entry for app '{}'", app.id);
            }
            first
        })
        .map(|app| match registry.get(&app.id) {
            Some(local) => AppRecord::installed(app, local.status.clone(), local.version.clone()),
            None => AppRecord::from_marketplace(app),
        })
        .collect();
    records.sort_by_cached_key(|record| record.name.to_lowercase());

    Collection::from_records(records)
}

/// Await a source call, converting expiry into [`ClientError::Timeout`].
pub(crate) async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = marketview_client::Result<T>>,
) -> marketview_client::Result<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| ClientError::Timeout)?
}

/// Builds the initial collection from a [`CatalogSource`].
#[derive(Clone)]
pub struct Reconciler {
    source: Arc<dyn CatalogSource>,
    timeout: Duration,
}

impl Reconciler {
    /// Create a reconciler whose fetches give up after `timeout`.
    pub fn new(source: Arc<dyn CatalogSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Fetch both sources concurrently and merge them.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Fetch`] if either fetch fails or times out. No
    /// partial merge is attempted.
    pub async fn load(&self) -> Result<Collection> {
        let (catalog, installed) = tokio::try_join!(
            with_timeout(self.timeout, self.source.fetch_marketplace_catalog()),
            with_timeout(self.timeout, self.source.fetch_installed_apps()),
        )
        .map_err(|source| ListingError::Fetch { source })?;

        let (published, local) = (catalog.len(), installed.len());
        let collection = reconcile(catalog, installed);
        let merged = collection.iter().filter(|r| r.is_installed()).count();
        info!(
            "Reconciled {published} marketplace apps with {local} installed apps ({merged} installed in listing)"
        );

        Ok(collection)
    }
}
