//! Reconciled app records and the copy-on-write [`Collection`].

use marketview_client::{AppAuthor, AppId, AppStatus, MarketplaceApp};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// One app as shown in the listing: marketplace metadata merged with the
/// local install state.
///
/// The install state is private so that `installed`, `status` and `version`
/// can only change together: an installed record always has a status, and a
/// record that is not installed has no status and shows the marketplace
/// version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
    pub id: AppId,
    pub name: String,
    pub author: AppAuthor,
    pub description: String,
    pub categories: Vec<String>,
    pub price: f64,
    pub purchase_type: String,
    pub pricing_plans: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_data: Option<String>,
    marketplace_version: String,
    version: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<AppStatus>,
}

impl AppRecord {
    /// A record for an app that is not installed.
    #[must_use]
    pub fn from_marketplace(app: MarketplaceApp) -> Self {
        let version = app.version.clone();
        Self::build(app, version, None)
    }

    /// A record for an installed app. `version` is the installed version; the
    /// marketplace version comes from `app`.
    #[must_use]
    pub fn installed(app: MarketplaceApp, status: AppStatus, version: String) -> Self {
        Self::build(app, version, Some(status))
    }

    fn build(app: MarketplaceApp, version: String, status: Option<AppStatus>) -> Self {
        Self {
            id: app.id,
            name: app.name,
            author: app.author,
            description: app.description,
            categories: app.categories,
            price: app.price,
            purchase_type: app.purchase_type,
            pricing_plans: app.pricing_plans,
            icon_data: app.icon_data,
            marketplace_version: app.version,
            version,
            installed: status.is_some(),
            status,
        }
    }

    /// Version relevant to the user: installed version if installed,
    /// marketplace version otherwise.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Version currently published by the marketplace.
    #[must_use]
    pub fn marketplace_version(&self) -> &str {
        &self.marketplace_version
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    #[must_use]
    pub fn status(&self) -> Option<&AppStatus> {
        self.status.as_ref()
    }

    /// Whether the marketplace publishes a different version than the one
    /// installed.
    #[must_use]
    pub fn has_update(&self) -> bool {
        self.installed && self.version != self.marketplace_version
    }

    /// The record with its installation cleared, or `None` if it is not
    /// installed.
    pub(crate) fn uninstalled(&self) -> Option<Self> {
        if !self.installed {
            return None;
        }
        let mut record = self.clone();
        record.installed = false;
        record.status = None;
        record.version = record.marketplace_version.clone();
        Some(record)
    }

    /// The record with a new status, or `None` if it is not installed or the
    /// status is unchanged.
    pub(crate) fn with_status(&self, status: &AppStatus) -> Option<Self> {
        if !self.installed || self.status.as_ref() == Some(status) {
            return None;
        }
        let mut record = self.clone();
        record.status = Some(status.clone());
        Some(record)
    }
}

/// An immutable snapshot of the reconciled apps, ordered and keyed by id.
///
/// Cloning is cheap. Patching produces a new snapshot that shares every
/// untouched record with its predecessor, so a snapshot handed out earlier
/// never changes.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    records: Arc<Vec<Arc<AppRecord>>>,
    index: Arc<HashMap<AppId, usize>>,
    version: u64,
}

impl Collection {
    /// Build the first populated snapshot. Later records with an id already
    /// seen are dropped.
    pub(crate) fn from_records(records: impl IntoIterator<Item = AppRecord>) -> Self {
        let mut index = HashMap::new();
        let mut kept = Vec::new();
        for record in records {
            if index.contains_key(&record.id) {
                tracing::warn!("Dropping duplicate catalog entry for app '{}'", record.id);
                continue;
            }
            index.insert(record.id.clone(), kept.len());
            kept.push(Arc::new(record));
        }

        Self {
            records: Arc::new(kept),
            index: Arc::new(index),
            version: 1,
        }
    }

    /// Change counter: 0 before the first reconciliation, then bumped by one
    /// for every effective change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether a reconciliation has populated this collection.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.version > 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in collection order.
    #[must_use]
    pub fn records(&self) -> &[Arc<AppRecord>] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppRecord> {
        self.records.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn get(&self, id: &AppId) -> Option<&Arc<AppRecord>> {
        self.index.get(id).and_then(|&i| self.records.get(i))
    }

    #[must_use]
    pub fn contains(&self, id: &AppId) -> bool {
        self.index.contains_key(id)
    }

    /// Replace the record with the same id, keeping its position.
    ///
    /// Returns `None` when the id is unknown or the record is unchanged.
    #[must_use]
    pub fn with_record(&self, record: AppRecord) -> Option<Self> {
        let &position = self.index.get(&record.id)?;
        if *self.records[position] == record {
            return None;
        }

        let mut records = Vec::clone(&self.records);
        records[position] = Arc::new(record);
        Some(Self {
            records: Arc::new(records),
            index: Arc::clone(&self.index),
            version: self.version + 1,
        })
    }

    /// This snapshot renumbered to follow `previous`, so versions keep
    /// increasing across a fresh reconciliation.
    pub(crate) fn succeeding(mut self, previous: &Collection) -> Self {
        self.version = previous.version + 1;
        self
    }
}

/// Collections are equal when they hold equal records in the same order.
impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}
