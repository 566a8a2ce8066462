//! Turning lifecycle events into collection patches.

use super::error::{ListingError, Result};
use super::reconcile::with_timeout;
use super::record::{AppRecord, Collection};
use marketview_client::{AppEvent, AppId, CatalogSource, ClientError};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Computes the replacement record for one event.
///
/// Added and updated apps are refetched (installed detail first, then the
/// marketplace entry for the installed version); removals and status changes
/// are derived from the current record without any I/O.
#[derive(Clone)]
pub struct LiveUpdateApplier {
    source: Arc<dyn CatalogSource>,
    refetch_timeout: Duration,
}

impl LiveUpdateApplier {
    pub fn new(source: Arc<dyn CatalogSource>, refetch_timeout: Duration) -> Self {
        Self {
            source,
            refetch_timeout,
        }
    }

    /// The record that should replace the current one, or `None` if the event
    /// changes nothing.
    ///
    /// Events for apps the collection does not contain are ignored, as are
    /// removals of apps that are not installed and status changes for them.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Refetch`] if refreshing an added or updated app
    /// fails. The collection is not touched in that case.
    pub async fn resolve(
        &self,
        collection: &Collection,
        event: &AppEvent,
    ) -> Result<Option<AppRecord>> {
        let app_id = event.app_id();
        let Some(current) = collection.get(app_id) else {
            debug!("Ignoring {} for unknown app '{app_id}'", event.kind());
            return Ok(None);
        };

        match event {
            AppEvent::Added { .. } | AppEvent::Updated { .. } => {
                let record = self.refetch(app_id).await.map_err(|source| {
                    ListingError::Refetch {
                        app_id: app_id.clone(),
                        source,
                    }
                })?;
                Ok(Some(record))
            }
            AppEvent::Removed { .. } => {
                let record = current.uninstalled();
                if record.is_none() {
                    debug!("App '{app_id}' already not installed");
                }
                Ok(record)
            }
            AppEvent::StatusChanged { status, .. } => {
                if !current.is_installed() {
                    debug!("Ignoring status '{status}' for app '{app_id}' that is not installed");
                }
                Ok(current.with_status(status))
            }
        }
    }

    /// Resolve `event` against `collection` and produce the patched snapshot.
    ///
    /// Returns `None` when nothing changed; the input snapshot is never
    /// modified.
    ///
    /// # Errors
    ///
    /// See [`LiveUpdateApplier::resolve`].
    pub async fn apply(
        &self,
        collection: &Collection,
        event: &AppEvent,
    ) -> Result<Option<Collection>> {
        Ok(self
            .resolve(collection, event)
            .await?
            .and_then(|record| collection.with_record(record)))
    }

    async fn refetch(&self, app_id: &AppId) -> marketview_client::Result<AppRecord> {
        let detail = with_timeout(self.refetch_timeout, self.source.fetch_app_detail(app_id)).await?;
        let app = with_timeout(
            self.refetch_timeout,
            self.source.fetch_marketplace_app(app_id, &detail.version),
        )
        .await?;

        if &app.id != app_id {
            return Err(ClientError::UnexpectedResponse(format!(
                "requested app '{app_id}', got '{}'",
                app.id
            )));
        }
        debug!("Refetched app '{app_id}' at version {}", detail.version);
        Ok(AppRecord::installed(app, detail.status, detail.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::reconcile::reconcile;
    use crate::marketplace::testing::{MockCatalog, app, id, installed};
    use marketview_client::AppStatus;

    fn fixture() -> (Arc<MockCatalog>, Collection) {
        let catalog = vec![
            app("giphy", "GIPHY", "1.2.0"),
            app("poll", "Poll", "0.3.0"),
            app("remind", "Remind", "2.0.0"),
        ];
        let local = vec![
            installed("giphy", "1.0.0", "auto_enabled"),
            installed("poll", "0.3.0", "manually_enabled"),
        ];
        let collection = reconcile(catalog.clone(), local.clone());
        (Arc::new(MockCatalog::new(catalog, local)), collection)
    }

    fn applier(source: &Arc<MockCatalog>) -> LiveUpdateApplier {
        LiveUpdateApplier::new(source.clone(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_added_app_is_refetched() -> Result<()> {
        let (source, collection) = fixture();
        source.set_detail("remind", "2.0.0", "auto_enabled");

        let event = AppEvent::Added { app_id: id("remind") };
        let Some(after) = applier(&source).apply(&collection, &event).await? else {
            panic!("added app should patch the collection");
        };

        let Some(remind) = after.get(&id("remind")) else {
            panic!("remind missing");
        };
        assert!(remind.is_installed());
        assert_eq!(remind.status(), Some(&AppStatus::new("auto_enabled")));
        assert_eq!(remind.version(), "2.0.0");
        assert_eq!(source.detail_calls(), 1);
        assert_eq!(after.version(), collection.version() + 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_updated_app_takes_refetched_version() -> Result<()> {
        let (source, collection) = fixture();
        source.set_detail("giphy", "1.2.0", "auto_enabled");

        let event = AppEvent::Updated { app_id: id("giphy") };
        let Some(after) = applier(&source).apply(&collection, &event).await? else {
            panic!("update should patch the collection");
        };
        let Some(giphy) = after.get(&id("giphy")) else {
            panic!("giphy missing");
        };
        assert_eq!(giphy.version(), "1.2.0");
        assert!(!giphy.has_update());
        Ok(())
    }

    #[tokio::test]
    async fn test_refetch_failure_leaves_record_unchanged() {
        let (_, collection) = fixture();
        let source = Arc::new(MockCatalog {
            fail_detail: true,
            ..MockCatalog::default()
        });

        let event = AppEvent::Updated { app_id: id("giphy") };
        let result = applier(&source).apply(&collection, &event).await;
        assert!(matches!(result, Err(ListingError::Refetch { .. })));
        let Some(giphy) = collection.get(&id("giphy")) else {
            panic!("giphy missing");
        };
        assert_eq!(giphy.version(), "1.0.0");
    }

    #[tokio::test]
    async fn test_removed_app_is_uninstalled_without_io() -> Result<()> {
        let (source, collection) = fixture();
        let event = AppEvent::Removed { app_id: id("giphy") };

        let Some(after) = applier(&source).apply(&collection, &event).await? else {
            panic!("removal should patch the collection");
        };
        let Some(giphy) = after.get(&id("giphy")) else {
            panic!("removed apps stay listed");
        };
        assert!(!giphy.is_installed());
        assert_eq!(giphy.status(), None);
        assert_eq!(giphy.version(), "1.2.0");
        assert_eq!(source.detail_calls(), 0);

        // Removing again changes nothing.
        assert!(applier(&source).apply(&after, &event).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_status_change_touches_only_status() -> Result<()> {
        let (source, collection) = fixture();
        let event = AppEvent::StatusChanged {
            app_id: id("poll"),
            status: AppStatus::new("manually_disabled"),
        };

        let Some(after) = applier(&source).apply(&collection, &event).await? else {
            panic!("status change should patch the collection");
        };
        let (Some(before_poll), Some(after_poll)) =
            (collection.get(&id("poll")), after.get(&id("poll")))
        else {
            panic!("poll missing");
        };
        assert_eq!(after_poll.status(), Some(&AppStatus::new("manually_disabled")));
        assert_eq!(after_poll.version(), before_poll.version());
        assert_eq!(
            after_poll.marketplace_version(),
            before_poll.marketplace_version()
        );
        assert_eq!(after_poll.name, before_poll.name);
        assert_eq!(after_poll.is_installed(), before_poll.is_installed());
        assert_eq!(source.detail_calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_status_change_for_uninstalled_app_is_ignored() -> Result<()> {
        let (source, collection) = fixture();
        let event = AppEvent::StatusChanged {
            app_id: id("remind"),
            status: AppStatus::new("auto_enabled"),
        };
        assert!(applier(&source).apply(&collection, &event).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_app_is_ignored_without_refetch() -> Result<()> {
        let (source, collection) = fixture();
        for event in [
            AppEvent::Added { app_id: id("ghost") },
            AppEvent::Updated { app_id: id("ghost") },
            AppEvent::Removed { app_id: id("ghost") },
            AppEvent::StatusChanged {
                app_id: id("ghost"),
                status: AppStatus::new("auto_enabled"),
            },
        ] {
            assert!(applier(&source).apply(&collection, &event).await?.is_none());
        }
        assert_eq!(source.detail_calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_patch_shares_untouched_records_and_keeps_snapshot() -> Result<()> {
        let (source, collection) = fixture();
        let event = AppEvent::Removed { app_id: id("poll") };
        let Some(after) = applier(&source).apply(&collection, &event).await? else {
            panic!("removal should patch the collection");
        };

        for (before, after) in collection.records().iter().zip(after.records()) {
            if before.id == id("poll") {
                assert!(!Arc::ptr_eq(before, after));
                assert!(before.is_installed());
            } else {
                assert!(Arc::ptr_eq(before, after));
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_mismatched_refetch_is_rejected() {
        struct Swapped(MockCatalog);

        #[async_trait::async_trait]
        impl CatalogSource for Swapped {
            async fn fetch_marketplace_catalog(
                &self,
            ) -> marketview_client::Result<Vec<marketview_client::MarketplaceApp>> {
                self.0.fetch_marketplace_catalog().await
            }
            async fn fetch_installed_apps(
                &self,
            ) -> marketview_client::Result<Vec<marketview_client::InstalledApp>> {
                self.0.fetch_installed_apps().await
            }
            async fn fetch_app_detail(
                &self,
                app_id: &AppId,
            ) -> marketview_client::Result<marketview_client::AppDetail> {
                self.0.fetch_app_detail(app_id).await
            }
            async fn fetch_marketplace_app(
                &self,
                _app_id: &AppId,
                version: &str,
            ) -> marketview_client::Result<marketview_client::MarketplaceApp> {
                Ok(app("poll", "Poll", version))
            }
        }

        let (_, collection) = fixture();
        let source = Swapped(MockCatalog::default());
        source.0.set_detail("giphy", "1.2.0", "auto_enabled");
        let applier = LiveUpdateApplier::new(Arc::new(source), Duration::from_secs(5));

        let event = AppEvent::Updated { app_id: id("giphy") };
        match applier.apply(&collection, &event).await {
            Err(ListingError::Refetch { source, .. }) => {
                assert!(matches!(source, ClientError::UnexpectedResponse(_)));
            }
            other => panic!("expected refetch error, got {other:?}"),
        }
    }
}
