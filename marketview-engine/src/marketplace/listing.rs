//! The live marketplace listing: reconcile once, then follow push
//! notifications.
//!
//! ```text
//!   CatalogSource ──load──▶ Reconciler ──┐
//!                                        ▼
//!   NotificationSource ──▶ run loop ──▶ watch::Sender<Collection> ──▶ LiveQuery
//!                              │
//!                              └──refetch──▶ LiveUpdateApplier
//! ```
//!
//! Events are handled one at a time in arrival order. Every effective change
//! publishes a new [`Collection`] snapshot with a bumped version; observers
//! holding an older snapshot keep seeing it unchanged.

use super::apply::LiveUpdateApplier;
use super::error::{ListingError, Result};
use super::query::{LiveQuery, QueryPage, QueryParams, query};
use super::reconcile::Reconciler;
use super::record::Collection;
use crate::config::SyncConfig;
use marketview_client::{
    AppEvent, AppEventKind, CatalogSource, IntoEventKinds, NotificationSource, PushNotification,
    Subscription,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Counters reported when a [`MarketplaceListing::run`] loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Events that changed the collection.
    pub applied: usize,
    /// Well-formed events that changed nothing.
    pub ignored: usize,
    /// Notifications that could not be parsed.
    pub malformed: usize,
    /// Events whose refetch failed.
    pub failed: usize,
}

/// Owner of the reconciled collection.
pub struct MarketplaceListing {
    reconciler: Reconciler,
    applier: LiveUpdateApplier,
    state: watch::Sender<Collection>,
}

impl MarketplaceListing {
    /// Create an unmounted listing; its collection is empty until
    /// [`MarketplaceListing::mount`] succeeds.
    pub fn new(source: Arc<dyn CatalogSource>, sync: &SyncConfig) -> Self {
        let (state, _) = watch::channel(Collection::default());
        Self {
            reconciler: Reconciler::new(Arc::clone(&source), sync.fetch_timeout()),
            applier: LiveUpdateApplier::new(source, sync.refetch_timeout()),
            state,
        }
    }

    /// Load the collection and subscribe to app lifecycle events.
    ///
    /// The subscription is only made once the collection is loaded. Pass it
    /// to [`MarketplaceListing::run`], or drop it to unsubscribe.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Fetch`] if loading fails, in which case no
    /// subscription is made and the collection stays as it was, or
    /// [`ListingError::Subscribe`] if the source refuses the subscription.
    pub async fn mount(&self, notifications: &dyn NotificationSource) -> Result<Subscription> {
        self.refresh().await?;
        let subscription = notifications
            .subscribe(AppEventKind::ALL.into_kinds())
            .await
            .map_err(|source| ListingError::Subscribe { source })?;
        debug!("Listing subscribed to {:?}", subscription.kinds());
        Ok(subscription)
    }

    /// Reconcile again from scratch, replacing the collection if it differs.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Fetch`] if loading fails; the current
    /// collection is kept.
    pub async fn refresh(&self) -> Result<()> {
        let loaded = self.reconciler.load().await?;
        self.state.send_if_modified(|current| {
            if current.is_loaded() && *current == loaded {
                return false;
            }
            *current = loaded.succeeding(current);
            true
        });
        Ok(())
    }

    /// Apply one notification.
    ///
    /// Returns whether the collection changed.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::NotMounted`] before the collection is loaded,
    /// [`ListingError::MalformedEvent`] for notifications that cannot be
    /// parsed and [`ListingError::Refetch`] when refreshing an app fails. None
    /// of them changes the collection.
    pub async fn handle(&self, notification: &PushNotification) -> Result<bool> {
        let snapshot = self.snapshot();
        if !snapshot.is_loaded() {
            return Err(ListingError::NotMounted);
        }
        let event = AppEvent::parse(notification)?;
        let Some(record) = self.applier.resolve(&snapshot, &event).await? else {
            return Ok(false);
        };

        let changed = self.state.send_if_modified(|current| match current.with_record(record) {
            Some(next) => {
                *current = next;
                true
            }
            None => false,
        });
        if changed {
            debug!("Applied {} for app '{}'", event.kind(), event.app_id());
        }
        Ok(changed)
    }

    /// Process notifications until the subscription ends or `shutdown`
    /// becomes `true`, then unsubscribe.
    ///
    /// Failures are logged and counted; none of them stops the loop. An event
    /// already being handled when shutdown is signalled finishes first.
    pub async fn run(
        &self,
        mut subscription: Subscription,
        mut shutdown: watch::Receiver<bool>,
    ) -> SyncStats {
        let mut stats = SyncStats::default();

        while !*shutdown.borrow_and_update() {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!("Shutdown signal dropped");
                        break;
                    }
                }
                next = subscription.next() => {
                    let Some(notification) = next else {
                        debug!("Notification stream ended");
                        break;
                    };
                    match self.handle(&notification).await {
                        Ok(true) => stats.applied += 1,
                        Ok(false) => stats.ignored += 1,
                        Err(e @ ListingError::MalformedEvent(_)) => {
                            warn!("Skipping notification '{}': {e}", notification.event);
                            stats.malformed += 1;
                        }
                        Err(e) => {
                            warn!("{e}");
                            stats.failed += 1;
                        }
                    }
                }
            }
        }

        subscription.unsubscribe();
        info!(
            "Listing sync stopped: {} applied, {} ignored, {} malformed, {} failed",
            stats.applied, stats.ignored, stats.malformed, stats.failed
        );
        stats
    }

    /// The current collection.
    #[must_use]
    pub fn snapshot(&self) -> Collection {
        self.state.borrow().clone()
    }

    /// A receiver that sees every published collection.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Collection> {
        self.state.subscribe()
    }

    /// Query the current collection.
    #[must_use]
    pub fn query(&self, params: &QueryParams) -> QueryPage {
        query(&self.state.borrow(), params)
    }

    /// A query that follows the collection.
    #[must_use]
    pub fn live_query(&self, params: QueryParams) -> LiveQuery {
        LiveQuery::new(self.watch(), params)
    }
}
