//! The reconciled marketplace listing.
//!
//! Two independently fetched sources, the marketplace catalog and the local
//! installed-app registry, are merged into one [`Collection`] that push
//! notifications then keep current:
//!
//! ```text
//! ┌───────────────┐   ┌────────────────┐
//! │    Catalog    │   │   Installed    │
//! └───────┬───────┘   └───────┬────────┘
//!         └────────┬──────────┘
//!                  ▼
//!            ┌───────────┐      app/added, app/updated,
//!            │ Reconciler│      app/removed, app/statusUpdate
//!            └─────┬─────┘                 │
//!                  ▼                       ▼
//!            ┌───────────┐   patch  ┌──────────────────┐
//!            │ Collection│◀─────────│ LiveUpdateApplier│
//!            └─────┬─────┘          └──────────────────┘
//!                  ▼
//!            ┌───────────┐
//!            │   query   │  filter, sort, paginate
//!            └───────────┘
//! ```
//!
//! # Example Usage
//!
//! ```bash
//! # First page, sorted by name
//! marketview list
//!
//! # Filter and page through the listing
//! marketview list --filter chat --offset 25
//!
//! # Follow notifications read from a file
//! marketview watch --events notifications.jsonl
//! ```

pub mod apply;
pub mod cli;
pub mod error;
pub mod files;
pub mod listing;
pub mod query;
pub mod reconcile;
pub mod record;

#[cfg(test)]
pub(crate) mod testing;

pub use apply::LiveUpdateApplier;
pub use cli::{MarketplaceCommand, QueryArgs, execute};
pub use error::{ListingError, Result};
pub use files::{FileCatalogSource, InstalledRegistry};
pub use listing::{MarketplaceListing, SyncStats};
pub use query::{
    DEFAULT_PAGE_SIZE, LiveQuery, QueryPage, QueryParams, SortDirection, SortKey, query,
};
pub use reconcile::{Reconciler, reconcile};
pub use record::{AppRecord, Collection};
