//! Marketview Engine - reconciled, live marketplace listing.
//!
//! The engine merges a marketplace catalog with the locally installed apps,
//! keeps the result current from push notifications and answers filtered,
//! sorted, paginated queries over it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    MarketplaceListing                            │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌────────────────────┐  │
//! │  │ Reconciler  │  │ LiveUpdateApplier│  │ query / LiveQuery  │  │
//! │  └─────────────┘  └──────────────────┘  └────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//!         │                 │                        ▲
//!         ▼                 ▼                        │
//!   ┌─────────────┐  ┌────────────────────┐   watch::Receiver
//!   │CatalogSource│  │ NotificationSource │   <Collection>
//!   └─────────────┘  └────────────────────┘
//! ```

pub mod config;
pub mod marketplace;

pub use config::MarketviewConfig;
pub use marketplace::{
    AppRecord, Collection, ListingError, MarketplaceListing, QueryPage, QueryParams,
};
