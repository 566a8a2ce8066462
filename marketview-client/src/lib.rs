//! Marketview Client Contracts
//!
//! This crate defines the collaborators a marketplace listing depends on,
//! without committing to any transport:
//!
//! - [`CatalogSource`] - Fetches the marketplace catalog, the installed-app
//!   registry, and per-app detail
//! - [`NotificationSource`] - Delivers app lifecycle push notifications
//!   through a [`Subscription`]
//! - [`NotificationHub`] - In-process notification source, for embedding and tests
//!
//! # Example: Subscribing to app events
//!
//! ```rust,ignore
//! use marketview_client::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hub = NotificationHub::default();
//!     let mut subscription = hub.subscribe(AppEventKind::ALL.into_kinds()).await?;
//!
//!     while let Some(notification) = subscription.next().await {
//!         match AppEvent::parse(&notification) {
//!             Ok(event) => println!("{} {}", event.kind(), event.app_id()),
//!             Err(e) => eprintln!("skipping: {e}"),
//!         }
//!     }
//!     subscription.unsubscribe();
//!     Ok(())
//! }
//! ```

pub mod catalog;
mod error;
pub mod event;
pub mod hub;
pub mod prelude;
mod stream;
mod subscribe;
pub mod types;

pub use catalog::{AppAuthor, AppDetail, CatalogSource, InstalledApp, MarketplaceApp};
pub use error::ClientError;
pub use event::{AppEvent, AppEventKind, MalformedEvent, PushNotification};
pub use hub::{NotificationHub, NotificationSource, Subscription};
pub use stream::EventStream;
pub use subscribe::IntoEventKinds;
pub use types::{AppId, AppStatus};

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
