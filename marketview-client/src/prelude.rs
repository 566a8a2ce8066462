//! Convenient re-exports for common usage.
//!
//! ```rust,ignore
//! use marketview_client::prelude::*;
//!
//! let hub = NotificationHub::default();
//! let mut subscription = hub.subscribe(AppEventKind::ALL.into_kinds()).await?;
//! ```

pub use crate::catalog::{AppDetail, CatalogSource, InstalledApp, MarketplaceApp};
pub use crate::error::ClientError;
pub use crate::event::{AppEvent, AppEventKind, MalformedEvent, PushNotification};
pub use crate::hub::{NotificationHub, NotificationSource, Subscription};
pub use crate::stream::EventStream;
pub use crate::subscribe::IntoEventKinds;
pub use crate::types::{AppId, AppStatus};
pub use crate::Result;

// Re-export StreamExt for convenient stream operations
pub use futures::StreamExt;
