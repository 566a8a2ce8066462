//! Error types for listing operations.
//!
//! None of these are fatal to the listing: a failed operation leaves the
//! collection exactly as it was.

use marketview_client::{AppId, ClientError, MalformedEvent};
use thiserror::Error;

/// Errors that can occur while loading or patching the listing.
#[derive(Debug, Error)]
pub enum ListingError {
    /// Loading the catalog or the installed registry failed; nothing was merged.
    #[error("Failed to load marketplace apps: {source}")]
    Fetch { source: ClientError },

    /// Refetching one app after an add/update notification failed; the
    /// record keeps its last known state.
    #[error("Failed to refresh app '{app_id}': {source}")]
    Refetch { app_id: AppId, source: ClientError },

    /// Registering for push notifications failed.
    #[error("Failed to subscribe to app events: {source}")]
    Subscribe { source: ClientError },

    /// An event arrived before the listing was loaded.
    #[error("Listing is not mounted")]
    NotMounted,

    /// A push notification could not be understood.
    #[error("Malformed app event: {0}")]
    MalformedEvent(#[from] MalformedEvent),
}

/// Result type for listing operations.
pub type Result<T> = std::result::Result<T, ListingError>;
