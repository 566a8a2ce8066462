//! Error types for the marketview client contracts.

use crate::types::InvalidAppId;
use thiserror::Error;

/// Errors reported by catalog sources and notification sources.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying transport failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The requested app does not exist in the source.
    #[error("App not found: {0}")]
    NotFound(String),

    /// The source answered with data that does not match the request.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// I/O error while reading a local source.
    #[error("Communication error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An app id received from a source failed validation.
    #[error("Invalid app id: {0}")]
    InvalidAppId(#[from] InvalidAppId),

    /// Subscription failed.
    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    /// The notification hub no longer accepts subscribers or publications.
    #[error("Notification hub is closed")]
    HubClosed,

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::SerializationError(e.to_string())
    }
}
