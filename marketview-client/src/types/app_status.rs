//! Installation status reported by the local app registry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime status of an installed app (`auto_enabled`, `manually_disabled`,
/// `initialized`, ...).
///
/// The set of statuses is owned by the server, so unknown values are kept
/// verbatim instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppStatus(String);

impl AppStatus {
    /// Wraps a raw status string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the status as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the app is running.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.0 == "enabled" || self.0.ends_with("_enabled")
    }

    /// Whether the app is installed but stopped, by the user or by an error.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.0 == "disabled" || self.0.ends_with("_disabled")
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AppStatus {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
