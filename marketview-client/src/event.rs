//! Push notification envelope and the app lifecycle events carried in it.

use crate::types::{AppId, AppStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The four app lifecycle notifications a listing subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppEventKind {
    /// `APP_ADDED`: an app was installed.
    #[serde(rename = "app/added")]
    Added,
    /// `APP_UPDATED`: an installed app changed version.
    #[serde(rename = "app/updated")]
    Updated,
    /// `APP_REMOVED`: an app was uninstalled.
    #[serde(rename = "app/removed")]
    Removed,
    /// `APP_STATUS_CHANGE`: an installed app changed runtime status.
    #[serde(rename = "app/statusUpdate")]
    StatusChanged,
}

impl AppEventKind {
    /// Every kind, in registration order.
    pub const ALL: [AppEventKind; 4] = [
        AppEventKind::Added,
        AppEventKind::Updated,
        AppEventKind::Removed,
        AppEventKind::StatusChanged,
    ];

    /// Name used on the wire.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Added => "app/added",
            Self::Updated => "app/updated",
            Self::Removed => "app/removed",
            Self::StatusChanged => "app/statusUpdate",
        }
    }

    /// Constant-style name (`APP_ADDED`, ...).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Added => "APP_ADDED",
            Self::Updated => "APP_UPDATED",
            Self::Removed => "APP_REMOVED",
            Self::StatusChanged => "APP_STATUS_CHANGE",
        }
    }

    /// Looks a kind up by wire name.
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.wire_name() == name)
    }
}

impl fmt::Display for AppEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

impl FromStr for AppEventKind {
    type Err = MalformedEvent;

    /// Accepts either the wire name or the constant-style label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.wire_name() == s || kind.label() == s)
            .ok_or_else(|| MalformedEvent::UnknownKind(s.to_string()))
    }
}

/// Raw notification as delivered by a notification source.
///
/// The payload is left untyped until [`AppEvent::parse`] interprets it, so a
/// bad payload is rejected by the consumer instead of by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushNotification {
    /// Wire name of the event (`app/added`, ...).
    pub event: String,

    /// Event payload.
    #[serde(default)]
    pub payload: Value,
}

impl PushNotification {
    /// Create a notification of a known kind.
    #[must_use]
    pub fn new(kind: AppEventKind, payload: impl Into<Value>) -> Self {
        Self {
            event: kind.wire_name().to_string(),
            payload: payload.into(),
        }
    }

    /// The kind of this notification, if the event name is known.
    #[must_use]
    pub fn kind(&self) -> Option<AppEventKind> {
        AppEventKind::from_wire(&self.event)
    }

    /// Deserialize a notification from one line of JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not a JSON notification object.
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Error returned when a notification cannot be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedEvent {
    #[error("unknown event kind '{0}'")]
    UnknownKind(String),

    #[error("event '{event}' carries no app id")]
    MissingAppId { event: String },

    #[error("event '{event}' carries an invalid app id: {reason}")]
    InvalidAppId { event: String, reason: String },

    #[error("event '{event}' carries no status")]
    MissingStatus { event: String },
}

/// A parsed app lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Added { app_id: AppId },
    Updated { app_id: AppId },
    Removed { app_id: AppId },
    StatusChanged { app_id: AppId, status: AppStatus },
}

impl AppEvent {
    /// Interpret a raw notification.
    ///
    /// Added, updated and removed notifications carry the app id either as a
    /// bare string or as `{"appId": ...}`. Status changes carry
    /// `{"appId": ..., "status": ...}`.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedEvent`] when the kind is unknown or the payload does
    /// not have the expected shape.
    pub fn parse(notification: &PushNotification) -> Result<Self, MalformedEvent> {
        let event = notification.event.as_str();
        let kind = notification
            .kind()
            .ok_or_else(|| MalformedEvent::UnknownKind(event.to_string()))?;
        let app_id = payload_app_id(event, &notification.payload)?;

        Ok(match kind {
            AppEventKind::Added => Self::Added { app_id },
            AppEventKind::Updated => Self::Updated { app_id },
            AppEventKind::Removed => Self::Removed { app_id },
            AppEventKind::StatusChanged => {
                let status = notification
                    .payload
                    .get("status")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| MalformedEvent::MissingStatus {
                        event: event.to_string(),
                    })?;
                Self::StatusChanged {
                    app_id,
                    status: AppStatus::new(status),
                }
            }
        })
    }

    /// The kind of this event.
    #[must_use]
    pub fn kind(&self) -> AppEventKind {
        match self {
            Self::Added { .. } => AppEventKind::Added,
            Self::Updated { .. } => AppEventKind::Updated,
            Self::Removed { .. } => AppEventKind::Removed,
            Self::StatusChanged { .. } => AppEventKind::StatusChanged,
        }
    }

    /// The app this event concerns.
    #[must_use]
    pub fn app_id(&self) -> &AppId {
        match self {
            Self::Added { app_id }
            | Self::Updated { app_id }
            | Self::Removed { app_id }
            | Self::StatusChanged { app_id, .. } => app_id,
        }
    }

    /// Build the notification that parses back into this event.
    #[must_use]
    pub fn to_notification(&self) -> PushNotification {
        match self {
            Self::StatusChanged { app_id, status } => PushNotification::new(
                self.kind(),
                serde_json::json!({ "appId": app_id.as_str(), "status": status.as_str() }),
            ),
            _ => PushNotification::new(self.kind(), self.app_id().as_str()),
        }
    }
}

fn payload_app_id(event: &str, payload: &Value) -> Result<AppId, MalformedEvent> {
    let raw = match payload {
        Value::String(id) => id.as_str(),
        Value::Object(fields) => fields.get("appId").and_then(Value::as_str).ok_or_else(|| {
            MalformedEvent::MissingAppId {
                event: event.to_string(),
            }
        })?,
        _ => {
            return Err(MalformedEvent::MissingAppId {
                event: event.to_string(),
            });
        }
    };

    AppId::new(raw).map_err(|e| MalformedEvent::InvalidAppId {
        event: event.to_string(),
        reason: e.to_string(),
    })
}
