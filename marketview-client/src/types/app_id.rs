//! App identifier newtype for opaque marketplace ids.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An opaque app identifier.
///
/// Marketplace ids are usually UUIDs, but the listing never interprets them;
/// they are only compared for equality and used as map keys. Any non-empty
/// string is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppId(String);

/// Error returned when creating an invalid app id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidAppId {
    /// App id cannot be empty.
    Empty,
}

impl fmt::Display for InvalidAppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "app id cannot be empty"),
        }
    }
}

impl std::error::Error for InvalidAppId {}

impl AppId {
    /// Creates a new app id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidAppId> {
        let value = value.into();
        if value.is_empty() {
            return Err(InvalidAppId::Empty);
        }
        Ok(Self(value))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AppId {
    type Err = InvalidAppId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for AppId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for AppId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AppId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_app_ids() {
        assert!(AppId::new("c33fa1a6-68a7-491e-bf49-9d7b99671c48").is_ok());
        assert!(AppId::new("giphy").is_ok());
        assert!(AppId::new("com.example.poll_app").is_ok());
        assert!(AppId::new("A1").is_ok());
    }

    #[test]
    fn empty_is_invalid() {
        assert!(matches!(AppId::new(""), Err(InvalidAppId::Empty)));
    }

    #[test]
    fn ids_are_opaque() {
        for raw in ["acme:app/1", "two words", "ünïcode", "a/b?c=d#e"] {
            let id = AppId::new(raw);
            assert_eq!(id.as_ref().map(AppId::as_str), Ok(raw));
        }
        assert!(AppId::new("a".repeat(4096)).is_ok());
    }

    #[test]
    fn deserialize_rejects_only_empty() -> Result<(), Box<dyn std::error::Error>> {
        let result: Result<AppId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
        let id: AppId = serde_json::from_str("\"acme:app/1\"")?;
        assert_eq!(id.as_str(), "acme:app/1");
        Ok(())
    }

    #[test]
    fn serializes_as_plain_string() -> Result<(), Box<dyn std::error::Error>> {
        let id = AppId::new("giphy")?;
        assert_eq!(serde_json::to_string(&id)?, "\"giphy\"");
        Ok(())
    }
}
