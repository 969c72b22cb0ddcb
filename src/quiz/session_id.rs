//! Session handle management
//!
//! The quiz service hands out an opaque identifier when a session is
//! created. The client never interprets it; it only echoes it back on
//! every later call for the same attempt.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Opaque identifier for one quiz attempt at the quiz service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

/// Error returned when a session handle is blank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("session id must not be empty")]
pub struct EmptySessionId;

impl SessionId {
    /// Returns the handle as sent by the service
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = EmptySessionId;

    /// Wraps a handle string
    ///
    /// # Errors
    ///
    /// Returns `EmptySessionId` if the string is empty or only whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            Err(EmptySessionId)
        } else {
            Ok(Self(s.to_owned()))
        }
    }
}

impl Serialize for SessionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> Result<SessionId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SessionId::from_str(&s).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_from_str() {
        let id = SessionId::from_str("3f2c9a").unwrap();
        assert_eq!(id.as_str(), "3f2c9a");
        assert_eq!(id.to_string(), "3f2c9a");
    }

    #[test]
    fn test_session_id_rejects_blank() {
        assert_eq!(SessionId::from_str(""), Err(EmptySessionId));
        assert_eq!(SessionId::from_str("   "), Err(EmptySessionId));
    }

    #[test]
    fn test_session_id_serialization() {
        let id = SessionId::from_str("abc-123").unwrap();
        let serialized = serde_json::to_string(&id).unwrap();
        assert_eq!(serialized, "\"abc-123\"");

        let deserialized: SessionId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn test_session_id_deserialization_errors() {
        assert!(serde_json::from_str::<SessionId>("123").is_err());
        assert!(serde_json::from_str::<SessionId>("\"\"").is_err());
    }
}
