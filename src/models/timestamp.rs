//! ISO-8601 timestamps that keep the caller's exact text.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A parsed RFC 3339 timestamp.
///
/// Serializes back to the original string, so a record read from the store
/// carries the same text the writer sent.
#[derive(Clone)]
pub struct Timestamp {
    raw: String,
    at: DateTime<Utc>,
}

impl Timestamp {
    pub fn parse(raw: &str) -> Result<Self, chrono::ParseError> {
        let at = DateTime::parse_from_rfc3339(raw.trim())?.with_timezone(&Utc);
        Ok(Self {
            raw: raw.to_string(),
            at,
        })
    }

    /// Millisecond precision with a `Z` suffix.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            raw: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            at,
        }
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.raw == other.raw
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .cmp(&other.at)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.raw)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self::from_datetime(at)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw)
            .map_err(|e| D::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
    }
}
