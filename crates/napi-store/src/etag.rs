//! Optimistic-concurrency etags.
//!
//! A `"V{n}-T{micros}"` encoding (a monotonic counter plus an
//! observability timestamp), scoped to *any* store record - every
//! bucket record the engine writes carries one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Etag {
    version_nr: u64,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid etag format: {0}")]
pub struct EtagParseError(String);

impl Etag {
    pub fn initial() -> Self {
        Etag {
            version_nr: 1,
            timestamp: Utc::now(),
        }
    }

    pub fn version_nr(&self) -> u64 {
        self.version_nr
    }

    /// The etag a `put` should carry after this one is overwritten. Every
    /// write that succeeds advances the counter, so a stale reader's
    /// `put`/`delete` call with the old etag is guaranteed to conflict.
    pub fn next(&self) -> Self {
        Etag {
            version_nr: self.version_nr.wrapping_add(1).max(1),
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for Etag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}-T{}", self.version_nr, self.timestamp.timestamp_micros())
    }
}

impl FromStr for Etag {
    type Err = EtagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (v_part, t_part) = s
            .split_once('-')
            .ok_or_else(|| EtagParseError(s.to_string()))?;
        let version_nr: u64 = v_part
            .strip_prefix('V')
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| EtagParseError(s.to_string()))?;
        let micros: i64 = t_part
            .strip_prefix('T')
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| EtagParseError(s.to_string()))?;
        let secs = micros.div_euclid(1_000_000);
        let subsec_nanos = (micros.rem_euclid(1_000_000) * 1000) as u32;
        let timestamp = Utc
            .timestamp_opt(secs, subsec_nanos)
            .single()
            .ok_or_else(|| EtagParseError(s.to_string()))?;
        Ok(Etag { version_nr, timestamp })
    }
}

impl serde::Serialize for Etag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Etag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let s = String::deserialize(deserializer)?;
        Etag::from_str(&s).map_err(D::Error::custom)
    }
}
