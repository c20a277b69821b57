use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Asia::Tokyo;
use serde::{Deserialize, Serialize};

const JST_FORMAT: &str = "%Y-%m-%d %H:%M:%S JST";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid message timestamp: {0}")]
pub struct TimestampError(String);

/// Remote message timestamp such as `1712345678.000200`.
///
/// Unique per channel, so it doubles as the dedup key. The integer part is
/// seconds since the epoch and the fraction is microseconds; ordering is
/// numeric when both sides parse and falls back to the raw string otherwise.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageTs(String);

impl MessageTs {
    pub fn from_raw(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Encode a point in time the way the remote API expects an `oldest` bound.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(format!("{}.{:06}", at.timestamp(), at.timestamp_subsec_micros()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Seconds and microseconds encoded in the timestamp.
    pub fn parts(&self) -> Result<(i64, u32), TimestampError> {
        let (secs, frac) = match self.0.split_once('.') {
            Some((secs, frac)) => (secs, frac),
            None => (self.0.as_str(), ""),
        };
        if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimestampError(self.0.clone()));
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimestampError(self.0.clone()));
        }
        let secs: i64 = secs.parse().map_err(|_| TimestampError(self.0.clone()))?;

        // Only microsecond precision is meaningful; pad or cut to six digits.
        let mut micros = 0u32;
        for b in frac.bytes().chain(std::iter::repeat(b'0')).take(6) {
            micros = micros * 10 + u32::from(b - b'0');
        }
        Ok((secs, micros))
    }

    pub fn to_datetime(&self) -> Result<DateTime<Utc>, TimestampError> {
        let (secs, micros) = self.parts()?;
        Utc.timestamp_opt(secs, micros * 1_000)
            .single()
            .ok_or_else(|| TimestampError(self.0.clone()))
    }

    /// Render as `YYYY-MM-DD HH:MM:SS JST`.
    pub fn format_jst(&self) -> Result<String, TimestampError> {
        Ok(format_jst(self.to_datetime()?))
    }

    /// Token used in archive links: the timestamp with its dot removed.
    pub fn link_token(&self) -> String {
        self.0.replacen('.', "", 1)
    }

    fn sort_key(&self) -> (u8, i64, u32) {
        match self.parts() {
            Ok((secs, micros)) => (0, secs, micros),
            Err(_) => (1, 0, 0),
        }
    }
}

/// Format an instant in Japan Standard Time.
pub fn format_jst(at: DateTime<Utc>) -> String {
    at.with_timezone(&Tokyo).format(JST_FORMAT).to_string()
}

impl Ord for MessageTs {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for MessageTs {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MessageTs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
