use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::identity::TrackIdentity;

/// Timestamp layouts accepted for `endTime`, most common first.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// A single listening event from the streaming-history export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
    pub artist_name: String,
    pub track_name: String,
    /// When playback ended, verbatim from the export (e.g. `2021-11-05 14:03`).
    pub end_time: String,
    pub ms_played: u64,
}

impl StreamEvent {
    #[must_use]
    pub fn new(
        artist_name: impl Into<String>,
        track_name: impl Into<String>,
        end_time: impl Into<String>,
        ms_played: u64,
    ) -> Self {
        Self {
            artist_name: artist_name.into(),
            track_name: track_name.into(),
            end_time: end_time.into(),
            ms_played,
        }
    }

    /// The (artist, track) identity this event belongs to.
    #[must_use]
    pub fn identity(&self) -> TrackIdentity {
        TrackIdentity::new(&self.artist_name, &self.track_name)
    }
}

/// Parse an export timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM[:SS]`, the `T`-separated ISO forms, RFC 3339
/// with an offset (converted to UTC), and a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();

    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.naive_utc());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| Error::InvalidTimestamp {
            value: value.to_string(),
        })
}
