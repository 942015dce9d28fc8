use serde::{Deserialize, Serialize};
use std::fmt;

const TRACK_URI_PREFIX: &str = "spotify:track:";

/// Stable catalog identifier for a track (a Spotify track URI).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The bare base-62 id, with any `spotify:track:` prefix removed.
    ///
    /// The feature endpoint takes bare ids while search hands back URIs.
    #[must_use]
    pub fn bare(&self) -> &str {
        self.0.strip_prefix(TRACK_URI_PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrackId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_display() {
        let id = TrackId::new("spotify:track:abc123");
        assert_eq!(id.to_string(), "spotify:track:abc123");
    }

    #[test]
    fn test_bare_strips_uri_prefix() {
        let id = TrackId::new("spotify:track:4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(id.bare(), "4uLU6hMCjMI75M1A2tKUQC");
    }

    #[test]
    fn test_bare_leaves_plain_ids_alone() {
        let id = TrackId::from("4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(id.bare(), "4uLU6hMCjMI75M1A2tKUQC");
    }

    #[test]
    fn test_track_id_serializes_as_plain_string() {
        let id = TrackId::from("spotify:track:x");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""spotify:track:x""#);
    }
}
