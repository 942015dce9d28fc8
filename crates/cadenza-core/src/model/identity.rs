use serde::{Deserialize, Serialize};
use std::fmt;

/// An (artist, track) pair exactly as it appears in the listening history.
///
/// Comparison is case- and punctuation-sensitive: two spellings of the same
/// song are distinct identities. Ordering is by artist, then track.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackIdentity {
    pub artist: String,
    pub track: String,
}

impl TrackIdentity {
    #[must_use]
    pub fn new(artist: impl Into<String>, track: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            track: track.into(),
        }
    }
}

impl fmt::Display for TrackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display() {
        let identity = TrackIdentity::new("Nina Simone", "Sinnerman");
        assert_eq!(identity.to_string(), "Nina Simone - Sinnerman");
    }

    #[test]
    fn test_identity_is_case_sensitive() {
        let a = TrackIdentity::new("Artist", "Song");
        let b = TrackIdentity::new("artist", "Song");
        assert_ne!(a, b);
    }

    #[test]
    fn test_identity_orders_by_artist_then_track() {
        let mut identities = vec![
            TrackIdentity::new("B", "a"),
            TrackIdentity::new("A", "z"),
            TrackIdentity::new("A", "b"),
        ];
        identities.sort();
        assert_eq!(identities[0], TrackIdentity::new("A", "b"));
        assert_eq!(identities[1], TrackIdentity::new("A", "z"));
        assert_eq!(identities[2], TrackIdentity::new("B", "a"));
    }
}
