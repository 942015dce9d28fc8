//! The external track catalog: text search and audio-feature lookup.
//!
//! Resolver and fetcher only see the [`CatalogService`] trait, so a run can
//! be driven by the Spotify client in production and by an in-memory double
//! in tests.

pub mod resilience;
pub mod spotify;

use std::fmt;

use async_trait::async_trait;
use cadenza_core::{FeatureSet, TrackId, TrackIdentity};

use crate::error::CatalogResult;

pub use spotify::SpotifyClient;

/// Most identifiers the catalog accepts in one feature lookup.
pub const FEATURE_BATCH_SIZE: usize = 100;

/// Capability offered by the external catalog.
#[async_trait]
pub trait CatalogService: Send + Sync + fmt::Debug {
    /// Return the single best match for `query`, if any.
    async fn search_track(&self, query: &TrackQuery) -> CatalogResult<Option<TrackId>>;

    /// Look up audio features for up to [`FEATURE_BATCH_SIZE`] identifiers.
    ///
    /// The result is parallel to `ids`; `None` marks an identifier the
    /// catalog has no features for.
    async fn audio_features(&self, ids: &[TrackId]) -> CatalogResult<Vec<Option<FeatureSet>>>;
}

/// A structured search query built from a history identity.
///
/// Punctuation is stripped from both fields because the catalog's query
/// syntax treats several ASCII symbols as operators. The stripped text is
/// only ever sent to the catalog, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackQuery {
    pub artist: String,
    pub track: String,
}

impl TrackQuery {
    #[must_use]
    pub fn from_identity(identity: &TrackIdentity) -> Self {
        Self {
            artist: strip_punctuation(&identity.artist),
            track: strip_punctuation(&identity.track),
        }
    }
}

impl fmt::Display for TrackQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "artist:{} track:{}", self.artist, self.track)
    }
}

fn strip_punctuation(text: &str) -> String {
    text.chars().filter(|c| !c.is_ascii_punctuation()).collect()
}
