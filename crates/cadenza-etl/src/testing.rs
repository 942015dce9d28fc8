//! In-memory catalog for driving the pipeline without a network.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use cadenza_core::{FeatureSet, TrackId, TrackIdentity};

use crate::catalog::{CatalogService, TrackQuery};
use crate::error::{CatalogError, CatalogResult};

/// A [`CatalogService`] answering from fixed tables.
///
/// Searches are keyed by the punctuation-stripped query, exactly what a
/// real catalog would receive. Every call is recorded so tests can assert
/// on query text and batch sizes.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    matches: HashMap<String, TrackId>,
    search_errors: HashMap<String, CatalogError>,
    features: HashMap<TrackId, FeatureSet>,
    failing_ids: HashMap<TrackId, CatalogError>,
    truncated_ids: HashSet<TrackId>,
    queries: Mutex<Vec<String>>,
    batches: Mutex<Vec<usize>>,
}

fn key(artist: &str, track: &str) -> String {
    TrackQuery::from_identity(&TrackIdentity::new(artist, track)).to_string()
}

impl FakeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer searches for `artist`/`track` with `id`.
    #[must_use]
    pub fn with_match(mut self, artist: &str, track: &str, id: &str) -> Self {
        self.matches.insert(key(artist, track), TrackId::new(id));
        self
    }

    /// Fail searches for `artist`/`track` with `error`.
    #[must_use]
    pub fn with_search_error(mut self, artist: &str, track: &str, error: CatalogError) -> Self {
        self.search_errors.insert(key(artist, track), error);
        self
    }

    #[must_use]
    pub fn with_features(mut self, id: &str, features: FeatureSet) -> Self {
        self.features.insert(TrackId::new(id), features);
        self
    }

    /// Fail any feature batch containing `id`.
    #[must_use]
    pub fn with_failing_batch(mut self, id: &str, error: CatalogError) -> Self {
        self.failing_ids.insert(TrackId::new(id), error);
        self
    }

    /// Cut the feature response short at `id`, leaving it and every later
    /// entry in the batch out.
    #[must_use]
    pub fn with_truncation_at(mut self, id: &str) -> Self {
        self.truncated_ids.insert(TrackId::new(id));
        self
    }

    /// Rendered search queries, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }

    /// Size of each feature batch, in call order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().map(|b| b.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn search_track(&self, query: &TrackQuery) -> CatalogResult<Option<TrackId>> {
        let rendered = query.to_string();
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(rendered.clone());
        }

        if let Some(error) = self.search_errors.get(&rendered) {
            return Err(error.clone());
        }
        Ok(self.matches.get(&rendered).cloned())
    }

    async fn audio_features(&self, ids: &[TrackId]) -> CatalogResult<Vec<Option<FeatureSet>>> {
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(ids.len());
        }

        if let Some(error) = ids.iter().find_map(|id| self.failing_ids.get(id)) {
            return Err(error.clone());
        }

        Ok(ids
            .iter()
            .take_while(|id| !self.truncated_ids.contains(*id))
            .map(|id| self.features.get(id).copied())
            .collect())
    }
}
