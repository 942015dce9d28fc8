//! Batched audio-feature lookup.

use std::collections::HashMap;
use std::sync::Arc;

use cadenza_core::{FeatureSet, TrackId};

use crate::catalog::{CatalogService, FEATURE_BATCH_SIZE};
use crate::error::PipelineResult;

/// Feature lookup results keyed by identifier.
///
/// A missing key means the identifier was never requested; `None` means it
/// was requested and the catalog had nothing usable for it.
pub type FeatureMap = HashMap<TrackId, Option<FeatureSet>>;

/// Fetches audio features for resolved identifiers in catalog-sized batches.
#[derive(Debug, Clone)]
pub struct FeatureFetcher {
    catalog: Arc<dyn CatalogService>,
}

impl FeatureFetcher {
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self { catalog }
    }

    /// Fetch features for every id, one catalog call per batch of
    /// [`FEATURE_BATCH_SIZE`], in order.
    ///
    /// Every requested id ends up as a key. Fatal catalog errors abort;
    /// any other batch failure marks that batch's ids as `None`.
    pub async fn fetch(&self, ids: &[TrackId]) -> PipelineResult<FeatureMap> {
        let mut features = FeatureMap::with_capacity(ids.len());

        for (index, batch) in ids.chunks(FEATURE_BATCH_SIZE).enumerate() {
            match self.catalog.audio_features(batch).await {
                Ok(results) => {
                    if results.len() < batch.len() {
                        log::warn!(
                            "Feature batch {} returned {} of {} entries",
                            index,
                            results.len(),
                            batch.len()
                        );
                    }
                    let mut results = results.into_iter();
                    for id in batch {
                        let entry = results.next().flatten();
                        if entry.is_none() {
                            log::warn!("No audio features for {}", id);
                        }
                        features.insert(id.clone(), entry);
                    }
                }
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    log::warn!(
                        "Feature batch {} ({} ids) failed: {}",
                        index,
                        batch.len(),
                        e
                    );
                    for id in batch {
                        features.insert(id.clone(), None);
                    }
                }
            }
        }

        let present = features.values().filter(|f| f.is_some()).count();
        log::info!("Fetched audio features for {} of {} tracks", present, ids.len());
        Ok(features)
    }
}
