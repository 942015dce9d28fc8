use cadenza_core::{FeatureSet, TrackId};

use super::{feature_columns, feature_fields, ListenTotals};
use crate::error::{PipelineError, PipelineResult};
use crate::features::FeatureMap;
use crate::resolve::ResolvedTracks;

/// One resolved track with its audio features and total listening time.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackFeatureRow {
    pub artist: String,
    pub track: String,
    pub id: TrackId,
    pub total_listen_ms: u64,
    pub features: FeatureSet,
}

impl TrackFeatureRow {
    pub fn header() -> Vec<String> {
        ["artist", "track", "identifier", "total_listen_ms"]
            .into_iter()
            .map(String::from)
            .chain(feature_columns())
            .collect()
    }

    pub fn record(&self) -> Vec<String> {
        [
            self.artist.clone(),
            self.track.clone(),
            self.id.to_string(),
            self.total_listen_ms.to_string(),
        ]
        .into_iter()
        .chain(feature_fields(&self.features))
        .collect()
    }
}

/// Build the track-feature table.
///
/// One row per resolved identifier, in canonical order, skipping those the
/// catalog had no features for.
pub fn track_feature_table(
    resolved: &ResolvedTracks,
    features: &FeatureMap,
    totals: &ListenTotals,
) -> PipelineResult<Vec<TrackFeatureRow>> {
    let mut rows = Vec::with_capacity(resolved.len());

    for track in resolved.iter() {
        let Some(Some(feature_set)) = features.get(&track.id) else {
            continue;
        };
        let total_listen_ms = totals.get(&track.id).ok_or_else(|| {
            PipelineError::InvalidData(format!("no listening total for {}", track.id))
        })?;

        rows.push(TrackFeatureRow {
            artist: track.identity.artist.clone(),
            track: track.identity.track.clone(),
            id: track.id.clone(),
            total_listen_ms,
            features: *feature_set,
        });
    }

    Ok(rows)
}
