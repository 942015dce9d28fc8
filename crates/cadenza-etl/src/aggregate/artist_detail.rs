use std::collections::BTreeMap;

use cadenza_core::FeatureSet;

use super::{feature_columns, feature_fields, CombinedRow};

/// Per-artist mean features and most-played tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistDetailRow {
    pub artist: String,
    pub mean_features: FeatureSet,
    /// Exactly `k` entries, padded with empty strings.
    pub top_tracks: Vec<String>,
}

impl ArtistDetailRow {
    pub fn header(k: usize) -> Vec<String> {
        std::iter::once("artist".to_string())
            .chain(feature_columns())
            .chain((0..k).map(|i| format!("top_track_{i}")))
            .collect()
    }

    pub fn record(&self) -> Vec<String> {
        std::iter::once(self.artist.clone())
            .chain(feature_fields(&self.mean_features))
            .chain(self.top_tracks.iter().cloned())
            .collect()
    }
}

/// Build the artist-detail table, artists sorted by name.
///
/// Top tracks are ranked by summed `ms_played`, highest first, with ties
/// going to the alphabetically earlier track name.
pub fn artist_detail_table(combined: &[CombinedRow], k: usize) -> Vec<ArtistDetailRow> {
    let mut by_artist: BTreeMap<&str, Vec<&CombinedRow>> = BTreeMap::new();
    for row in combined {
        by_artist.entry(row.artist.as_str()).or_default().push(row);
    }

    by_artist
        .into_iter()
        .filter_map(|(artist, rows)| {
            let mean_features = FeatureSet::mean(rows.iter().map(|row| &row.features))?;

            let mut per_track: BTreeMap<&str, u64> = BTreeMap::new();
            for row in &rows {
                *per_track.entry(row.track.as_str()).or_default() += row.ms_played;
            }
            let mut ranked: Vec<(&str, u64)> = per_track.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1));

            let mut top_tracks: Vec<String> = ranked
                .into_iter()
                .take(k)
                .map(|(track, _)| track.to_string())
                .collect();
            top_tracks.resize(k, String::new());

            Some(ArtistDetailRow {
                artist: artist.to_string(),
                mean_features,
                top_tracks,
            })
        })
        .collect()
}
