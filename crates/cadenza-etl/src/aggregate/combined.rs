use std::collections::HashMap;

use chrono::NaiveDateTime;

use cadenza_core::{parse_timestamp, FeatureSet, TrackId};

use super::{feature_columns, feature_fields, StreamRow, TrackFeatureRow, TIMESTAMP_FORMAT};
use crate::error::PipelineResult;

/// A listening event joined with its track's features.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRow {
    pub artist: String,
    pub track: String,
    pub id: TrackId,
    pub end_time: NaiveDateTime,
    pub ms_played: u64,
    pub total_listen_ms: u64,
    pub features: FeatureSet,
}

impl CombinedRow {
    pub fn header() -> Vec<String> {
        [
            "artist",
            "track",
            "identifier",
            "end_time",
            "ms_played",
            "total_listen_ms",
        ]
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
            self.end_time.format(TIMESTAMP_FORMAT).to_string(),
            self.ms_played.to_string(),
            self.total_listen_ms.to_string(),
        ]
        .into_iter()
        .chain(feature_fields(&self.features))
        .collect()
    }
}

/// Join stream rows to track-feature rows on identifier.
///
/// This is an inner join: streams of tracks without features are dropped.
/// Artist and track come from the stream side and the row order is the
/// stream order.
///
/// # Errors
/// Fails on the first stream row whose `end_time` does not parse.
pub fn combine(
    streams: &[StreamRow],
    track_features: &[TrackFeatureRow],
) -> PipelineResult<Vec<CombinedRow>> {
    let by_id: HashMap<&TrackId, &TrackFeatureRow> =
        track_features.iter().map(|row| (&row.id, row)).collect();

    let mut rows = Vec::with_capacity(streams.len());
    for stream in streams {
        let Some(track) = by_id.get(&stream.id) else {
            continue;
        };
        rows.push(CombinedRow {
            artist: stream.artist.clone(),
            track: stream.track.clone(),
            id: stream.id.clone(),
            end_time: parse_timestamp(&stream.end_time)?,
            ms_played: stream.ms_played,
            total_listen_ms: track.total_listen_ms,
            features: track.features,
        });
    }

    let dropped = streams.len() - rows.len();
    if dropped > 0 {
        log::debug!("Dropped {} streams of tracks without features", dropped);
    }
    Ok(rows)
}
