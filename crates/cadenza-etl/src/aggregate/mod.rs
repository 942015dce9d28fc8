//! Derived tables built from the loaded history and catalog data.
//!
//! Each stage takes its inputs by reference and returns a fresh collection:
//!
//! ```text
//! events ──┬── total_listen_time ──┐
//!          │                      ├── track_feature_table ──┐
//!          └── stream_history_table ────────────────────────┴── combine ──┬── monthly_artist_table
//!                                                                         └── artist_detail_table
//! ```
//!
//! Row order everywhere follows either the canonical [`ResolvedTracks`]
//! order, the input event order, or artist name.
//!
//! [`ResolvedTracks`]: crate::resolve::ResolvedTracks

pub mod artist_detail;
pub mod combined;
pub mod listen_time;
pub mod monthly;
pub mod streams;
pub mod tracks;

use cadenza_core::{AudioFeature, FeatureSet};

pub use artist_detail::{artist_detail_table, ArtistDetailRow};
pub use combined::{combine, CombinedRow};
pub use listen_time::{total_listen_time, ListenTotals};
pub use monthly::{monthly_artist_table, MonthlyArtistRow, MonthlyWindow};
pub use streams::{stream_history_table, StreamRow};
pub use tracks::{track_feature_table, TrackFeatureRow};

/// Layout of timestamps in the combined table.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layout of the `month` column.
pub const MONTH_FORMAT: &str = "%Y-%m-%d";

fn feature_columns() -> impl Iterator<Item = String> {
    AudioFeature::ALL.into_iter().map(|f| f.name().to_string())
}

fn feature_fields(features: &FeatureSet) -> impl Iterator<Item = String> {
    features.values().into_iter().map(|v| v.to_string())
}
