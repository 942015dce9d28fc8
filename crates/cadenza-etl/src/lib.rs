//! ETL pipeline stages for cadenza.
//!
//! Loads a streaming-history export, resolves each (artist, track) pair to
//! a catalog identifier, fetches audio features in batches, and derives the
//! track-feature, stream-history, combined, monthly-artist and
//! artist-detail tables written out as CSV.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod history;
pub mod pipeline;
pub mod resolve;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use catalog::{CatalogService, SpotifyClient, TrackQuery};
pub use config::Config;
pub use error::{CatalogError, CatalogResult, PipelineError, PipelineResult};
pub use features::{FeatureFetcher, FeatureMap};
pub use pipeline::{build_datasets, Datasets, Pipeline, PipelineSettings, RunSummary};
pub use resolve::{IdentityResolver, LookupFailure, Resolution, ResolvedTracks};
