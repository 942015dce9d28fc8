//! Core domain model for cadenza.
//!
//! This crate defines the listening-history records read from a streaming
//! export, the (artist, track) identities they are grouped by, the external
//! catalog identifiers those identities resolve to, and the audio-feature
//! sets attached to each identifier.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{parse_timestamp, AudioFeature, FeatureSet, StreamEvent, TrackId, TrackIdentity};
