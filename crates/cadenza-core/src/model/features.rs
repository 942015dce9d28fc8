use serde::{Deserialize, Serialize};
use std::fmt;

/// The audio attributes carried through to every derived table, in column
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFeature {
    Danceability,
    Energy,
    Loudness,
    Speechiness,
    Acousticness,
    Instrumentalness,
    Liveness,
    Valence,
    Tempo,
}

impl AudioFeature {
    pub const ALL: [Self; 9] = [
        Self::Danceability,
        Self::Energy,
        Self::Loudness,
        Self::Speechiness,
        Self::Acousticness,
        Self::Instrumentalness,
        Self::Liveness,
        Self::Valence,
        Self::Tempo,
    ];

    /// Column name used in persisted tables.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Danceability => "danceability",
            Self::Energy => "energy",
            Self::Loudness => "loudness",
            Self::Speechiness => "speechiness",
            Self::Acousticness => "acousticness",
            Self::Instrumentalness => "instrumentalness",
            Self::Liveness => "liveness",
            Self::Valence => "valence",
            Self::Tempo => "tempo",
        }
    }
}

impl fmt::Display for AudioFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Audio-feature attributes for one track.
///
/// Deserializes straight from a catalog audio-features object; every field
/// outside the nine core attributes (`id`, `uri`, `track_href`,
/// `analysis_url`, `type`, `key`, `mode`, ...) is dropped on the way in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub danceability: f64,
    pub energy: f64,
    pub loudness: f64,
    pub speechiness: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub valence: f64,
    pub tempo: f64,
}

impl FeatureSet {
    #[must_use]
    pub const fn get(&self, feature: AudioFeature) -> f64 {
        match feature {
            AudioFeature::Danceability => self.danceability,
            AudioFeature::Energy => self.energy,
            AudioFeature::Loudness => self.loudness,
            AudioFeature::Speechiness => self.speechiness,
            AudioFeature::Acousticness => self.acousticness,
            AudioFeature::Instrumentalness => self.instrumentalness,
            AudioFeature::Liveness => self.liveness,
            AudioFeature::Valence => self.valence,
            AudioFeature::Tempo => self.tempo,
        }
    }

    /// Values in [`AudioFeature::ALL`] order.
    #[must_use]
    pub fn values(&self) -> [f64; 9] {
        AudioFeature::ALL.map(|feature| self.get(feature))
    }

    /// Build a set from values in [`AudioFeature::ALL`] order.
    #[must_use]
    pub const fn from_values(values: [f64; 9]) -> Self {
        Self {
            danceability: values[0],
            energy: values[1],
            loudness: values[2],
            speechiness: values[3],
            acousticness: values[4],
            instrumentalness: values[5],
            liveness: values[6],
            valence: values[7],
            tempo: values[8],
        }
    }

    /// Arithmetic mean of each attribute, or `None` for an empty input.
    pub fn mean<'a>(sets: impl IntoIterator<Item = &'a FeatureSet>) -> Option<Self> {
        let mut sums = [0.0_f64; 9];
        let mut count = 0_usize;
        for set in sets {
            for (sum, value) in sums.iter_mut().zip(set.values()) {
                *sum += value;
            }
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(Self::from_values(sums.map(|sum| sum / count as f64)))
    }
}
