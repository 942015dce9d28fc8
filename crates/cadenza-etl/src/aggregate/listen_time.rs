use std::collections::HashMap;

use cadenza_core::{StreamEvent, TrackId};

use crate::error::{PipelineError, PipelineResult};
use crate::resolve::ResolvedTracks;

/// Total `ms_played` per identifier, in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenTotals {
    entries: Vec<(TrackId, u64)>,
    index: HashMap<TrackId, usize>,
}

impl ListenTotals {
    #[must_use]
    pub fn get(&self, id: &TrackId) -> Option<u64> {
        self.index.get(id).map(|&pos| self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TrackId, u64)> {
        self.entries.iter().map(|(id, total)| (id, *total))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sum listening time per resolved identifier.
///
/// Events whose identity did not resolve contribute nothing. Every resolved
/// identifier came from some event, so one without a total means the
/// inputs are inconsistent and is reported as [`PipelineError::InvalidData`].
pub fn total_listen_time(
    events: &[StreamEvent],
    resolved: &ResolvedTracks,
) -> PipelineResult<ListenTotals> {
    let mut sums: HashMap<&TrackId, u64> = HashMap::new();
    for event in events {
        if let Some(id) = resolved.id_for_event(event) {
            *sums.entry(id).or_default() += event.ms_played;
        }
    }

    let mut totals = ListenTotals::default();
    for track in resolved.iter() {
        let total = sums.get(&track.id).copied().ok_or_else(|| {
            PipelineError::InvalidData(format!(
                "resolved track {} ({}) has no listening events",
                track.identity, track.id
            ))
        })?;
        totals.index.insert(track.id.clone(), totals.entries.len());
        totals.entries.push((track.id.clone(), total));
    }

    Ok(totals)
}
