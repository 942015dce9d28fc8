use cadenza_core::{StreamEvent, TrackId};

use crate::resolve::ResolvedTracks;

/// A listening event tagged with its catalog identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRow {
    pub artist: String,
    pub track: String,
    pub id: TrackId,
    pub end_time: String,
    pub ms_played: u64,
}

impl StreamRow {
    pub fn header() -> Vec<String> {
        ["artist", "track", "identifier", "end_time", "ms_played"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn record(&self) -> Vec<String> {
        vec![
            self.artist.clone(),
            self.track.clone(),
            self.id.to_string(),
            self.end_time.clone(),
            self.ms_played.to_string(),
        ]
    }
}

/// One row per event whose identity resolved, in input order.
pub fn stream_history_table(events: &[StreamEvent], resolved: &ResolvedTracks) -> Vec<StreamRow> {
    events
        .iter()
        .filter_map(|event| {
            resolved.id_for_event(event).map(|id| StreamRow {
                artist: event.artist_name.clone(),
                track: event.track_name.clone(),
                id: id.clone(),
                end_time: event.end_time.clone(),
                ms_played: event.ms_played,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::TrackIdentity;

    #[test]
    fn test_drops_unresolved_and_keeps_order() {
        let resolved: ResolvedTracks = [(TrackId::new("id1"), TrackIdentity::new("A", "X"))]
            .into_iter()
            .collect();
        let events = vec![
            StreamEvent::new("A", "X", "2021-11-06 10:00", 2),
            StreamEvent::new("Nobody", "Nothing", "2021-11-06 11:00", 5),
            StreamEvent::new("A", "X", "2021-11-05 10:00", 1),
        ];

        let rows = stream_history_table(&events, &resolved);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].end_time, "2021-11-06 10:00");
        assert_eq!(rows[1].ms_played, 1);
        assert!(rows.iter().all(|r| r.id.as_str() == "id1"));
    }

    #[test]
    fn test_record_keeps_end_time_verbatim() {
        let row = StreamRow {
            artist: "A, the Band".to_string(),
            track: "X".to_string(),
            id: TrackId::new("id1"),
            end_time: "2021-11-06 10:00".to_string(),
            ms_played: 42,
        };
        assert_eq!(
            row.record(),
            vec!["A, the Band", "X", "id1", "2021-11-06 10:00", "42"]
        );
    }
}
