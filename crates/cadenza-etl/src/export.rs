//! Writing derived tables to CSV.

use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::{ArtistDetailRow, CombinedRow, MonthlyArtistRow, StreamRow, TrackFeatureRow};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::Datasets;

pub const TRACK_FEATURES_FILE: &str = "track_features.csv";
pub const STREAM_HISTORY_FILE: &str = "stream_history.csv";
pub const COMBINED_FILE: &str = "combined_data.csv";
pub const MONTHLY_FILE: &str = "monthly_data.csv";
pub const ARTIST_DETAIL_FILE: &str = "artist_track_features.csv";
pub const UNRESOLVED_FILE: &str = "unresolved_tracks.csv";

/// Write one table: header first, then one record per row.
///
/// The header is written even when there are no rows.
pub fn write_table<I>(path: &Path, header: &[String], records: I) -> PipelineResult<usize>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;

    let mut count = 0;
    for record in records {
        writer.write_record(&record)?;
        count += 1;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))?;

    log::debug!("Wrote {} rows to {}", count, path.display());
    Ok(count)
}

/// Write every table in `datasets` into `dir`, creating it if needed.
///
/// Returns the paths written, in a fixed order.
pub fn write_all(datasets: &Datasets, dir: &Path, top_k: usize) -> PipelineResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;

    let mut written = Vec::with_capacity(6);
    let mut write = |name: &str, header: Vec<String>, records: Vec<Vec<String>>| {
        let path = dir.join(name);
        write_table(&path, &header, records)?;
        written.push(path);
        Ok::<_, PipelineError>(())
    };

    write(
        TRACK_FEATURES_FILE,
        TrackFeatureRow::header(),
        datasets.track_features.iter().map(TrackFeatureRow::record).collect(),
    )?;
    write(
        STREAM_HISTORY_FILE,
        StreamRow::header(),
        datasets.streams.iter().map(StreamRow::record).collect(),
    )?;
    write(
        COMBINED_FILE,
        CombinedRow::header(),
        datasets.combined.iter().map(CombinedRow::record).collect(),
    )?;
    write(
        MONTHLY_FILE,
        MonthlyArtistRow::header(),
        datasets.monthly.iter().map(MonthlyArtistRow::record).collect(),
    )?;
    write(
        ARTIST_DETAIL_FILE,
        ArtistDetailRow::header(top_k),
        datasets.artist_detail.iter().map(ArtistDetailRow::record).collect(),
    )?;
    write(
        UNRESOLVED_FILE,
        ["artist", "track", "reason"].map(String::from).to_vec(),
        datasets
            .unresolved
            .iter()
            .map(|failure| {
                let identity = failure.identity();
                vec![
                    identity.artist.clone(),
                    identity.track.clone(),
                    failure.reason(),
                ]
            })
            .collect(),
    )?;

    log::info!("Wrote {} tables to {}", written.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::LookupFailure;
    use cadenza_core::{TrackId, TrackIdentity};
    use tempfile::TempDir;

    #[test]
    fn test_write_table_quotes_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t.csv");
        let header = vec!["a".to_string(), "b".to_string()];

        let count = write_table(
            &path,
            &header,
            vec![vec!["x, y".to_string(), "z".to_string()]],
        )
        .unwrap();

        assert_eq!(count, 1);
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "a,b\n\"x, y\",z\n");
    }

    #[test]
    fn test_write_all_empty_datasets_writes_headers() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("nested").join("out");

        let written = write_all(&Datasets::default(), &out, 2).unwrap();
        assert_eq!(written.len(), 6);

        let detail = fs::read_to_string(out.join(ARTIST_DETAIL_FILE)).unwrap();
        assert!(detail.starts_with("artist,danceability,"));
        assert!(detail.trim_end().ends_with("top_track_0,top_track_1"));
        assert_eq!(detail.lines().count(), 1);

        let monthly = fs::read_to_string(out.join(MONTHLY_FILE)).unwrap();
        assert_eq!(monthly, "month,artist,total_ms_played\n");
    }

    #[test]
    fn test_write_all_unresolved_diagnostics() {
        let temp_dir = TempDir::new().unwrap();
        let datasets = Datasets {
            unresolved: vec![
                LookupFailure::NoMatch(TrackIdentity::new("Nobody", "Nothing")),
                LookupFailure::Superseded {
                    identity: TrackIdentity::new("A", "Song"),
                    id: TrackId::new("spotify:track:1"),
                },
            ],
            ..Datasets::default()
        };

        write_all(&datasets, temp_dir.path(), 5).unwrap();
        let contents = fs::read_to_string(temp_dir.path().join(UNRESOLVED_FILE)).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "artist,track,reason",
                "Nobody,Nothing,no match",
                "A,Song,superseded on spotify:track:1",
            ]
        );
    }
}
