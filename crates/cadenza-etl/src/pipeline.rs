//! End-to-end orchestration: load, resolve, fetch, aggregate, export.

use std::path::PathBuf;
use std::sync::Arc;

use cadenza_core::{StreamEvent, TrackId};

use crate::aggregate::{
    artist_detail_table, combine, monthly_artist_table, stream_history_table, total_listen_time,
    track_feature_table, ArtistDetailRow, CombinedRow, MonthlyArtistRow, MonthlyWindow, StreamRow,
    TrackFeatureRow,
};
use crate::catalog::CatalogService;
use crate::config::Config;
use crate::error::PipelineResult;
use crate::export;
use crate::features::FeatureFetcher;
use crate::history;
use crate::resolve::{unique_identities, IdentityResolver, LookupFailure};

/// Knobs for the aggregation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub window: MonthlyWindow,
    /// Number of top-track columns in the artist-detail table.
    pub top_tracks: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            window: MonthlyWindow::default(),
            top_tracks: 5,
        }
    }
}

/// Every table produced by one run.
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    pub track_features: Vec<TrackFeatureRow>,
    pub streams: Vec<StreamRow>,
    pub combined: Vec<CombinedRow>,
    pub monthly: Vec<MonthlyArtistRow>,
    pub artist_detail: Vec<ArtistDetailRow>,
    /// Identities left out of every table, one entry each.
    pub unresolved: Vec<LookupFailure>,
    /// Number of resolved identifiers.
    pub resolved: usize,
}

/// Run the resolver, the fetcher and every aggregation stage.
///
/// The only I/O performed is through `catalog`.
pub async fn build_datasets(
    events: &[StreamEvent],
    catalog: Arc<dyn CatalogService>,
    settings: &PipelineSettings,
) -> PipelineResult<Datasets> {
    let identities = unique_identities(events);
    log::info!(
        "Resolving {} unique tracks from {} events",
        identities.len(),
        events.len()
    );

    let resolution = IdentityResolver::new(Arc::clone(&catalog))
        .resolve(&identities)
        .await?;
    let resolved = resolution.resolved;

    let ids: Vec<TrackId> = resolved.ids().cloned().collect();
    let features = FeatureFetcher::new(catalog).fetch(&ids).await?;

    let totals = total_listen_time(events, &resolved)?;
    let track_features = track_feature_table(&resolved, &features, &totals)?;
    let streams = stream_history_table(events, &resolved);
    let combined = combine(&streams, &track_features)?;
    let monthly = monthly_artist_table(&combined, &settings.window);
    let artist_detail = artist_detail_table(&combined, settings.top_tracks);

    Ok(Datasets {
        track_features,
        streams,
        combined,
        monthly,
        artist_detail,
        unresolved: resolution.failures,
        resolved: resolved.len(),
    })
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub events: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub featured: usize,
    pub stream_rows: usize,
    pub combined_rows: usize,
    pub monthly_rows: usize,
    pub artist_rows: usize,
    pub files: Vec<PathBuf>,
}

/// A configured pipeline bound to a catalog.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    catalog: Arc<dyn CatalogService>,
}

impl Pipeline {
    pub fn new(config: Config, catalog: Arc<dyn CatalogService>) -> Self {
        Self { config, catalog }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the history directory, build every table and write them to the
    /// output directory.
    ///
    /// Nothing is written unless every stage before export succeeds.
    pub async fn run(&self) -> PipelineResult<RunSummary> {
        let events = history::concatenate_all(&self.config.history_dir)?;
        let settings = self.config.pipeline_settings();

        let datasets = build_datasets(&events, Arc::clone(&self.catalog), &settings).await?;
        let files = export::write_all(&datasets, &self.config.output_dir, settings.top_tracks)?;

        Ok(RunSummary {
            events: events.len(),
            resolved: datasets.resolved,
            unresolved: datasets.unresolved.len(),
            featured: datasets.track_features.len(),
            stream_rows: datasets.streams.len(),
            combined_rows: datasets.combined.len(),
            monthly_rows: datasets.monthly.len(),
            artist_rows: datasets.artist_detail.len(),
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CatalogError, PipelineError};
    use crate::testing::FakeCatalog;
    use cadenza_core::FeatureSet;
    use std::fs;
    use tempfile::TempDir;

    fn settings(discovery_threshold: usize) -> PipelineSettings {
        PipelineSettings {
            window: MonthlyWindow {
                discovery_threshold,
                ..MonthlyWindow::default()
            },
            top_tracks: 2,
        }
    }

    fn catalog() -> FakeCatalog {
        FakeCatalog::new()
            .with_match("A", "X", "spotify:track:x")
            .with_match("B", "Y", "spotify:track:y")
            .with_features(
                "spotify:track:x",
                FeatureSet {
                    danceability: 0.8,
                    ..FeatureSet::default()
                },
            )
    }

    #[tokio::test]
    async fn test_build_datasets() {
        let events = vec![
            StreamEvent::new("A", "X", "2021-11-05 10:00", 30_000),
            StreamEvent::new("B", "Y", "2021-11-05 11:00", 7_000),
            StreamEvent::new("Nobody", "Nothing", "2021-11-05 12:00", 1),
            StreamEvent::new("A", "X", "2021-12-05 10:00", 50_000),
        ];

        let datasets = build_datasets(&events, Arc::new(catalog()), &settings(1))
            .await
            .unwrap();

        assert_eq!(datasets.resolved, 2);
        assert_eq!(datasets.unresolved.len(), 1);
        // B/Y resolved but has no features.
        assert_eq!(datasets.track_features.len(), 1);
        assert_eq!(datasets.track_features[0].total_listen_ms, 80_000);
        assert_eq!(datasets.streams.len(), 3);
        assert_eq!(datasets.combined.len(), 2);
        assert_eq!(datasets.artist_detail.len(), 1);
        assert_eq!(datasets.artist_detail[0].top_tracks, vec!["X", ""]);

        let monthly: Vec<u64> = datasets.monthly.iter().map(|r| r.total_ms_played).collect();
        assert_eq!(monthly.len(), 13);
        assert_eq!(&monthly[..3], &[30_000, 80_000, 80_000]);
    }

    #[tokio::test]
    async fn test_build_datasets_empty_history() {
        let datasets = build_datasets(&[], Arc::new(FakeCatalog::new()), &settings(1))
            .await
            .unwrap();
        assert_eq!(datasets.resolved, 0);
        assert!(datasets.combined.is_empty());
        assert!(datasets.monthly.is_empty());
    }

    #[tokio::test]
    async fn test_run_writes_every_table() {
        let temp_dir = TempDir::new().unwrap();
        let history_dir = temp_dir.path().join("history");
        fs::create_dir(&history_dir).unwrap();
        fs::write(
            history_dir.join("StreamingHistory0.json"),
            r#"[{"endTime": "2021-11-05 10:00", "artistName": "A", "trackName": "X", "msPlayed": 30000}]"#,
        )
        .unwrap();

        let config = Config {
            history_dir,
            output_dir: temp_dir.path().join("out"),
            ..Config::default()
        };
        let pipeline = Pipeline::new(config, Arc::new(catalog()));

        let summary = pipeline.run().await.unwrap();
        assert_eq!(summary.events, 1);
        assert_eq!(summary.resolved, 1);
        assert_eq!(summary.files.len(), 6);
        assert!(summary.files.iter().all(|path| path.exists()));
    }

    #[tokio::test]
    async fn test_fatal_catalog_error_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let history_dir = temp_dir.path().join("history");
        fs::create_dir(&history_dir).unwrap();
        fs::write(
            history_dir.join("a.json"),
            r#"[{"endTime": "2021-11-05 10:00", "artistName": "A", "trackName": "X", "msPlayed": 1}]"#,
        )
        .unwrap();
        let output_dir = temp_dir.path().join("out");

        let catalog = FakeCatalog::new().with_search_error(
            "A",
            "X",
            CatalogError::Unauthorized {
                message: "expired".to_string(),
            },
        );
        let config = Config {
            history_dir,
            output_dir: output_dir.clone(),
            ..Config::default()
        };

        let err = Pipeline::new(config, Arc::new(catalog)).run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Catalog(CatalogError::Unauthorized { .. })));
        assert!(!output_dir.exists());
    }

    /// Write a one-listen history under `temp_dir` and point a config at it.
    fn single_listen_config(temp_dir: &TempDir) -> Config {
        let history_dir = temp_dir.path().join("history");
        fs::create_dir(&history_dir).unwrap();
        fs::write(
            history_dir.join("a.json"),
            r#"[{"endTime": "2021-11-05 10:00", "artistName": "A", "trackName": "X", "msPlayed": 1}]"#,
        )
        .unwrap();
        Config {
            history_dir,
            output_dir: temp_dir.path().join("out"),
            ..Config::default()
        }
    }

    fn unavailable() -> CatalogError {
        CatalogError::Http {
            status: Some(503),
            message: "Service Unavailable".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unavailable_search_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = single_listen_config(&temp_dir);
        let output_dir = config.output_dir.clone();
        let catalog = FakeCatalog::new().with_search_error("A", "X", unavailable());

        let err = Pipeline::new(config, Arc::new(catalog)).run().await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Catalog(CatalogError::Http { status: Some(503), .. })
        ));
        assert!(!output_dir.exists());
    }

    #[tokio::test]
    async fn test_timed_out_feature_batch_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = single_listen_config(&temp_dir);
        let output_dir = config.output_dir.clone();
        let catalog = catalog().with_failing_batch(
            "spotify:track:x",
            CatalogError::Connection {
                message: "operation timed out".to_string(),
            },
        );

        let err = Pipeline::new(config, Arc::new(catalog)).run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Catalog(CatalogError::Connection { .. })));
        assert!(!output_dir.exists());
    }

    #[tokio::test]
    async fn test_rejected_feature_batch_still_writes() {
        let temp_dir = TempDir::new().unwrap();
        let config = single_listen_config(&temp_dir);
        let catalog = catalog().with_failing_batch(
            "spotify:track:x",
            CatalogError::Http {
                status: Some(400),
                message: "invalid id".to_string(),
            },
        );

        let summary = Pipeline::new(config, Arc::new(catalog)).run().await.unwrap();
        assert_eq!(summary.resolved, 1);
        assert_eq!(summary.featured, 0);
        assert!(summary.files.iter().all(|path| path.exists()));
    }

    #[tokio::test]
    async fn test_colliding_identities_keep_only_the_winner() {
        // Both spellings render the same search query and land on one id.
        let events = vec![
            StreamEvent::new("A", "Song", "2021-11-05 10:00", 1_000),
            StreamEvent::new("A", "Song!", "2021-11-05 11:00", 2_000),
            StreamEvent::new("A", "Song", "2021-11-06 10:00", 4_000),
            StreamEvent::new("A", "Song!", "2021-11-06 11:00", 8_000),
        ];
        let catalog = FakeCatalog::new().with_match("A", "Song", "id1").with_features(
            "id1",
            FeatureSet {
                energy: 0.4,
                ..FeatureSet::default()
            },
        );

        let datasets = build_datasets(&events, Arc::new(catalog), &settings(1))
            .await
            .unwrap();

        assert_eq!(datasets.resolved, 1);
        assert!(datasets.streams.iter().all(|row| row.track == "Song!"));
        assert_eq!(datasets.streams.len(), 2);
        assert_eq!(datasets.track_features.len(), 1);
        assert_eq!(datasets.track_features[0].track, "Song!");
        assert_eq!(datasets.track_features[0].total_listen_ms, 10_000);
        assert_eq!(datasets.combined.len(), 2);

        assert_eq!(datasets.unresolved.len(), 1);
        match &datasets.unresolved[0] {
            LookupFailure::Superseded { identity, id } => {
                assert_eq!(identity.track, "Song");
                assert_eq!(id.as_str(), "id1");
            }
            other => panic!("expected a superseded identity, got {other:?}"),
        }
    }
}
