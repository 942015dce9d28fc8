use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use cadenza_etl::{Config, Pipeline, SpotifyClient};

/// Command-line values that take precedence over the loaded configuration.
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub history_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub token: Option<String>,
}

impl RunOverrides {
    fn apply(self, mut config: Config) -> Config {
        if let Some(dir) = self.history_dir {
            config.history_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(token) = self.token {
            config.spotify_access_token = Some(token);
        }
        config
    }
}

pub async fn run_pipeline(overrides: RunOverrides) -> Result<()> {
    let config = overrides.apply(Config::load()?);
    log::info!(
        "Building datasets from {} into {}",
        config.history_dir.display(),
        config.output_dir.display()
    );

    let client = SpotifyClient::from_config(&config).context(
        "Spotify client not available (set --token, CADENZA_SPOTIFY_ACCESS_TOKEN or spotify_access_token)",
    )?;
    let pipeline = Pipeline::new(config, Arc::new(client));

    let summary = pipeline.run().await.context("Pipeline run failed")?;

    println!("\n✓ Datasets written to {}", pipeline.config().output_dir.display());
    println!("  Events loaded:        {}", summary.events);
    println!("  Tracks resolved:      {}", summary.resolved);
    println!("  Tracks unresolved:    {}", summary.unresolved);
    println!("  Tracks with features: {}", summary.featured);
    println!("  Stream rows:          {}", summary.stream_rows);
    println!("  Combined rows:        {}", summary.combined_rows);
    println!("  Monthly rows:         {}", summary.monthly_rows);
    println!("  Artist rows:          {}", summary.artist_rows);

    if summary.unresolved > 0 {
        println!("\nSee unresolved_tracks.csv for tracks left out of every table");
    }

    Ok(())
}
