use anyhow::{Context, Result};
use chrono::NaiveDate;
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::aggregate::MonthlyWindow;
use crate::catalog::spotify::SPOTIFY_API_BASE;
use crate::pipeline::PipelineSettings;

/// Configuration for cadenza.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (CADENZA_* prefix)
/// 3. Config file (~/.config/cadenza/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the streaming-history JSON files.
    ///
    /// Can be set via:
    /// - CLI: --history-dir /path
    /// - ENV: CADENZA_HISTORY_DIR
    /// - Config: history_dir = "/path"
    #[serde(default = "default_history_dir")]
    pub history_dir: PathBuf,

    /// Directory the derived CSV tables are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Spotify Web API access token (bearer).
    ///
    /// Can be set via:
    /// - CLI: --token ...
    /// - ENV: CADENZA_SPOTIFY_ACCESS_TOKEN
    /// - Config: spotify_access_token = "..."
    pub spotify_access_token: Option<String>,

    #[serde(default = "default_api_base")]
    pub spotify_api_base: String,

    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Retries for transient catalog failures (429, 5xx, timeouts).
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// First month of the monthly-artist table.
    #[serde(default = "default_anchor_month")]
    pub anchor_month: NaiveDate,

    #[serde(default = "default_months")]
    pub months: u32,

    /// Artists with fewer listen events than this are left out of the
    /// monthly-artist table.
    #[serde(default = "default_discovery_threshold")]
    pub discovery_threshold: usize,

    /// Number of top-track columns in the artist-detail table.
    #[serde(default = "default_top_tracks")]
    pub top_tracks: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_dir: default_history_dir(),
            output_dir: default_output_dir(),
            spotify_access_token: None,
            spotify_api_base: default_api_base(),
            requests_per_second: default_requests_per_second(),
            max_retries: default_max_retries(),
            anchor_month: default_anchor_month(),
            months: default_months(),
            discovery_threshold: default_discovery_threshold(),
            top_tracks: default_top_tracks(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/cadenza/config.toml
    /// Reads environment variables with CADENZA_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("cadenza");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Aggregation settings derived from this configuration.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            window: MonthlyWindow {
                anchor: self.anchor_month,
                months: self.months,
                discovery_threshold: self.discovery_threshold,
            },
            top_tracks: self.top_tracks,
        }
    }
}

fn default_history_dir() -> PathBuf {
    PathBuf::from("data").join("history")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data").join("dataframes")
}

fn default_api_base() -> String {
    SPOTIFY_API_BASE.to_string()
}

const fn default_requests_per_second() -> u32 {
    10
}

const fn default_max_retries() -> usize {
    3
}

fn default_anchor_month() -> NaiveDate {
    MonthlyWindow::default().anchor
}

const fn default_months() -> u32 {
    13
}

const fn default_discovery_threshold() -> usize {
    100
}

const fn default_top_tracks() -> usize {
    5
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/cadenza/config.toml
/// - macOS: ~/Library/Application Support/cadenza/config.toml
/// - Windows: %APPDATA%\cadenza\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadenza")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Cadenza Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (CADENZA_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Spotify Web API access token used for track search and audio features.
# Obtain one with the client-credentials flow for your Spotify app.
#
# Can also be set via:
# - CLI: cadenza run --token ...
# - Environment: CADENZA_SPOTIFY_ACCESS_TOKEN=your-token-here
spotify_access_token = "your-spotify-access-token-here"

# Where the streaming-history export lives (StreamingHistory*.json)
#history_dir = "data/history"

# Where the derived CSV tables are written
#output_dir = "data/dataframes"

# Catalog client tuning
#requests_per_second = 10
#max_retries = 3

# Monthly artist table: first month and number of months
#anchor_month = "2021-11-01"
#months = 13

# Artists with fewer plays than this are treated as discoveries and left out
# of the monthly table
#discovery_threshold = 100

# Number of top tracks listed per artist
#top_tracks = 5
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
