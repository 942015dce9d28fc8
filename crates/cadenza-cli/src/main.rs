use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "cadenza", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Build the listening datasets from a streaming-history export
    ///
    /// Loads every history file in the history directory, resolves each
    /// (artist, track) pair against the Spotify catalog, fetches audio
    /// features in batches of 100, and writes:
    ///
    /// - track_features.csv: one row per resolved track with features
    /// - stream_history.csv: every listen of a resolved track
    /// - combined_data.csv: listens joined with their track's features
    /// - monthly_data.csv: cumulative listening time per artist per month
    /// - artist_track_features.csv: mean features and top tracks per artist
    /// - unresolved_tracks.csv: every track that could not be matched
    ///
    /// Nothing is written if the catalog rejects the token or cannot be
    /// reached.
    Run {
        /// Directory holding StreamingHistory*.json files
        #[arg(long)]
        history_dir: Option<PathBuf>,

        /// Directory to write the CSV tables to
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Spotify access token (overrides config and CADENZA_SPOTIFY_ACCESS_TOKEN)
        #[arg(long)]
        token: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults if it does not exist
    Init,
}

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter(cli.verbose))),
        )
        .init();

    match cli.command {
        Commands::Run {
            history_dir,
            output_dir,
            token,
        } => {
            commands::run_pipeline(commands::RunOverrides {
                history_dir,
                output_dir,
                token,
            })
            .await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config()?,
            ConfigAction::Path => commands::config::show_path()?,
            ConfigAction::Example => commands::config::show_example()?,
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
