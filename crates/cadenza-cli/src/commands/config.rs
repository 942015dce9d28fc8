use anyhow::Result;
use cadenza_etl::{config, Config};

/// Show the current effective configuration.
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Current Configuration");
    println!("=====================\n");

    let config_path = config::config_file_path();
    println!("Config file: {}", config_path.display());
    let exists = config_path.exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    println!(
        "  spotify_access_token: {}",
        if config.spotify_access_token.is_some() { "<set>" } else { "<not set>" }
    );
    println!("  spotify_api_base: {}", config.spotify_api_base);
    println!("  history_dir: {}", config.history_dir.display());
    println!("  output_dir: {}", config.output_dir.display());
    println!("  requests_per_second: {}", config.requests_per_second);
    println!("  max_retries: {}", config.max_retries);
    println!("  anchor_month: {}", config.anchor_month);
    println!("  months: {}", config.months);
    println!("  discovery_threshold: {}", config.discovery_threshold);
    println!("  top_tracks: {}", config.top_tracks);

    println!("\nPriority: CLI args > ENV vars (CADENZA_*) > Config file > Defaults");

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure cadenza.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
