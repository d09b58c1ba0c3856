//! Configuration management command
//!
//! Provides CLI interface to view and edit the user configuration.

use crate::system_config;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

/// List all configuration values
pub async fn run_list() -> Result<()> {
    let config = system_config::load()?;
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    println!("{}", "Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    println!("{}", "[watch]".yellow());
    println!(
        "  {} = {} {}",
        "debounce_ms".cyan(),
        config.watch.debounce_ms,
        format!("({:.1}s)", config.watch.debounce_ms as f64 / 1000.0).dimmed()
    );
    println!("  {} = {}", "stability_ms".cyan(), config.watch.stability_ms);
    println!("  {} = {}", "poll_interval_ms".cyan(), config.watch.poll_interval_ms);
    println!("  {} = {}", "use_gitignore".cyan(), config.watch.use_gitignore);
    println!(
        "  {} = {}",
        "use_autocommitignore".cyan(),
        config.watch.use_autocommitignore
    );
    println!(
        "  {} = {:?}",
        "additional_patterns".cyan(),
        config.watch.additional_patterns
    );

    println!("\n{}", "[git]".yellow());
    println!("  {} = {}", "remote".cyan(), config.git.remote);
    println!("  {} = {}", "push".cyan(), config.git.push);
    println!("  {} = {:?}", "message_prefix".cyan(), config.git.message_prefix);

    println!("\n{}", "Valid Ranges:".bold());
    println!("  debounce_ms: 100-600,000");
    println!("  stability_ms: 0-60,000");
    println!("  poll_interval_ms: 10-5,000");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(key: &str) -> Result<()> {
    let config = system_config::load()?;
    println!("{}", config.get(key)?);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load()?;
    config.set(key, value)?;

    // Validate before saving
    config.validate().context("Invalid configuration value")?;

    system_config::save(&config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    println!(
        "{}",
        "Note: Restart the daemon for changes to take effect (autocommit stop && autocommit start)"
            .yellow()
    );

    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    if create && !config_path.exists() {
        system_config::init_if_missing()?;
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else {
        println!("{}", config_path.display());
        if !config_path.exists() {
            println!("{}", "File does not exist. Use --create to create it.".yellow());
        }
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    print!("{}", system_config::example_config());
    Ok(())
}
