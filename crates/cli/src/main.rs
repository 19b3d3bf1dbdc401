//! wmcache entry point.
//!
//! Logging goes to stderr as JSON so command output on stdout stays
//! machine-readable.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use wmcache_client::Webmentions;
use wmcache_core::AppConfig;
use wmcache_core::config::CONFIG_FILE_ENV;

mod commands;

#[derive(Parser)]
#[command(name = "wmcache")]
#[command(about = "Cache webmentions locally and query them per page", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(long, global = true, env = CONFIG_FILE_ENV)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Update the cache from the mention feed
    Sync {
        /// Fetch even if the cache is still fresh
        #[arg(long)]
        force: bool,
    },

    /// Print the grouped mentions of a page as JSON
    Page {
        /// Page URL or path, e.g. /posts/hello/
        url: String,
    },

    /// Print the number of mentions of a page
    Count {
        /// Page URL or path
        url: String,
    },

    /// Delete the cache file
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load_from(cli.config.as_deref())?;
    let webmentions = Webmentions::new(&config)?;

    tracing::debug!(domain = %config.domain, cache = %webmentions.store().path().display(), "Loaded configuration");

    match cli.command {
        Commands::Sync { force } => print_json(&commands::sync_impl(&webmentions, force).await)?,
        Commands::Page { url } => print_json(&commands::page_impl(&webmentions, &url).await)?,
        Commands::Count { url } => print_json(&commands::count_impl(&webmentions, &url).await)?,
        Commands::Clear => print_json(&commands::clear_impl(&webmentions).await?)?,
    }

    Ok(())
}

fn print_json<T: Serialize>(output: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}
