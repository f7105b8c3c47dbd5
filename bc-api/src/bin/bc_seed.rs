//! bc-seed - load form JSON files into the SQLite store
//!
//! Each file is saved independently. Per-file failures are listed in the
//! summary; only fatal errors (bad config, unreadable folder, database
//! failure) end the run with a non-zero exit code.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bc_api::config::{init_tracing, CliOverrides, ServiceConfig};
use bc_common::config::{resolve_config_path, RootFolderInitializer, TomlConfig};
use bc_common::seed::seed_store;
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bc-seed")]
#[command(about = "Seed the Blind Check database from form JSON files")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root folder holding the database and forms folder
    #[arg(short, long, env = "BLINDCHECK_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, env = "BLINDCHECK_DATABASE")]
    database: Option<PathBuf>,

    /// Folder of form JSON files (defaults to the configured forms folder)
    #[arg(short, long)]
    folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let toml_config = TomlConfig::load_or_default(&config_path)
        .context("Failed to load configuration")?;
    init_tracing(&toml_config.logging).context("Failed to initialize logging")?;

    let overrides = CliOverrides {
        root_folder: args.root_folder,
        database_path: args.database,
        forms_folder: args.folder,
        ..CliOverrides::default()
    };
    let config =
        ServiceConfig::resolve(toml_config, overrides).context("Invalid configuration")?;

    RootFolderInitializer::new(config.root_folder.clone()).ensure_directory_exists()?;
    let store = config
        .open_sqlite_store()
        .await
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;

    info!(
        "Seeding {} from {}",
        config.database_path.display(),
        config.forms_folder.display()
    );
    let report = seed_store(&store, &config.forms_folder)
        .await
        .with_context(|| format!("Failed to read {}", config.forms_folder.display()))?;

    println!("Files found:  {}", report.found);
    println!("Forms saved:  {}", report.saved);
    println!("Errors:       {}", report.errors.len());
    for error in &report.errors {
        println!("  - {}", error);
    }

    Ok(())
}
