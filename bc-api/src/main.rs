//! bc-api - Blind Check form service
//!
//! Serves blind check forms over HTTP: lookup, upsert, marker verification
//! and scan matching.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bc_api::config::{init_tracing, CliOverrides, ServiceConfig};
use bc_api::{build_router, AppState};
use bc_common::config::{resolve_config_path, StoreBackend, TomlConfig};
use clap::builder::FalseyValueParser;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments for bc-api
#[derive(Parser, Debug)]
#[command(name = "bc-api")]
#[command(about = "Blind Check form service")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "BLINDCHECK_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "BLINDCHECK_HOST")]
    host: Option<String>,

    /// Root folder holding the database and forms folder
    #[arg(short, long, env = "BLINDCHECK_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, env = "BLINDCHECK_DATABASE")]
    database: Option<PathBuf>,

    /// Document store backend (sqlite or directory)
    #[arg(long, env = "BLINDCHECK_STORE")]
    store: Option<StoreBackend>,

    /// Folder of form JSON files
    #[arg(long, env = "BLINDCHECK_FORMS_FOLDER")]
    forms_folder: Option<PathBuf>,

    /// Load the forms folder into the database at startup
    #[arg(long, env = "BLINDCHECK_SEED", value_parser = FalseyValueParser::new())]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let toml_config = if config_path.exists() {
        Some(TomlConfig::load(&config_path).context("Failed to load configuration")?)
    } else {
        None
    };

    let logging = toml_config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging).context("Failed to initialize logging")?;

    // Build identification first, before any slow startup work
    info!(
        "Starting Blind Check service (bc-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &toml_config {
        Some(_) => info!("Configuration: {}", config_path.display()),
        None => warn!(
            "Config file {} not found, using built-in defaults",
            config_path.display()
        ),
    }

    let overrides = CliOverrides {
        root_folder: args.root_folder,
        database_path: args.database,
        forms_folder: args.forms_folder,
        store: args.store,
        host: args.host,
        port: args.port,
        seed: args.seed,
    };
    let config = ServiceConfig::resolve(toml_config.unwrap_or_default(), overrides)
        .context("Invalid configuration")?;

    info!(
        store = %config.store,
        policy = %config.matcher.policy(),
        "Database path: {}",
        config.database_path.display()
    );

    let store = config
        .open_store()
        .await
        .context("Failed to open form store")?;
    info!("✓ Opened {} form store", store.backend());

    let state = AppState::new(store, config.matcher);
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("bc-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
