//! Service configuration
//!
//! Merges command-line overrides onto the TOML bootstrap file, resolves the
//! root folder and opens the configured document store.

use bc_common::config::{
    LoggingConfig, RootFolderInitializer, RootFolderResolver, StoreBackend, TomlConfig,
};
use bc_common::db::init_database;
use bc_common::seed::seed_store;
use bc_common::store::{DirectoryStore, SqliteStore};
use bc_common::{Error, FormStore, Result, TextMatcher};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line overrides (highest priority)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub forms_folder: Option<PathBuf>,
    pub store: Option<StoreBackend>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Force seeding at startup
    pub seed: bool,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub forms_folder: PathBuf,
    pub store: StoreBackend,
    pub seed_on_startup: bool,
    pub host: String,
    pub port: u16,
    pub matcher: TextMatcher,
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    pub fn resolve(toml: TomlConfig, cli: CliOverrides) -> Result<Self> {
        let matcher = toml.matching.matcher()?;

        let root_folder = RootFolderResolver::new()
            .with_cli(cli.root_folder)
            .with_toml(toml.root_folder)
            .resolve();
        let initializer = RootFolderInitializer::new(root_folder.clone());

        let database_path = cli
            .database_path
            .or(toml.database_path)
            .unwrap_or_else(|| initializer.database_path());
        let forms_folder = cli
            .forms_folder
            .or(toml.forms_folder)
            .unwrap_or_else(|| initializer.forms_path());

        Ok(Self {
            root_folder,
            database_path,
            forms_folder,
            store: cli.store.unwrap_or(toml.store),
            seed_on_startup: cli.seed || toml.seed_on_startup,
            host: cli.host.unwrap_or(toml.server.host),
            port: cli.port.unwrap_or(toml.server.port),
            matcher,
            logging: toml.logging,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Open the configured store, seeding the SQLite store when requested
    ///
    /// Seeding problems are logged; they never prevent startup.
    pub async fn open_store(&self) -> Result<Arc<dyn FormStore>> {
        match self.store {
            StoreBackend::Sqlite => {
                RootFolderInitializer::new(self.root_folder.clone()).ensure_directory_exists()?;
                let store = self.open_sqlite_store().await?;

                if self.seed_on_startup {
                    match seed_store(&store, &self.forms_folder).await {
                        Ok(report) if !report.is_clean() => warn!(
                            "Seeded {} of {} forms with {} errors",
                            report.saved,
                            report.found,
                            report.errors.len()
                        ),
                        Ok(report) => info!("✓ Seeded {} forms", report.saved),
                        Err(e) => warn!(
                            "Skipping seed from {}: {}",
                            self.forms_folder.display(),
                            e
                        ),
                    }
                }

                Ok(Arc::new(store))
            }
            StoreBackend::Directory => {
                if self.seed_on_startup {
                    warn!(
                        "Seeding is not supported by the read-only directory store; ignoring seed request"
                    );
                }
                if !self.forms_folder.is_dir() {
                    return Err(Error::Config(format!(
                        "Forms folder {} does not exist",
                        self.forms_folder.display()
                    )));
                }
                info!("Serving read-only forms from {}", self.forms_folder.display());
                Ok(Arc::new(DirectoryStore::new(self.forms_folder.clone())))
            }
        }
    }

    pub async fn open_sqlite_store(&self) -> Result<SqliteStore> {
        let pool = init_database(&self.database_path).await?;
        Ok(SqliteStore::new(pool))
    }
}

/// Initialize tracing from the logging config
///
/// `RUST_LOG` overrides the configured level. With a log file configured,
/// output goes to stderr and the file.
pub fn init_tracing(logging: &LoggingConfig) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", logging.level)));

    let file_layer = match &logging.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}
