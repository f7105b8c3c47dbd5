//! Bootstrap configuration and root folder resolution
//!
//! Settings come from a TOML file; every key is optional. Sources are
//! applied in priority order:
//!
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables (`BLINDCHECK_ROOT_FOLDER`, `BLINDCHECK_CONFIG`)
//! 3. TOML configuration file
//! 4. Built-in defaults
//!
//! A missing config file is not an error: a warning is logged and defaults
//! apply. A file that exists but cannot be parsed is an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::matching::{MatchPolicy, MatchThresholds, TextMatcher};
use crate::matching::{DEFAULT_LENIENT_THRESHOLD, DEFAULT_STRICT_THRESHOLD};
use crate::{Error, Result};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "BLINDCHECK_ROOT_FOLDER";

/// Environment variable naming the config file
pub const CONFIG_FILE_ENV: &str = "BLINDCHECK_CONFIG";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;

const APP_DIR_NAME: &str = "blindcheck";
const DATABASE_FILE_NAME: &str = "blindcheck.db";
const FORMS_DIR_NAME: &str = "forms";

/// Which document store backs the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Writable SQLite document store
    #[default]
    Sqlite,
    /// Read-only folder of JSON documents
    Directory,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Sqlite => write!(f, "sqlite"),
            StoreBackend::Directory => write!(f, "directory"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "directory" => Ok(StoreBackend::Directory),
            other => Err(Error::Config(format!(
                "unknown store backend '{}' (expected 'sqlite' or 'directory')",
                other
            ))),
        }
    }
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Root folder holding the database and forms folder
    pub root_folder: Option<PathBuf>,

    /// Overrides `<root>/blindcheck.db`
    pub database_path: Option<PathBuf>,

    /// Overrides `<root>/forms`
    pub forms_folder: Option<PathBuf>,

    pub store: StoreBackend,

    /// Load the forms folder into the SQLite store at startup
    pub seed_on_startup: bool,

    pub server: ServerConfig,
    pub matching: MatchingConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Text matching settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Policy used when a request does not name one
    pub policy: MatchPolicy,
    pub strict_threshold: f64,
    pub lenient_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::default(),
            strict_threshold: DEFAULT_STRICT_THRESHOLD,
            lenient_threshold: DEFAULT_LENIENT_THRESHOLD,
        }
    }
}

impl MatchingConfig {
    pub fn thresholds(&self) -> MatchThresholds {
        MatchThresholds {
            strict: self.strict_threshold,
            lenient: self.lenient_threshold,
        }
    }

    /// Matcher for these settings; fails on out-of-range thresholds
    pub fn matcher(&self) -> Result<TextMatcher> {
        let thresholds = self.thresholds();
        thresholds.validate()?;
        Ok(TextMatcher::new(self.policy, thresholds))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl TomlConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(toml_str)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an existing file
    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config = Self::from_toml_str(&toml_str)?;
        info!("Loaded TOML configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<()> {
        self.matching.thresholds().validate()?;

        if self.server.host.trim().is_empty() {
            return Err(Error::Config("server.host must not be empty".to_string()));
        }
        if self.logging.level.trim().is_empty() {
            return Err(Error::Config("logging.level must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Platform config file location: `<config_dir>/blindcheck/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME).join("config.toml"))
        .unwrap_or_else(|| PathBuf::from(APP_DIR_NAME).join("config.toml"))
}

/// Config file path: CLI > `BLINDCHECK_CONFIG` > platform default
pub fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }
    match std::env::var(CONFIG_FILE_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => default_config_path(),
    }
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./blindcheck_data"))
}

/// Root folder resolution: CLI > `BLINDCHECK_ROOT_FOLDER` > TOML > default
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli: Option<PathBuf>,
    toml: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cli(mut self, path: Option<PathBuf>) -> Self {
        self.cli = path;
        self
    }

    pub fn with_toml(mut self, path: Option<PathBuf>) -> Self {
        self.toml = path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli {
            info!("Root folder: {} (from command line)", path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                info!("Root folder: {} (from {})", path, ROOT_FOLDER_ENV);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml {
            info!("Root folder: {} (from config file)", path.display());
            return path.clone();
        }

        let path = default_root_folder();
        info!("Root folder: {} (default)", path.display());
        path
    }
}

/// Paths inside a resolved root folder
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root folder if needed (idempotent)
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn forms_path(&self) -> PathBuf {
        self.root_folder.join(FORMS_DIR_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}
