use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flightdb::store::{JournalMode, StoreOptions, Synchronous};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_ENV: &str = "FLIGHTDB_CONFIG";

/// Settings read from `config.toml`; every key is optional.
#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
}

impl CliConfig {
    /// Reads `explicit`, else `$FLIGHTDB_CONFIG`, else the per-user default.
    ///
    /// An absent file yields the defaults; an unreadable or malformed one is
    /// an error.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => RawConfig::default(),
        };
        data.validate()?;
        Ok(Self { path, data })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.data.database.path.as_deref()
    }

    pub fn coordinates_path(&self) -> Option<&Path> {
        self.data.coordinates.path.as_deref()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.data.log.level.as_deref()
    }

    /// Import delimiter, if configured. Validated to be a single ASCII byte.
    pub fn delimiter(&self) -> Option<u8> {
        self.data
            .import
            .delimiter
            .as_deref()
            .and_then(|d| d.as_bytes().first().copied())
    }

    /// Store options with configured overrides applied.
    pub fn store_options(&self, create_if_missing: bool) -> StoreOptions {
        let mut opts = StoreOptions {
            create_if_missing,
            ..StoreOptions::default()
        };
        let db = &self.data.database;
        if let Some(mode) = db.journal_mode {
            opts.journal_mode = mode;
        }
        if let Some(sync) = db.synchronous {
            opts.synchronous = sync;
        }
        if let Some(ms) = db.busy_timeout_ms {
            opts.busy_timeout = Duration::from_millis(ms);
        }
        opts
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    database: DatabaseSection,
    #[serde(default)]
    import: ImportSection,
    #[serde(default)]
    log: LogSection,
    #[serde(default)]
    coordinates: CoordinatesSection,
}

impl RawConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(delimiter) = self.import.delimiter.as_deref() {
            if delimiter.len() != 1 || !delimiter.is_ascii() {
                return Err(ConfigError::InvalidDelimiter(delimiter.to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct DatabaseSection {
    path: Option<PathBuf>,
    journal_mode: Option<JournalMode>,
    synchronous: Option<Synchronous>,
    busy_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct ImportSection {
    delimiter: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct LogSection {
    level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct CoordinatesSection {
    path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("import delimiter '{0}' must be a single ASCII character")]
    InvalidDelimiter(String),
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("flightdb").join("config.toml"))
}
