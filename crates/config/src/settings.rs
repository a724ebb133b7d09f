// Application settings
// Loaded from ~/.config/collecteur/settings.toml

use std::fs;
use std::path::{Path, PathBuf};

use collecteur_recon::MatchConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_UPLOAD_MAX_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_IDS: usize = 20_000;
pub const DEFAULT_CHUNK_SIZE: usize = 800;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file holding the act tables.
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("collecteur.db"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    pub date_tolerance_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    /// Bytes.
    pub upload_max_size: u64,
    /// Distinct acte ids accepted per file.
    pub max_ids: usize,
    /// Ids per `IN (...)` query. 0 behaves as 1.
    pub chunk_size: usize,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            upload_max_size: DEFAULT_UPLOAD_MAX_SIZE,
            max_ids: DEFAULT_MAX_IDS,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvSettings {
    pub delimiter: char,
}

impl Default for CsvSettings {
    fn default() -> Self {
        Self { delimiter: ';' }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Fallback filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub matching: MatchingSettings,
    pub limits: LimitSettings,
    pub csv: CsvSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("collecteur");
        config_dir.join("settings.toml")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. A missing file yields defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let settings = Self::from_toml(&contents).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        settings.validate()?;

        log::debug!("settings loaded from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(s: &str) -> Result<Self, String> {
        toml::from_str(s).map_err(|e| e.to_string())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.csv.delimiter.is_ascii() || self.csv.delimiter.is_ascii_alphanumeric() {
            return Err(ConfigError::Invalid {
                key: "csv.delimiter",
                message: format!("'{}' is not a usable separator", self.csv.delimiter),
            });
        }
        if self.limits.upload_max_size == 0 {
            return Err(ConfigError::Invalid {
                key: "limits.upload_max_size",
                message: "must be greater than 0".into(),
            });
        }
        if self.limits.max_ids == 0 {
            return Err(ConfigError::Invalid {
                key: "limits.max_ids",
                message: "must be greater than 0".into(),
            });
        }
        Ok(())
    }

    pub fn match_config(&self) -> MatchConfig {
        MatchConfig::with_tolerance(self.matching.date_tolerance_minutes)
    }

    /// Delimiter as the single byte the CSV reader wants. `validate` guarantees ASCII.
    pub fn delimiter_byte(&self) -> u8 {
        self.csv.delimiter as u8
    }

    pub fn chunk_size(&self) -> usize {
        self.limits.chunk_size.max(1)
    }
}
