//! Persistent settings stored as TOML in the application directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize, de::Error as SerdeDeError};
use thiserror::Error;

use crate::app_dirs;
use crate::http_client::Timeouts;
use crate::reference_data::{ReferenceData, ReferenceDataError};
use crate::service::api::{DEFAULT_BASE_URL, parse_base_url};

/// Default filename used to store the app configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Settings loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceSettings,
    /// Optional TOML file replacing the built-in option lists.
    #[serde(default)]
    pub reference_data_path: Option<PathBuf>,
}

/// Where the prediction service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Unset means the transport default.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Unset means the transport default.
    #[serde(default)]
    pub read_timeout_secs: Option<u64>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: None,
            read_timeout_secs: None,
        }
    }
}

impl ServiceSettings {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: self.connect_timeout_secs.map(Duration::from_secs),
            read: self.read_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl AppConfig {
    /// Resolve the option lists, falling back to the built-in set.
    pub fn reference_data(&self) -> Result<ReferenceData, ConfigError> {
        match &self.reference_data_path {
            Some(path) => Ok(ReferenceData::load_from_path(path)?),
            None => Ok(ReferenceData::builtin()),
        }
    }
}

/// Errors that may occur while loading or saving app configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("Invalid service base_url {url:?} in {path}: {reason}")]
    InvalidBaseUrl {
        path: PathBuf,
        url: String,
        reason: String,
    },
    #[error("No suitable config directory found")]
    NoConfigDir,
    #[error(transparent)]
    ReferenceData(#[from] ReferenceDataError),
}

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from disk, returning defaults if missing.
pub fn load_or_default() -> Result<AppConfig, ConfigError> {
    load_from_path(&config_path()?)
}

/// Load configuration from a specific path, returning defaults if missing.
pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {}; using defaults", path.display());
        return Ok(AppConfig::default());
    }
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source: SerdeDeError::custom(source),
    })?;
    let config: AppConfig = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&config, path)?;
    Ok(config)
}

/// Persist configuration to disk, overwriting any previous contents.
pub fn save(config: &AppConfig) -> Result<(), ConfigError> {
    save_to_path(config, &config_path()?)
}

/// Save configuration to a specific path, creating parent directories as needed.
pub fn save_to_path(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    validate(config, path)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, data).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn validate(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    parse_base_url(&config.service.base_url).map_err(|err| ConfigError::InvalidBaseUrl {
        path: path.to_path_buf(),
        url: config.service.base_url.clone(),
        reason: err.to_string(),
    })?;
    Ok(())
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => ConfigError::CreateDir { path, source },
    }
}
