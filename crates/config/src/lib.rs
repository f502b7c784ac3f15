#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for wheelhouse
//!
//! Configuration is layered, later layers win:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/wheelhouse/config.toml)
//! - Environment variables
//! - CLI flags

pub mod sections;

pub use sections::{
    GeneralConfig, IndexConfig, NetworkConfig, RehostConfig, StoreConfig, TransferConfig,
    DEFAULT_BASE_CHUNK_SIZE,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use wheelhouse_errors::{ConfigError, Error};
use wheelhouse_types::ColorChoice;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub transfer: TransferConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub rehost: RehostConfig,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub store_root: Option<PathBuf>,
    pub bucket: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub acl: Option<String>,
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Where the artifacts live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreLocation<'a> {
    /// Local directory used as a bucket
    Filesystem(&'a Path),
    /// S3 bucket; connection details stay in [`StoreConfig`]
    S3 { bucket: &'a str },
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("wheelhouse").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.display().to_string(),
                }
                .into()
            } else {
                Error::io_with_path(&e, path)
            }
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!("no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with process environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Merge environment-style variables supplied by `lookup`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for unparsable values.
    pub fn merge_env_from<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("WHEELHOUSE_STORE_ROOT") {
            self.store.bucket = None;
            self.store.root = Some(PathBuf::from(root));
        }
        if let Some(bucket) = lookup("WHEELHOUSE_BUCKET") {
            self.store.root = None;
            self.store.bucket = Some(bucket);
        }
        if let Some(region) = lookup("WHEELHOUSE_REGION") {
            self.store.region = Some(region);
        }
        if let Some(endpoint) = lookup("WHEELHOUSE_S3_ENDPOINT") {
            self.store.endpoint = Some(endpoint);
        }
        if let Some(key) = lookup("WHEELHOUSE_ACCESS_KEY") {
            self.store.access_key = Some(key);
        }
        if let Some(secret) = lookup("WHEELHOUSE_SECRET_KEY") {
            self.store.secret_key = Some(secret);
        }
        if let Some(acl) = lookup("WHEELHOUSE_ACL") {
            self.store.acl = Some(acl);
        }
        if let Some(server) = lookup("WHEELHOUSE_INDEX_URL") {
            self.index.server = Some(server);
        }
        if let Some(user) = lookup("WHEELHOUSE_INDEX_USER") {
            self.index.username = Some(user);
        }
        if let Some(password) = lookup("WHEELHOUSE_INDEX_PASSWORD") {
            self.index.password = Some(password);
        }

        if let Some(workers) = lookup("WHEELHOUSE_WORKERS") {
            self.transfer.workers = workers.parse().map_err(|_| ConfigError::InvalidValue {
                field: "WHEELHOUSE_WORKERS".to_string(),
                value: workers,
            })?;
        }

        if let Some(pip) = lookup("WHEELHOUSE_PIP") {
            self.rehost.pip = pip;
        }

        if let Some(color) = lookup("WHEELHOUSE_COLOR") {
            self.general.color =
                color
                    .parse::<ColorChoice>()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "WHEELHOUSE_COLOR".to_string(),
                        value: color,
                    })?;
        }

        Ok(())
    }

    /// Apply command line values on top of everything else
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(root) = overrides.store_root {
            self.store.bucket = None;
            self.store.root = Some(root);
        }
        if let Some(bucket) = overrides.bucket {
            self.store.root = None;
            self.store.bucket = Some(bucket);
        }
        if let Some(key) = overrides.access_key {
            self.store.access_key = Some(key);
        }
        if let Some(secret) = overrides.secret_key {
            self.store.secret_key = Some(secret);
        }
        if let Some(acl) = overrides.acl {
            self.store.acl = Some(acl);
        }
        if let Some(server) = overrides.server {
            self.index.server = Some(server);
        }
        if let Some(user) = overrides.username {
            self.index.username = Some(user);
        }
        if let Some(password) = overrides.password {
            self.index.password = Some(password);
        }
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for out-of-range settings.
    pub fn validate(&self) -> Result<(), Error> {
        if self.transfer.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "transfer.workers".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.transfer.base_chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "transfer.base_chunk_size".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.store.root.is_some() && self.store.bucket.is_some() {
            return Err(ConfigError::Invalid {
                message: "store.root and store.bucket are mutually exclusive".to_string(),
            }
            .into());
        }
        if self.store.access_key.is_some() != self.store.secret_key.is_some() {
            return Err(ConfigError::Invalid {
                message: "store.access_key and store.secret_key must be set together".to_string(),
            }
            .into());
        }
        if self.rehost.pip.split_whitespace().next().is_none() {
            return Err(ConfigError::InvalidValue {
                field: "rehost.pip".to_string(),
                value: self.rehost.pip.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Bucket the commands operate on
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` when neither a bucket nor a root
    /// directory is configured.
    pub fn store_location(&self) -> Result<StoreLocation<'_>, Error> {
        if let Some(bucket) = self.store.bucket.as_deref() {
            return Ok(StoreLocation::S3 { bucket });
        }
        self.store
            .root
            .as_deref()
            .map(StoreLocation::Filesystem)
            .ok_or_else(|| {
                ConfigError::MissingField {
                    field: "store.bucket".to_string(),
                }
                .into()
            })
    }
}
