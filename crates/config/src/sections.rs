//! Configuration sections

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use wheelhouse_types::{ColorChoice, OutputFormat};

/// Size of the smallest transfer chunk (5 MiB)
pub const DEFAULT_BASE_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

/// Object store location and default access policy
///
/// A bucket name selects S3; otherwise `root` names a local directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Bucket root directory
    pub root: Option<PathBuf>,
    /// S3 bucket name
    pub bucket: Option<String>,
    pub region: Option<String>,
    /// S3-compatible endpoint such as `http://localhost:9000`
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
    /// Canned access policy applied after each upload
    pub acl: Option<String>,
    /// Lifetime of `fetch --url` links, in seconds
    #[serde(default = "default_url_expiry")]
    pub url_expiry: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: None,
            bucket: None,
            region: None,
            endpoint: None,
            access_key: None,
            secret_key: None,
            force_path_style: false,
            acl: None,
            url_expiry: default_url_expiry(),
        }
    }
}

/// Index server settings used for the rebuild notification
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IndexConfig {
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl IndexConfig {
    /// Server, username and password, when all three are set
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        match (&self.server, &self.username, &self.password) {
            (Some(server), Some(user), Some(password)) => {
                Some((server.as_str(), user.as_str(), password.as_str()))
            }
            _ => None,
        }
    }
}

/// Multi-part transfer tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Extra attempts per chunk after the first failure
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_base_chunk_size")]
    pub base_chunk_size: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            retries: 3,
            base_chunk_size: DEFAULT_BASE_CHUNK_SIZE,
            retry_delay_ms: 250,
            content_type: default_content_type(),
        }
    }
}

/// Rehosting from a public index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RehostConfig {
    /// Command used to download packages, e.g. `pip` or `python3 -m pip`
    #[serde(default = "default_pip")]
    pub pip: String,
}

impl Default for RehostConfig {
    fn default() -> Self {
        Self { pip: default_pip() }
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            connect_timeout: 10,
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_workers() -> usize {
    4
}

fn default_retries() -> u32 {
    3
}

fn default_base_chunk_size() -> u64 {
    DEFAULT_BASE_CHUNK_SIZE
}

fn default_retry_delay_ms() -> u64 {
    250
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

fn default_url_expiry() -> u64 {
    300
}

fn default_pip() -> String {
    "pip".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}
