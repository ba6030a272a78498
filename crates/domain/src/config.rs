//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_KEY_HEADER, DEFAULT_DISCOVERY_PAGE_SIZE, DEFAULT_SYNC_INTERVAL_SECS,
    DEFAULT_SYNC_OVERLAP_SECS, DEFAULT_TIMEOUT_SECS,
};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub providers: Vec<ProviderConfig>,
    /// Directory where received supplier invoices are dropped for import.
    pub inbox_dir: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    /// Seconds subtracted from the watermark when computing `syncFromDate`.
    pub overlap_seconds: u64,
    /// Search page size; `0` asks the provider for the total first.
    pub default_limit: u32,
    /// Attach raw technical detail to sync reports.
    pub debug: bool,
}

/// Connection settings for one PDP provider account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    pub name: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub tenant: String,
    /// Local legal entity the provider account belongs to.
    #[serde(default)]
    pub entity: String,
    pub base_url: String,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    /// Dedicated refresh resource. `None` means refresh re-authenticates.
    #[serde(default)]
    pub refresh_route: Option<String>,
    #[serde(default = "default_discovery_page_size")]
    pub discovery_page_size: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_environment() -> String {
    "prod".to_string()
}

fn default_api_key_header() -> String {
    DEFAULT_API_KEY_HEADER.to_string()
}

fn default_discovery_page_size() -> u32 {
    DEFAULT_DISCOVERY_PAGE_SIZE
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ProviderConfig {
    /// Minimal provider settings; the remaining fields take their defaults.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            environment: default_environment(),
            tenant: String::new(),
            entity: String::new(),
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            api_key: String::new(),
            api_key_header: default_api_key_header(),
            refresh_route: None,
            discovery_page_size: default_discovery_page_size(),
            timeout_seconds: default_timeout_seconds(),
        }
    }

    /// Join a resource onto the base URL without doubling slashes.
    pub fn endpoint(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), resource.trim_start_matches('/'))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            sync: SyncConfig::default(),
            providers: Vec::new(),
            inbox_dir: "inbox".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "pdpsync.db".to_string(), pool_size: 4 }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: DEFAULT_SYNC_INTERVAL_SECS,
            overlap_seconds: DEFAULT_SYNC_OVERLAP_SECS,
            default_limit: 0,
            debug: false,
        }
    }
}
