//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables (single provider)
//! 2. If the provider variables are missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `PDPSYNC_PROVIDER_NAME`, `PDPSYNC_PROVIDER_BASE_URL`
//! - `PDPSYNC_PROVIDER_USERNAME`, `PDPSYNC_PROVIDER_PASSWORD`
//!
//! Optional:
//! - `PDPSYNC_PROVIDER_API_KEY`, `PDPSYNC_PROVIDER_API_KEY_HEADER`
//! - `PDPSYNC_PROVIDER_ENVIRONMENT`, `PDPSYNC_PROVIDER_TENANT`, `PDPSYNC_PROVIDER_ENTITY`
//! - `PDPSYNC_PROVIDER_REFRESH_ROUTE`, `PDPSYNC_PROVIDER_PAGE_SIZE`, `PDPSYNC_PROVIDER_TIMEOUT`
//! - `PDPSYNC_DB_PATH`, `PDPSYNC_DB_POOL_SIZE`
//! - `PDPSYNC_SYNC_ENABLED`, `PDPSYNC_SYNC_INTERVAL`, `PDPSYNC_SYNC_OVERLAP`,
//!   `PDPSYNC_SYNC_LIMIT`, `PDPSYNC_SYNC_DEBUG`
//! - `PDPSYNC_INBOX_DIR`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./pdpsync.json` or `./pdpsync.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use pdpsync_domain::{Config, PdpError, ProviderConfig, Result};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `PdpError::Config` if configuration cannot be loaded from either
/// source, the file format is invalid, or the result fails validation.
pub fn load() -> Result<Config> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };
    validate(&config)?;
    Ok(config)
}

/// Load a single-provider configuration from environment variables
///
/// # Errors
/// Returns `PdpError::Config` if a required variable is missing or a
/// numeric variable does not parse.
pub fn load_from_env() -> Result<Config> {
    let mut provider = ProviderConfig::new(
        env_var("PDPSYNC_PROVIDER_NAME")?,
        env_var("PDPSYNC_PROVIDER_BASE_URL")?,
        env_var("PDPSYNC_PROVIDER_USERNAME")?,
        env_var("PDPSYNC_PROVIDER_PASSWORD")?,
    );
    if let Some(api_key) = env_opt("PDPSYNC_PROVIDER_API_KEY") {
        provider.api_key = api_key;
    }
    if let Some(header) = env_opt("PDPSYNC_PROVIDER_API_KEY_HEADER") {
        provider.api_key_header = header;
    }
    if let Some(environment) = env_opt("PDPSYNC_PROVIDER_ENVIRONMENT") {
        provider.environment = environment;
    }
    provider.tenant = env_opt("PDPSYNC_PROVIDER_TENANT").unwrap_or_default();
    provider.entity = env_opt("PDPSYNC_PROVIDER_ENTITY").unwrap_or_default();
    provider.refresh_route = env_opt("PDPSYNC_PROVIDER_REFRESH_ROUTE");
    provider.discovery_page_size =
        env_parse("PDPSYNC_PROVIDER_PAGE_SIZE", provider.discovery_page_size)?;
    provider.timeout_seconds = env_parse("PDPSYNC_PROVIDER_TIMEOUT", provider.timeout_seconds)?;

    let mut config = Config { providers: vec![provider], ..Config::default() };

    if let Some(path) = env_opt("PDPSYNC_DB_PATH") {
        config.database.path = path;
    }
    config.database.pool_size = env_parse("PDPSYNC_DB_POOL_SIZE", config.database.pool_size)?;

    config.sync.enabled = env_bool("PDPSYNC_SYNC_ENABLED", config.sync.enabled);
    config.sync.interval_seconds = env_parse("PDPSYNC_SYNC_INTERVAL", config.sync.interval_seconds)?;
    config.sync.overlap_seconds = env_parse("PDPSYNC_SYNC_OVERLAP", config.sync.overlap_seconds)?;
    config.sync.default_limit = env_parse("PDPSYNC_SYNC_LIMIT", config.sync.default_limit)?;
    config.sync.debug = env_bool("PDPSYNC_SYNC_DEBUG", config.sync.debug);

    if let Some(inbox) = env_opt("PDPSYNC_INBOX_DIR") {
        config.inbox_dir = inbox;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `PdpError::Config` if the file is missing, no file is found, or
/// its content does not parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PdpError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            PdpError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| PdpError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Check cross-field constraints serde cannot express.
///
/// # Errors
/// Returns `PdpError::Config` naming the first offending setting.
pub fn validate(config: &Config) -> Result<()> {
    if config.sync.interval_seconds == 0 {
        return Err(PdpError::Config("sync.interval_seconds must be positive".into()));
    }
    let mut names = HashSet::new();
    for provider in &config.providers {
        if provider.name.trim().is_empty() {
            return Err(PdpError::Config("provider without a name".into()));
        }
        if !names.insert(provider.name.to_lowercase()) {
            return Err(PdpError::Config(format!("provider '{}' configured twice", provider.name)));
        }
        if !provider.base_url.starts_with("http://") && !provider.base_url.starts_with("https://") {
            return Err(PdpError::Config(format!(
                "provider '{}' base_url must be an http(s) URL",
                provider.name
            )));
        }
    }
    Ok(())
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PdpError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PdpError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(PdpError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its two parents and the
/// executable's directory. Returns the first file that exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 8] = [
        "config.json",
        "config.toml",
        "pdpsync.json",
        "pdpsync.toml",
        "../config.json",
        "../config.toml",
        "../../config.json",
        "../../config.toml",
    ];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| PdpError::Config(format!("Missing required environment variable: {key}")))
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw.trim().parse().map_err(|e| PdpError::Config(format!("Invalid {key}: {e}"))),
        None => Ok(default),
    }
}

/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
