//! Configuration loader
//!
//! Builds a [`ClientConfig`] from defaults, an optional file and the process
//! environment, in that order.
//!
//! ## Environment Variables
//! - `XDR_API_URL`: Base URL of the tenant API
//! - `XDR_API_KEY`: API key
//! - `XDR_API_KEY_ID`: Numeric API key id
//! - `XDR_KEY_TYPE`: `standard` or a signed key type (e.g. `advanced`)
//! - `XDR_TIMEOUT_SECS`: Per-attempt timeout in seconds
//! - `XDR_MAX_RETRIES`: Retries after the first attempt
//! - `XDR_RETRY_MAX_DELAY_SECS`: Backoff cap in seconds (0 selects 60)
//! - `XDR_USER_AGENT`: User-Agent override
//!
//! ## File Locations
//! Without an explicit path, the loader probes the current working directory
//! for `xdr.json`, `xdr.toml`, `config.json` and `config.toml`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use xdr_domain::{ClientConfig, KeyType, Result, XdrError};

pub const ENV_API_URL: &str = "XDR_API_URL";
pub const ENV_API_KEY: &str = "XDR_API_KEY";
pub const ENV_API_KEY_ID: &str = "XDR_API_KEY_ID";
pub const ENV_KEY_TYPE: &str = "XDR_KEY_TYPE";
pub const ENV_TIMEOUT_SECS: &str = "XDR_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "XDR_MAX_RETRIES";
pub const ENV_RETRY_MAX_DELAY_SECS: &str = "XDR_RETRY_MAX_DELAY_SECS";
pub const ENV_USER_AGENT: &str = "XDR_USER_AGENT";

const CONFIG_FILE_NAMES: [&str; 4] = ["xdr.json", "xdr.toml", "config.json", "config.toml"];

/// Load configuration: file, then environment overlay, then validation
///
/// # Arguments
/// * `path` - Optional config file. If `None`, uses [`probe_config_paths`]
///   and falls back to defaults when nothing is found.
///
/// # Errors
/// Returns `XdrError::Config` if:
/// - The explicit file does not exist or cannot be parsed
/// - An environment override has an invalid value
/// - The resulting configuration fails validation
pub fn load(path: Option<PathBuf>) -> Result<ClientConfig> {
    let base = match path.or_else(probe_config_paths) {
        Some(path) => load_from_file(&path)?,
        None => {
            tracing::debug!("No config file found, starting from defaults");
            ClientConfig::default()
        }
    };

    let config = load_from_env(base)?;
    config.validate()?;

    tracing::info!(
        api_url = %config.api_url,
        key_type = %config.key_type,
        max_retries = config.max_retries,
        "Client configuration loaded"
    );
    Ok(config)
}

/// Overlay `XDR_*` environment variables onto `base`.
///
/// Unset variables leave the corresponding field untouched.
///
/// # Errors
/// Returns `XdrError::Config` if a numeric variable does not parse.
pub fn load_from_env(base: ClientConfig) -> Result<ClientConfig> {
    apply_overrides_from(base, |key| std::env::var(key).ok())
}

/// Overlay values from an arbitrary key lookup onto `base`.
///
/// # Errors
/// Returns `XdrError::Config` if a numeric value does not parse.
pub fn apply_overrides_from<F>(mut config: ClientConfig, lookup: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_API_URL) {
        config.api_url = url;
    }
    if let Some(key) = lookup(ENV_API_KEY) {
        config.api_key = key;
    }
    if let Some(id) = lookup(ENV_API_KEY_ID) {
        config.api_key_id = parse_number(ENV_API_KEY_ID, &id)?;
    }
    if let Some(key_type) = lookup(ENV_KEY_TYPE) {
        config.key_type = KeyType::from(key_type);
    }
    if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
        config.timeout_seconds = parse_number(ENV_TIMEOUT_SECS, &timeout)?;
    }
    if let Some(retries) = lookup(ENV_MAX_RETRIES) {
        config.max_retries = parse_number(ENV_MAX_RETRIES, &retries)?;
    }
    if let Some(delay) = lookup(ENV_RETRY_MAX_DELAY_SECS) {
        config.retry_max_delay_seconds = parse_number(ENV_RETRY_MAX_DELAY_SECS, &delay)?;
    }
    if let Some(agent) = lookup(ENV_USER_AGENT) {
        config.user_agent = Some(agent).filter(|agent| !agent.is_empty());
    }
    Ok(config)
}

/// Load configuration from a JSON or TOML file
///
/// Fields missing from the file keep their defaults. The result is not
/// validated; [`load`] does that after the environment overlay.
///
/// # Errors
/// Returns `XdrError::Config` if the file is missing, unreadable, or not
/// valid JSON/TOML.
pub fn load_from_file(path: &Path) -> Result<ClientConfig> {
    if !path.exists() {
        return Err(XdrError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| XdrError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, path)
}

/// Parse configuration, detecting the format by file extension.
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| XdrError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| XdrError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(XdrError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// First existing config file in the current working directory, if any.
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    CONFIG_FILE_NAMES.iter().map(|name| cwd.join(name)).find(|path| path.is_file())
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| XdrError::Config(format!("Invalid value for {}: {}", key, e)))
}
