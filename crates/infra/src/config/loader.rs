//! Configuration loader
//!
//! Loads configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads `.env` (if present) into the process environment
//! 2. Loads from environment variables when the backend is fully specified
//! 3. Otherwise probes for a config file, or starts from defaults
//! 4. Applies the remaining environment overrides and validates
//!
//! ## Environment Variables
//! - `MAGICBOX_BACKEND_URL`: Hosted backend base URL
//! - `MAGICBOX_BACKEND_ANON_KEY`: Publishable (anonymous) backend key
//! - `MAGICBOX_ENV`: `development` or `production`
//! - `MAGICBOX_AUTH_TIMEOUT_MS`: Session wait bound on the callback route
//! - `MAGICBOX_CURRENT_ORIGIN`: Origin the app is served from
//!
//! ## File Locations
//! `config.toml`, `config.json`, `magicbox.toml` and `magicbox.json` in the
//! working directory, then the parent directory.

use std::path::{Path, PathBuf};

use magicbox_domain::{Config, Environment, MagicBoxError, Result};

pub const BACKEND_URL_VAR: &str = "MAGICBOX_BACKEND_URL";
pub const BACKEND_ANON_KEY_VAR: &str = "MAGICBOX_BACKEND_ANON_KEY";
pub const ENVIRONMENT_VAR: &str = "MAGICBOX_ENV";
pub const AUTH_TIMEOUT_VAR: &str = "MAGICBOX_AUTH_TIMEOUT_MS";
pub const CURRENT_ORIGIN_VAR: &str = "MAGICBOX_CURRENT_ORIGIN";

const CONFIG_FILE_NAMES: [&str; 4] = ["config.toml", "config.json", "magicbox.toml", "magicbox.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `MagicBoxError::Config` if a source is malformed, or if the
/// result fails validation (e.g. production without backend settings).
pub fn load() -> Result<Config> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) => tracing::debug!(error = %err, "no .env loaded"),
    }

    let mut config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = %e, "Backend not set in environment, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path))?,
                None => {
                    tracing::debug!("No config file found, using defaults");
                    Config::default()
                }
            }
        }
    };

    apply_env_overrides(&mut config)?;
    if config.backend.is_placeholder() && !config.environment.is_production() {
        tracing::warn!("Backend not configured, using placeholder values");
    }
    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// Both backend variables must be present.
///
/// # Errors
/// Returns `MagicBoxError::Config` if a required variable is missing or a
/// value is invalid.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    config.backend.url = env_var(BACKEND_URL_VAR)?;
    config.backend.anon_key = env_var(BACKEND_ANON_KEY_VAR)?;
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `MagicBoxError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(MagicBoxError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            MagicBoxError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| MagicBoxError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Apply the optional environment overrides on top of `config`.
///
/// # Errors
/// Returns `MagicBoxError::Config` for an unknown environment name or a
/// non-numeric timeout.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(url) = env_opt(BACKEND_URL_VAR) {
        config.backend.url = url;
    }
    if let Some(key) = env_opt(BACKEND_ANON_KEY_VAR) {
        config.backend.anon_key = key;
    }
    if let Some(name) = env_opt(ENVIRONMENT_VAR) {
        config.environment = Environment::parse(&name)
            .ok_or_else(|| MagicBoxError::Config(format!("Unknown environment: {name}")))?;
    }
    if let Some(timeout) = env_opt(AUTH_TIMEOUT_VAR) {
        config.auth.session_timeout_ms = timeout
            .parse()
            .map_err(|e| MagicBoxError::Config(format!("Invalid auth timeout: {e}")))?;
    }
    Ok(())
}

/// Origin the app is served from, if configured
pub fn current_origin() -> Option<String> {
    env_opt(CURRENT_ORIGIN_VAR)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MagicBoxError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MagicBoxError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(MagicBoxError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the working directory or its parent
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    probe_config_paths_in(&cwd)
}

/// First existing config file in `dir` or its parent
pub fn probe_config_paths_in(dir: &Path) -> Option<PathBuf> {
    let parent = dir.parent();
    std::iter::once(dir)
        .chain(parent)
        .flat_map(|base| CONFIG_FILE_NAMES.iter().map(move |name| base.join(name)))
        .find(|path| path.is_file())
}

fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        MagicBoxError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Non-empty environment variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
