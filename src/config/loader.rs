// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Environment variable consulted for the secret when the config has none.
pub const SECRET_ENV: &str = "PIPEVISOR_SECRET";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// - Reads TOML.
/// - Fills the secret from [`SECRET_ENV`] when the file does not set one.
/// - Runs the command validator over path, args, outputs and topics.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = with_env_secret(load_from_path(&path)?);
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Like [`load_and_validate`], but a missing file yields the defaults.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "config file not found; using defaults");
        return ConfigFile::try_from(with_env_secret(RawConfigFile::default()));
    }
    load_and_validate(path)
}

fn with_env_secret(mut raw: RawConfigFile) -> RawConfigFile {
    if raw.supervisor.secret.is_none() {
        if let Ok(secret) = std::env::var(SECRET_ENV) {
            debug!("using secret from {SECRET_ENV}");
            raw.supervisor.secret = Some(secret);
        }
    }
    raw
}
