// src/core/paths.rs

use crate::constants::{CONFIG_DIR_ENV, CONFIG_DIR_NAME, REGISTRY_FILENAME};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not expand path '{path}': {message}")]
    Expansion { path: String, message: String },
    #[error("Could not create config directory at '{path}': {source}")]
    ConfigDirCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Returns the path to tp's configuration directory, creating it if needed.
///
/// `TP_CONFIG_DIR` wins over the platform default (`~/.config/tp` on Linux).
/// The askpass child inherits the variable, so both processes agree on the registry.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    let config_path = match env::var(CONFIG_DIR_ENV) {
        Ok(raw) if !raw.trim().is_empty() => expand_path(raw.trim())?,
        _ => dirs::config_dir()
            .ok_or(PathError::ConfigDirNotFound)?
            .join(CONFIG_DIR_NAME),
    };
    ensure_dir(&config_path)?;
    Ok(config_path)
}

/// Returns the path to the persisted registry document.
pub fn get_registry_path() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(REGISTRY_FILENAME))
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a user-supplied path.
pub fn expand_path(template: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        path: template.to_string(),
        message: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

fn ensure_dir(path: &Path) -> Result<(), PathError> {
    if !path.exists() {
        log::debug!("Creating config directory at '{}'", path.display());
        fs::create_dir_all(path).map_err(|e| PathError::ConfigDirCreation {
            path: path.display().to_string(),
            source: e,
        })?;
    }
    Ok(())
}
