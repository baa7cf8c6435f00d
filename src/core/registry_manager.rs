use crate::models::Registry;

use std::io::Write;
use std::{fs, path::Path};
use tempfile::NamedTempFile;
use thiserror::Error;
use uuid::Uuid;

/// Represents errors that can occur while reading or writing the registry document.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A filesystem I/O error occurred.
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    /// The registry file could not be moved into place.
    #[error("Error with temporary file: {0}")]
    TempFile(#[from] tempfile::PersistError),
    /// The document on disk is not valid TOML for a registry.
    #[error("Failed to parse registry '{path}': {source}")]
    TomlParse {
        /// The file that failed to parse.
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// An error occurred while serializing the registry to TOML.
    #[error("Failed to serialize registry to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

type RegistryResult<T> = Result<T, RegistryError>;

/// Loads the registry from `path`. A missing file is created with the default registry.
pub fn load_or_create(path: &Path) -> RegistryResult<Registry> {
    if !path.exists() {
        log::debug!("No registry at '{}'. Writing defaults.", path.display());
        let registry = Registry::default();
        save_registry(path, &registry)?;
        return Ok(registry);
    }
    load_registry(path)
}

/// Reads and parses an existing registry document.
pub fn load_registry(path: &Path) -> RegistryResult<Registry> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|source| RegistryError::TomlParse {
        path: path.display().to_string(),
        source,
    })
}

/// Writes the full registry document, replacing the previous one in a single rename.
pub fn save_registry(path: &Path, registry: &Registry) -> RegistryResult<()> {
    let toml_string = toml::to_string_pretty(registry)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(toml_string.as_bytes())?;
    temp.flush()?;
    temp.persist(path)?;
    log::debug!("Registry saved to '{}'", path.display());
    Ok(())
}

/// Generates a fresh, opaque command identifier: a hex digest of a random UUID.
pub fn generate_command_id() -> String {
    let seed = Uuid::new_v4();
    hex::encode(blake3::hash(seed.as_bytes()).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Command;

    #[test]
    fn test_load_or_create_writes_defaults_for_missing_file() {
        // --- Setup ---
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.toml");

        // --- Execute ---
        let registry = load_or_create(&path).unwrap();

        // --- Assert ---
        assert!(path.exists());
        assert_eq!(registry, Registry::default());
        assert_eq!(load_registry(&path).unwrap(), registry);
    }

    #[test]
    fn test_save_then_load_preserves_commands_and_queue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.toml");
        let mut registry = Registry::default();
        registry.commands.push(Command {
            id: "abc".to_string(),
            alias: "box".to_string(),
            description: String::new(),
            scripts: vec!["ssh user@host".to_string()],
        });
        registry.pending_secret_requests.push_back("abc".to_string());

        save_registry(&path, &registry).unwrap();

        assert_eq!(load_registry(&path).unwrap(), registry);
    }

    #[test]
    fn test_load_registry_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.toml");
        fs::write(&path, "commands = 12").unwrap();

        let err = load_registry(&path).unwrap_err();

        assert!(matches!(err, RegistryError::TomlParse { .. }));
        assert!(err.to_string().contains("registry.toml"));
    }

    #[test]
    fn test_generated_ids_are_unique_hex_digests() {
        let a = generate_command_id();
        let b = generate_command_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
