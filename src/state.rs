// src/state.rs

use crate::core::registry_manager::{self, RegistryError};
use crate::models::Registry;
use std::path::{Path, PathBuf};

/// Represents the state of the loaded registry.
/// It holds the current state and, optionally, a snapshot of the original state
/// before the first mutation occurred.
#[derive(Debug)]
enum RegistryState {
    /// No mutable access has been requested since the last load or save.
    Pristine(Registry),
    /// A mutation has been requested. We now hold both the original snapshot
    /// and the current, mutable state.
    Dirty { original: Registry, current: Registry },
}

/// Owns the registry for one process invocation and the file it came from.
///
/// Access discipline is read-full-document, mutate-in-memory, write-full-document.
/// Only paths that actually change something write back.
#[derive(Debug)]
pub struct RegistryStore {
    path: PathBuf,
    state: RegistryState,
}

impl RegistryStore {
    /// Loads the registry at `path`, creating a default document if none exists.
    pub fn open(path: &Path) -> Result<Self, RegistryError> {
        let registry = registry_manager::load_or_create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            state: RegistryState::Pristine(registry),
        })
    }

    /// The file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Provides read-only access to the current registry.
    pub fn registry(&self) -> &Registry {
        match &self.state {
            RegistryState::Pristine(registry) => registry,
            RegistryState::Dirty { current, .. } => current,
        }
    }

    /// Provides mutable access, snapshotting the original on first use.
    pub fn registry_mut(&mut self) -> &mut Registry {
        if let RegistryState::Pristine(_) = self.state {
            let pristine = std::mem::replace(
                &mut self.state,
                RegistryState::Pristine(Registry::default()),
            );
            if let RegistryState::Pristine(registry) = pristine {
                self.state = RegistryState::Dirty {
                    original: registry.clone(),
                    current: registry,
                };
            }
        }

        match &mut self.state {
            RegistryState::Dirty { current, .. } => current,
            RegistryState::Pristine(registry) => registry,
        }
    }

    /// Checks if the registry differs from what was loaded.
    pub fn needs_saving(&self) -> bool {
        match &self.state {
            RegistryState::Pristine(_) => false,
            RegistryState::Dirty { original, current } => original != current,
        }
    }

    /// Writes the registry if it changed. Afterwards the store is pristine again.
    pub fn save(&mut self) -> Result<(), RegistryError> {
        if !self.needs_saving() {
            log::debug!("Registry unchanged, nothing to save.");
            return Ok(());
        }
        registry_manager::save_registry(&self.path, self.registry())?;
        let saved = std::mem::replace(
            &mut self.state,
            RegistryState::Pristine(Registry::default()),
        );
        self.state = match saved {
            RegistryState::Dirty { current, .. } => RegistryState::Pristine(current),
            pristine => pristine,
        };
        Ok(())
    }

    /// Re-reads the document from disk, discarding unsaved in-memory changes.
    ///
    /// Needed after a child process may have rewritten the file (the askpass helper
    /// drains the handoff queue from a separate process).
    pub fn reload(&mut self) -> Result<(), RegistryError> {
        let registry = registry_manager::load_registry(&self.path)?;
        self.state = RegistryState::Pristine(registry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp_store() -> (tempfile::TempDir, RegistryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::open(&dir.path().join("registry.toml")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_read_access_does_not_require_saving() {
        let (_dir, store) = open_temp_store();
        assert_eq!(store.registry().commands.len(), 1);
        assert!(!store.needs_saving());
    }

    #[test]
    fn test_mutable_access_without_change_does_not_require_saving() {
        let (_dir, mut store) = open_temp_store();
        let _ = store.registry_mut();
        assert!(!store.needs_saving());
    }

    #[test]
    fn test_save_persists_changes_and_resets_state() {
        let (_dir, mut store) = open_temp_store();
        store.registry_mut().shell = "sh -c".to_string();
        assert!(store.needs_saving());

        store.save().unwrap();

        assert!(!store.needs_saving());
        let on_disk = registry_manager::load_registry(store.path()).unwrap();
        assert_eq!(on_disk.shell, "sh -c");
    }

    #[test]
    fn test_reload_picks_up_changes_made_by_another_process() {
        let (_dir, mut store) = open_temp_store();
        let mut external = store.registry().clone();
        external.pending_secret_requests.push_back("abc".to_string());
        registry_manager::save_registry(store.path(), &external).unwrap();

        store.reload().unwrap();

        assert_eq!(store.registry().pending_secret_requests.front().map(String::as_str), Some("abc"));
    }
}
