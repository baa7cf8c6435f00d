//! # Secret Vault
//!
//! Wraps the OS credential store. Secrets are filed under a fixed service name and an
//! account derived from a one-way digest of the command id, so neither aliases nor raw
//! ids ever show up in a credential manager's UI, and renaming an alias keeps its secret.
//!
//! The store itself sits behind [`CredentialStore`] so the rest of the crate can be
//! exercised against [`MemoryCredentialStore`] in tests.

use crate::constants::SERVICE_NAME;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use thiserror::Error;

/// Errors raised by a [`CredentialStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// The backend refused or could not be reached (locked keychain, no D-Bus, ...).
    #[error("The OS credential store could not be reached: {0}")]
    Unavailable(String),
    /// There is no entry for the account.
    #[error("No secret is stored for this command.")]
    NotFound,
}

/// A keyed secret store addressed by `(service, account)`.
pub trait CredentialStore: fmt::Debug {
    /// Creates or overwrites the entry.
    fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), VaultError>;
    /// Reads the entry, failing with [`VaultError::NotFound`] if there is none.
    fn get(&self, service: &str, account: &str) -> Result<String, VaultError>;
    /// Removes the entry, failing with [`VaultError::NotFound`] if there is none.
    fn delete(&self, service: &str, account: &str) -> Result<(), VaultError>;
}

/// The platform credential store (Keychain, Credential Manager, Secret Service).
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringCredentialStore;

impl KeyringCredentialStore {
    fn entry(service: &str, account: &str) -> Result<keyring::Entry, VaultError> {
        keyring::Entry::new(service, account).map_err(map_keyring_error)
    }
}

fn map_keyring_error(err: keyring::Error) -> VaultError {
    match err {
        keyring::Error::NoEntry => VaultError::NotFound,
        other => VaultError::Unavailable(other.to_string()),
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), VaultError> {
        Self::entry(service, account)?
            .set_password(secret)
            .map_err(map_keyring_error)
    }

    fn get(&self, service: &str, account: &str) -> Result<String, VaultError> {
        Self::entry(service, account)?
            .get_password()
            .map_err(map_keyring_error)
    }

    fn delete(&self, service: &str, account: &str) -> Result<(), VaultError> {
        Self::entry(service, account)?
            .delete_credential()
            .map_err(map_keyring_error)
    }
}

/// A process-local store for throwaway vaults.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryCredentialStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), String>>, VaultError> {
        self.entries
            .lock()
            .map_err(|_| VaultError::Unavailable("in-memory store poisoned".to_string()))
    }

    /// Number of stored entries.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Whether the store holds no entries.
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), VaultError> {
        self.lock()?
            .insert((service.to_string(), account.to_string()), secret.to_string());
        Ok(())
    }

    fn get(&self, service: &str, account: &str) -> Result<String, VaultError> {
        self.lock()?
            .get(&(service.to_string(), account.to_string()))
            .cloned()
            .ok_or(VaultError::NotFound)
    }

    fn delete(&self, service: &str, account: &str) -> Result<(), VaultError> {
        self.lock()?
            .remove(&(service.to_string(), account.to_string()))
            .map(|_| ())
            .ok_or(VaultError::NotFound)
    }
}

/// Command-id keyed access to a [`CredentialStore`].
#[derive(Debug)]
pub struct Vault {
    service: String,
    store: Box<dyn CredentialStore>,
}

impl Vault {
    /// A vault over the given store, filing entries under `tp-secret`.
    pub fn new(store: Box<dyn CredentialStore>) -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            store,
        }
    }

    /// A vault backed by the OS credential store.
    pub fn keyring() -> Self {
        Self::new(Box::new(KeyringCredentialStore))
    }

    /// The account name a command's secret is filed under.
    pub fn account_for(id: &str) -> String {
        hex::encode(blake3::hash(id.as_bytes()).as_bytes())
    }

    /// Creates or overwrites the secret for `id`.
    pub fn store(&self, id: &str, secret: &str) -> Result<(), VaultError> {
        log::debug!("Storing secret for command id '{}'", id);
        self.store.set(&self.service, &Self::account_for(id), secret)
    }

    /// Reads the secret for `id`. An empty stored value counts as absent.
    pub fn retrieve(&self, id: &str) -> Result<String, VaultError> {
        let secret = self.store.get(&self.service, &Self::account_for(id))?;
        if secret.is_empty() {
            return Err(VaultError::NotFound);
        }
        Ok(secret)
    }

    /// The value currently stored for `id`, `None` if there is none. Unlike
    /// [`Vault::contains`], an unreachable store is an error here.
    pub fn previous_value(&self, id: &str) -> Result<Option<String>, VaultError> {
        match self.store.get(&self.service, &Self::account_for(id)) {
            Ok(secret) => Ok(Some(secret)),
            Err(VaultError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Whether a usable secret exists for `id`. Store failures read as "no secret".
    pub fn contains(&self, id: &str) -> bool {
        match self.retrieve(id) {
            Ok(_) => true,
            Err(VaultError::NotFound) => false,
            Err(e) => {
                log::warn!("Could not check secret for command id '{}': {}", id, e);
                false
            }
        }
    }

    /// Best-effort removal. Missing entries are fine; other failures are only logged.
    pub fn delete(&self, id: &str) {
        match self.store.delete(&self.service, &Self::account_for(id)) {
            Ok(()) => log::debug!("Deleted secret for command id '{}'", id),
            Err(VaultError::NotFound) => {
                log::debug!("No secret to delete for command id '{}'", id);
            }
            Err(e) => log::warn!("Failed to delete secret for command id '{}': {}", id, e),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_store_then_retrieve_roundtrip() {
        let (vault, _) = memory_vault();
        vault.store("abc", "hunter2").unwrap();
        assert_eq!(vault.retrieve("abc").unwrap(), "hunter2");
        assert!(vault.contains("abc"));
    }

    #[test]
    fn test_delete_then_retrieve_is_not_found() {
        let (vault, _) = memory_vault();
        vault.store("abc", "hunter2").unwrap();
        vault.delete("abc");
        assert_eq!(vault.retrieve("abc"), Err(VaultError::NotFound));
    }

    #[test]
    fn test_delete_of_missing_entry_is_tolerated() {
        let (vault, store) = memory_vault();
        vault.delete("never-stored");
        assert!(store.0.is_empty());
    }

    #[test]
    fn test_entries_are_keyed_by_digest_not_raw_id() {
        let (vault, store) = memory_vault();
        vault.store("abc", "s3cret").unwrap();

        let account = Vault::account_for("abc");
        assert_ne!(account, "abc");
        assert_eq!(account.len(), 64);
        assert_eq!(store.0.get(SERVICE_NAME, &account).unwrap(), "s3cret");
        assert_eq!(store.0.get(SERVICE_NAME, "abc"), Err(VaultError::NotFound));
    }

    #[test]
    fn test_empty_secret_counts_as_absent() {
        let (vault, _) = memory_vault();
        vault.store("abc", "").unwrap();
        assert_eq!(vault.retrieve("abc"), Err(VaultError::NotFound));
        assert!(!vault.contains("abc"));
    }

    #[test]
    fn test_unreachable_store_surfaces_on_store_but_not_on_delete() {
        let vault = Vault::new(Box::new(UnreachableStore));
        assert!(matches!(vault.store("abc", "x"), Err(VaultError::Unavailable(_))));
        assert!(!vault.contains("abc"));
        vault.delete("abc");
    }
}
