//! # Settings Reconciler
//!
//! Drives the edit, merge and diff cycle behind `tp -s`:
//!
//! 1. Render the registry as an editable TOML document.
//! 2. Let the user edit it (through a [`DocumentEditor`]).
//! 3. Parse the result. A parse failure aborts with nothing changed.
//! 4. Give every command without an `id` a fresh one.
//! 5. Reject the whole edit on the first duplicate `id`.
//! 6. Move inline secrets into the vault and blank them.
//! 7. Delete vault entries of commands that disappeared.
//! 8. Replace the registry (the caller persists it).
//!
//! Steps 3 to 5 finish before the vault is touched, so a rejected edit leaves both the
//! registry and the vault exactly as they were. A vault failure in step 6 undoes the
//! writes already made in that step.

use crate::{
    core::{registry_manager, vault::Vault},
    models::{Command, Registry, SettingsCommand, SettingsDocument},
    system::editor::{DocumentEditor, EditorError},
};
use std::collections::HashSet;
use thiserror::Error;

const DOCUMENT_HEADER: &str = "\
# tp settings. Save and close the editor to apply.
#
# Leave `id` empty for new commands; one will be generated.
# Put a password in `secret` to move it into the OS keychain.
# It is removed from this file as soon as you save.

";

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("Failed to render settings as TOML: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("Edited settings are not valid; nothing was changed.\n{0}")]
    Parse(#[from] toml::de::Error),
    #[error("Could not store the secret for '{alias}': {source}")]
    Vault {
        alias: String,
        #[source]
        source: crate::core::vault::VaultError,
    },
}

/// A command that was dropped from the registry during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedCommand {
    pub alias: String,
    pub description: String,
}

/// The result of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The edit was merged into the registry.
    Applied {
        removed: Vec<RemovedCommand>,
        secrets_stored: usize,
    },
    /// Two commands share an id; nothing was changed.
    DuplicateId(String),
}

/// Renders the editable settings document for `registry`.
pub fn render_document(registry: &Registry) -> Result<String, toml::ser::Error> {
    let body = toml::to_string_pretty(&SettingsDocument::from(registry))?;
    Ok(format!("{}{}", DOCUMENT_HEADER, body))
}

/// Parses an edited settings document.
pub fn parse_document(text: &str) -> Result<SettingsDocument, toml::de::Error> {
    toml::from_str(text)
}

/// Runs the full edit cycle against `registry`, using `editor` for the user step.
pub fn reconcile(
    registry: &mut Registry,
    vault: &Vault,
    editor: &dyn DocumentEditor,
) -> Result<ReconcileOutcome, ReconcileError> {
    let document = render_document(registry)?;
    let edited = editor.edit(&document)?;
    let candidate = parse_document(&edited)?;
    apply(registry, vault, candidate)
}

/// Merges an already parsed document into `registry` (steps 4 to 8).
pub fn apply(
    registry: &mut Registry,
    vault: &Vault,
    mut candidate: SettingsDocument,
) -> Result<ReconcileOutcome, ReconcileError> {
    assign_missing_ids(&mut candidate.commands);
    if let Some(duplicate) = find_duplicate_id(&candidate.commands) {
        log::debug!("Duplicate id '{}' in edited settings", duplicate);
        return Ok(ReconcileOutcome::DuplicateId(duplicate));
    }

    let secrets_stored = migrate_secrets(vault, &mut candidate.commands)?;

    let kept: HashSet<&str> = candidate.commands.iter().map(|c| c.id.as_str()).collect();
    let mut removed = Vec::new();
    for old in registry.commands.iter().filter(|c| !kept.contains(c.id.as_str())) {
        vault.delete(&old.id);
        removed.push(RemovedCommand {
            alias: old.alias.clone(),
            description: old.description.clone(),
        });
    }

    registry.editors = candidate.editors;
    registry.shell = candidate.shell;
    registry.commands = candidate.commands.into_iter().map(Command::from).collect();

    Ok(ReconcileOutcome::Applied {
        removed,
        secrets_stored,
    })
}

/// Moves inline secrets into the vault. If any write fails, the writes already made are
/// undone (previous values restored, fresh entries deleted) before the error is returned.
fn migrate_secrets(
    vault: &Vault,
    commands: &mut [SettingsCommand],
) -> Result<usize, ReconcileError> {
    let mut written: Vec<(String, Option<String>)> = Vec::new();
    for cmd in commands.iter_mut().filter(|c| !c.secret.is_empty()) {
        let stored = vault
            .previous_value(&cmd.id)
            .and_then(|previous| {
                vault.store(&cmd.id, &cmd.secret)?;
                Ok(previous)
            });
        match stored {
            Ok(previous) => written.push((cmd.id.clone(), previous)),
            Err(source) => {
                roll_back(vault, &written);
                return Err(ReconcileError::Vault {
                    alias: cmd.alias.clone(),
                    source,
                });
            }
        }
        cmd.secret.clear();
    }
    Ok(written.len())
}

fn roll_back(vault: &Vault, written: &[(String, Option<String>)]) {
    for (id, previous) in written.iter().rev() {
        match previous {
            Some(secret) => {
                if let Err(e) = vault.store(id, secret) {
                    log::warn!("Could not restore the secret for command id '{}': {}", id, e);
                }
            }
            None => vault.delete(id),
        }
    }
}

fn assign_missing_ids(commands: &mut [SettingsCommand]) {
    for cmd in commands.iter_mut().filter(|c| c.id.trim().is_empty()) {
        cmd.id = registry_manager::generate_command_id();
        log::debug!("Assigned id '{}' to new command '{}'", cmd.id, cmd.alias);
    }
}

fn find_duplicate_id(commands: &[SettingsCommand]) -> Option<String> {
    let mut seen = HashSet::new();
    commands
        .iter()
        .find(|cmd| !seen.insert(cmd.id.as_str()))
        .map(|cmd| cmd.id.clone())
}
