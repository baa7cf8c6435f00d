//! # Handler for `tp -s`
//!
//! Opens the settings in an editor and reconciles the result. The registry is only
//! written when the whole edit was accepted.

use crate::{
    core::{
        reconciler::{self, ReconcileOutcome},
        vault::Vault,
    },
    state::RegistryStore,
    system::editor::ExternalEditor,
};
use anyhow::{Context, Result};
use colored::*;

/// The main handler for settings editing.
pub fn handle(store: &mut RegistryStore, vault: &Vault) -> Result<()> {
    let editor = ExternalEditor::new(store.registry().editors.clone());
    let outcome = reconciler::reconcile(store.registry_mut(), vault, &editor)?;

    match outcome {
        ReconcileOutcome::DuplicateId(id) => {
            println!("{}", "Duplicated ID (Settings Ignored)".yellow().bold());
            println!("- {}", id);
        }
        ReconcileOutcome::Applied {
            removed,
            secrets_stored,
        } => {
            for cmd in &removed {
                if cmd.description.is_empty() {
                    println!("{} {}", "Remove".red(), cmd.alias);
                } else {
                    println!("{} {} - {}", "Remove".red(), cmd.alias, cmd.description);
                }
            }
            if secrets_stored > 0 {
                println!("Stored {} secret(s) in the OS keychain.", secrets_stored);
            }

            let changed = store.needs_saving();
            store.save().with_context(|| {
                format!("Failed to save settings to '{}'", store.path().display())
            })?;
            if changed {
                println!("{} Settings saved.", "✔".green());
            } else {
                println!("Settings unchanged.");
            }
        }
    }
    Ok(())
}
