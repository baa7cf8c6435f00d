use crate::{
    core::{
        handoff::{self, ServeOutcome},
        vault::Vault,
    },
    state::RegistryStore,
};
use anyhow::{Context, Result};
use std::io;

/// Answers an askpass callback from `ssh`/`scp`: the secret goes to stdout and nothing else does.
pub fn handle(store: &mut RegistryStore, vault: &Vault) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let outcome =
        handoff::serve(store, vault, &mut out).context("Failed to serve the pending secret")?;

    match outcome {
        ServeOutcome::Served { id } => log::debug!("Served secret for command id '{}'", id),
        ServeOutcome::Unserved { id } => log::debug!("Nothing to serve for command id '{}'", id),
        ServeOutcome::Idle => log::debug!("No pending secret request"),
    }
    Ok(())
}
