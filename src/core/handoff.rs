//! # Credential Handoff
//!
//! Lets an `ssh`/`scp` child get its password from the vault without the secret ever
//! reaching argv, the environment, or disk.
//!
//! Two separate `tp` processes cooperate through the registry's
//! `pending_secret_requests` queue:
//!
//! 1. **Idle -> Requested**: before launching a guarded command, the runner enqueues the
//!    command id, persists the registry, and points `SSH_ASKPASS` at its own executable
//!    with `SSH_ASKPASS_REQUIRE=force`.
//! 2. **Requested -> Served**: `ssh` runs `tp` as its askpass helper. That invocation sees
//!    a non-empty queue, pops the front id, prints the secret to stdout and persists the
//!    shorter queue.
//! 3. **Served -> Idle**: implicit once the queue is drained. Requests nobody asked for
//!    (e.g. key authentication succeeded) are withdrawn by the runner after the child exits.

use crate::constants::{SSH_ASKPASS_ENV, SSH_ASKPASS_REQUIRE_ENV, SSH_ASKPASS_REQUIRE_FORCE};
use crate::core::registry_manager::RegistryError;
use crate::core::vault::{Vault, VaultError};
use crate::models::Registry;
use crate::state::RegistryStore;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

/// Failures while serving a pending request.
#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("Could not persist the handoff queue: {0}")]
    Registry(#[from] RegistryError),
    #[error("Could not hand the secret to the caller: {0}")]
    Output(#[from] io::Error),
}

/// The protocol state as seen by a fresh process, derived from the persisted queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffState {
    /// No request is waiting.
    Idle,
    /// A request for the given command id is next in line.
    Requested { id: String },
}

/// What a serve attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeOutcome {
    /// The queue was empty; nothing was popped.
    Idle,
    /// The secret for `id` was written out.
    Served { id: String },
    /// `id` was popped but had no usable secret; nothing was written.
    Unserved { id: String },
}

/// Reads the protocol state from the registry.
pub fn state(registry: &Registry) -> HandoffState {
    match registry.pending_secret_requests.front() {
        Some(id) => HandoffState::Requested { id: id.clone() },
        None => HandoffState::Idle,
    }
}

/// Queues a secret request for `id`. The caller persists the registry before spawning.
pub fn request(registry: &mut Registry, id: &str) {
    log::debug!("Queueing secret request for command id '{}'", id);
    registry.pending_secret_requests.push_back(id.to_string());
}

/// Removes every still-pending request for `id`, keeping the others in order.
/// Returns how many were withdrawn.
pub fn withdraw(registry: &mut Registry, id: &str) -> usize {
    let before = registry.pending_secret_requests.len();
    registry.pending_secret_requests.retain(|pending| pending != id);
    let withdrawn = before - registry.pending_secret_requests.len();
    if withdrawn > 0 {
        log::debug!("Withdrew {} unserved request(s) for command id '{}'", withdrawn, id);
    }
    withdrawn
}

/// Environment for a child that should call back into `askpass_program` for its password.
pub fn askpass_env(askpass_program: &Path) -> Vec<(String, OsString)> {
    vec![
        (SSH_ASKPASS_ENV.to_string(), askpass_program.as_os_str().to_os_string()),
        (
            SSH_ASKPASS_REQUIRE_ENV.to_string(),
            OsString::from(SSH_ASKPASS_REQUIRE_FORCE),
        ),
    ]
}

/// Serves the oldest pending request: pops it, writes the secret (if any) followed by a
/// newline to `out`, then persists the shortened queue.
///
/// A missing command, missing secret or unreachable store writes nothing, so `ssh`
/// is left to its own devices. Only persistence and output failures are errors.
pub fn serve(
    store: &mut RegistryStore,
    vault: &Vault,
    out: &mut dyn Write,
) -> Result<ServeOutcome, HandoffError> {
    let Some(id) = store.registry_mut().pending_secret_requests.pop_front() else {
        return Ok(ServeOutcome::Idle);
    };

    let secret = if store.registry().command_by_id(&id).is_some() {
        match vault.retrieve(&id) {
            Ok(secret) => Some(secret),
            Err(VaultError::NotFound) => {
                log::debug!("No secret stored for pending command id '{}'", id);
                None
            }
            Err(e) => {
                log::warn!("Could not read secret for pending command id '{}': {}", id, e);
                None
            }
        }
    } else {
        log::warn!("Pending request for unknown command id '{}' dropped", id);
        None
    };

    let outcome = match secret {
        Some(secret) => {
            writeln!(out, "{}", secret)?;
            out.flush()?;
            ServeOutcome::Served { id }
        }
        None => ServeOutcome::Unserved { id },
    };

    store.save()?;
    Ok(outcome)
}
