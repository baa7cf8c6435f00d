use crate::{
    constants::ACCEPT_NEW_HOST_KEY_OPTION,
    core::{handoff, vault::Vault},
    models::Command,
    state::RegistryStore,
    system::executor::{ChildExit, ProcessRunner, ShellInvocation},
};
use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::PathBuf;

lazy_static! {
    /// A fragment whose first word is exactly `ssh` or `scp`.
    static ref CREDENTIAL_PROGRAM: Regex =
        Regex::new(r"^(\s*)(ssh|scp)(\s+|$)").expect("credential program pattern is valid");
}

/// The shell line for a command, plus how many fragments may prompt for a password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub line: String,
    pub credential_fragments: usize,
}

/// Everything the executor needs from the outside world.
pub struct ExecutionContext<'a> {
    pub vault: &'a Vault,
    pub runner: &'a dyn ProcessRunner,
    /// The program `ssh` should call back for passwords; normally tp's own executable.
    /// `None` disables the handoff and leaves `ssh` to prompt on the terminal.
    pub askpass_program: Option<PathBuf>,
}

impl std::fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("vault", &self.vault)
            .field("askpass_program", &self.askpass_program)
            .finish_non_exhaustive()
    }
}

/// Whether a script fragment invokes `ssh` or `scp`.
pub fn is_credential_fragment(fragment: &str) -> bool {
    CREDENTIAL_PROGRAM.is_match(fragment)
}

/// Inserts the accept-new host key option right after `ssh`/`scp`. Other fragments pass through.
pub fn rewrite_fragment(fragment: &str) -> String {
    let replacement = format!("${{1}}${{2}} {}${{3}}", ACCEPT_NEW_HOST_KEY_OPTION);
    CREDENTIAL_PROGRAM
        .replace(fragment, replacement.as_str())
        .into_owned()
}

/// Builds the shell line: fragments joined with `&&`, `extra_args` appended raw to the last one.
pub fn plan_command(command: &Command, extra_args: &[String]) -> ExecutionPlan {
    let fragments: Vec<&str> = command
        .scripts
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    let mut credential_fragments = 0;
    let mut rendered: Vec<String> = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        if is_credential_fragment(fragment) {
            credential_fragments += 1;
            rendered.push(rewrite_fragment(fragment));
        } else {
            rendered.push(fragment.to_string());
        }
    }

    if !extra_args.is_empty() {
        if let Some(last) = rendered.last_mut() {
            last.push(' ');
            last.push_str(&extra_args.join(" "));
        }
    }

    ExecutionPlan {
        line: rendered.join(" && "),
        credential_fragments,
    }
}

/// Runs `command` under the configured shell and returns how the child ended.
///
/// When the plan contains `ssh`/`scp` fragments and the vault holds a secret for the
/// command, one handoff request per fragment is queued and persisted before the child
/// starts. Requests the child never consumed are withdrawn once it exits.
pub fn execute_command(
    store: &mut RegistryStore,
    ctx: &ExecutionContext<'_>,
    command: &Command,
    extra_args: &[String],
) -> Result<ChildExit> {
    let plan = plan_command(command, extra_args);
    log::debug!(
        "Planned '{}' with {} credential fragment(s)",
        command.alias,
        plan.credential_fragments
    );

    let mut invocation = ShellInvocation::new(&store.registry().shell, &plan.line)
        .with_context(|| format!("Invalid shell setting '{}'", store.registry().shell))?;

    let armed = arm_handoff(store, ctx, command, &plan)?;
    if let Some(program) = &armed {
        invocation = invocation.with_env(handoff::askpass_env(program));
    }

    let outcome = if armed.is_some() {
        // Withdraw on every way out of the run, including a failed spawn.
        let _withdrawal = scopeguard::guard(&mut *store, |store| {
            if let Err(e) = withdraw_unserved(store, &command.id) {
                log::warn!("Could not clean up pending secret requests: {:#}", e);
            }
        });
        ctx.runner.run(&invocation)
    } else {
        ctx.runner.run(&invocation)
    };
    let exit = outcome?;
    Ok(exit)
}

fn arm_handoff(
    store: &mut RegistryStore,
    ctx: &ExecutionContext<'_>,
    command: &Command,
    plan: &ExecutionPlan,
) -> Result<Option<PathBuf>> {
    if plan.credential_fragments == 0 {
        return Ok(None);
    }
    let Some(program) = &ctx.askpass_program else {
        log::warn!("Own executable path unknown; ssh will prompt for the password itself.");
        return Ok(None);
    };
    if !ctx.vault.contains(&command.id) {
        log::debug!("No secret for '{}'; not arming the askpass handoff.", command.alias);
        return Ok(None);
    }

    for _ in 0..plan.credential_fragments {
        handoff::request(store.registry_mut(), &command.id);
    }
    store
        .save()
        .context("Failed to persist the pending secret request")?;
    Ok(Some(program.clone()))
}

fn withdraw_unserved(store: &mut RegistryStore, id: &str) -> Result<()> {
    store.reload()?;
    handoff::withdraw(store.registry_mut(), id);
    store.save()?;
    Ok(())
}
