//! # Handler for `tp <alias> [args...]`
//!
//! Resolves the alias, shows what matched, and runs the single match under the
//! configured shell. Not found, ambiguous and empty commands are reported and end
//! the run with exit code 0 and no side effects.

use crate::{
    core::{
        resolver::{self, Resolution},
        task_executor::{self, ExecutionContext},
        vault::Vault,
    },
    models::Command,
    state::RegistryStore,
    system::executor::SystemRunner,
};
use anyhow::Result;
use colored::*;
use dialoguer::console::measure_text_width;
use std::{env, path::PathBuf};

/// Main entry point for running an alias. Returns the exit code tp should end with.
pub fn handle(
    query: &str,
    extra_args: &[String],
    store: &mut RegistryStore,
    vault: &Vault,
) -> Result<i32> {
    let runner = SystemRunner;
    let ctx = ExecutionContext {
        vault,
        runner: &runner,
        askpass_program: own_executable(),
    };
    run_alias(query, extra_args, store, &ctx)
}

/// Resolves `query` and runs the single match with the given execution context.
fn run_alias(
    query: &str,
    extra_args: &[String],
    store: &mut RegistryStore,
    ctx: &ExecutionContext<'_>,
) -> Result<i32> {
    let resolution = resolver::resolve(store.registry(), query);
    print_matches(&resolution.matches());

    let command = match resolution {
        Resolution::NotFound => {
            println!("{}", "Command not found".yellow());
            return Ok(0);
        }
        Resolution::Ambiguous(_) => {
            println!("{}", "Multiple commands found".yellow());
            return Ok(0);
        }
        Resolution::Unique(cmd) => cmd.clone(),
    };
    log::debug!("Resolved '{}' to command id '{}'", query, command.id);

    if command.scripts.iter().all(|s| s.trim().is_empty()) {
        println!("{}", "No scripts".yellow());
        return Ok(0);
    }

    let exit = task_executor::execute_command(store, ctx, &command, extra_args)?;
    Ok(exit.exit_code())
}

/// Prints each match as `[alias] description` followed by its scripts.
fn print_matches(matches: &[&Command]) {
    let max_len = matches
        .iter()
        .map(|cmd| measure_text_width(&format!("[{}]", cmd.alias)))
        .max()
        .unwrap_or(0);

    for cmd in matches {
        let label_raw = format!("[{}]", cmd.alias);
        let padding = " ".repeat(max_len.saturating_sub(measure_text_width(&label_raw)));
        println!("{}{} {}", label_raw.cyan().bold(), padding, cmd.description);
        for script in &cmd.scripts {
            println!("  {}", format!("$ {}", script).dimmed());
        }
        println!();
    }
}

/// The path `ssh` should call back into. Symlinks and `\\?\` prefixes are resolved away.
fn own_executable() -> Option<PathBuf> {
    let exe = match env::current_exe() {
        Ok(path) => path,
        Err(e) => {
            log::warn!("Could not determine own executable: {}", e);
            return None;
        }
    };
    Some(dunce::canonicalize(&exe).unwrap_or(exe))
}
