use crate::{
    core::vault::{Vault, VaultError},
    models::{Command, Registry},
};
use anyhow::{Context, Result, anyhow};
use colored::*;

/// Prints the secret of the command whose id starts with `prefix`.
///
/// No match, an empty prefix or an ambiguous prefix is fatal. A matched command
/// without a secret gets a notice on stderr and nothing on stdout.
pub fn handle(prefix: &str, registry: &Registry, vault: &Vault) -> Result<()> {
    let cmd = find_by_id_prefix(registry, prefix)?;

    match vault.retrieve(&cmd.id) {
        Ok(secret) => println!("{}", secret),
        Err(VaultError::NotFound) => {
            eprintln!("{}", format!("No secret stored for '{}'.", cmd.alias).yellow());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Could not read the secret for '{}'", cmd.alias));
        }
    }
    Ok(())
}

/// Finds the single command whose id starts with `prefix`.
pub fn find_by_id_prefix<'a>(registry: &'a Registry, prefix: &str) -> Result<&'a Command> {
    if prefix.is_empty() {
        return Err(anyhow!("An id prefix is required."));
    }
    let found: Vec<&Command> = registry
        .commands
        .iter()
        .filter(|cmd| cmd.id.starts_with(prefix))
        .collect();

    match found.as_slice() {
        [] => Err(anyhow!("Cannot find a command whose id starts with '{}'.", prefix)),
        [cmd] => Ok(*cmd),
        many => {
            let aliases: Vec<&str> = many.iter().map(|c| c.alias.as_str()).collect();
            Err(anyhow!(
                "Id prefix '{}' matches several commands ({}). Use a longer prefix.",
                prefix,
                aliases.join(", ")
            ))
        }
    }
}
