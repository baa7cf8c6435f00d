// src/bin/tp.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use tp::{
    cli::{Cli, dispatcher},
    core::{paths, vault::Vault},
    state::RegistryStore,
};

/// The main entry point of the `tp` application.
/// It sets up logging, loads the registry, dispatches to exactly one mode,
/// and performs centralized error handling.
fn main() {
    env_logger::init();

    match run_cli(Cli::parse()) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // For all errors, print a formatted message to stderr and exit with a failure code.
            eprintln!("\n{}: {:#}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run_cli(cli: Cli) -> Result<i32> {
    log::debug!("CLI args parsed: {:?}", cli);

    let registry_path = paths::get_registry_path()?;
    let mut store = RegistryStore::open(&registry_path)
        .with_context(|| format!("Failed to load '{}'", registry_path.display()))?;
    let vault = Vault::keyring();

    dispatcher::dispatch(cli, &mut store, &vault)
}
