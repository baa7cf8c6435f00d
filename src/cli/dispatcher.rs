use anyhow::Result;

use crate::{
    cli::{Cli, handlers},
    core::{handoff, vault::Vault},
    models::Registry,
    state::RegistryStore,
};

/// What a single invocation of tp is going to do. Exactly one mode runs per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// `-v`
    Version,
    /// `-s`
    EditSettings,
    /// `-p <prefix>`
    RevealSecret(String),
    /// No flags and a pending handoff request: we were started as ssh's askpass helper.
    ServePendingSecret,
    /// `<alias> [args...]`
    Run { query: String, args: Vec<String> },
    /// No flags, no pending request, no alias.
    NoArguments,
}

/// Picks the mode. Flags come first; then a pending request in the registry means this
/// process is the askpass callback (ssh passes its prompt text as an argument, which is
/// ignored); only then are positional arguments treated as an alias.
pub fn select_mode(cli: Cli, registry: &Registry) -> Mode {
    if cli.show_version {
        return Mode::Version;
    }
    if cli.edit_settings {
        return Mode::EditSettings;
    }
    if let Some(prefix) = cli.secret_prefix {
        return Mode::RevealSecret(prefix);
    }
    if let handoff::HandoffState::Requested { .. } = handoff::state(registry) {
        return Mode::ServePendingSecret;
    }

    let mut args = cli.args.into_iter();
    match args.next() {
        Some(query) => Mode::Run {
            query,
            args: args.collect(),
        },
        None => Mode::NoArguments,
    }
}

/// The main application dispatcher. Returns the process exit code for soft outcomes
/// and child failures; hard failures come back as `Err`.
pub fn dispatch(cli: Cli, store: &mut RegistryStore, vault: &Vault) -> Result<i32> {
    let mode = select_mode(cli, store.registry());
    log::debug!("Dispatching mode: {:?}", mode);

    match mode {
        Mode::Version => handlers::version::handle().map(|_| 0),
        Mode::EditSettings => handlers::settings::handle(store, vault).map(|_| 0),
        Mode::RevealSecret(prefix) => handlers::secret::handle(&prefix, store.registry(), vault).map(|_| 0),
        Mode::ServePendingSecret => handlers::askpass::handle(store, vault).map(|_| 0),
        Mode::Run { query, args } => handlers::run::handle(&query, &args, store, vault),
        Mode::NoArguments => {
            println!("No arguments. Try `tp <alias>` or `tp --help`.");
            Ok(0)
        }
    }
}
