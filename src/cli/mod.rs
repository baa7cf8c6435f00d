use clap::Parser;

pub mod dispatcher;
pub mod handlers;

/// tp: run your shell snippets by alias, with keychain-backed ssh passwords.
///
/// `tp <alias> [args...]` resolves the alias (exact match first, then substring)
/// and runs its scripts joined with `&&`, extra args appended to the last one.
///
/// When tp is started by `ssh` as its askpass helper, it prints the pending secret
/// and exits.
#[derive(Parser, Debug, Default)]
#[command(author, about, long_about = None)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Show program version.
    #[arg(short = 'v')]
    pub show_version: bool,

    /// Edit program settings in an external editor.
    #[arg(short = 's')]
    pub edit_settings: bool,

    /// Print the secret of the command whose id starts with ID_PREFIX.
    #[arg(short = 'p', value_name = "ID_PREFIX")]
    pub secret_prefix: Option<String>,

    /// The alias to run, followed by extra arguments for its last script.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
