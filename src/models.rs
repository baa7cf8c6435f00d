// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// --- PERSISTED MODELS (registry.toml) ---

/// A named, persisted unit of work bound to an alias.
///
/// `id` is assigned once and is the only key used to address the command's secret,
/// so `alias` and `description` can change freely.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: String,
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scripts: Vec<String>,
}

/// The single persisted document: global settings, the handoff queue and all commands.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    /// Candidate editor programs, tried in order.
    #[serde(default = "default_editors")]
    pub editors: Vec<String>,
    /// Shell invocation prefix, e.g. `bash -c`. The composed line is appended as the last argument.
    #[serde(default = "default_shell")]
    pub shell: String,
    /// FIFO of command ids waiting for an askpass invocation to pick up their secret.
    #[serde(default)]
    pub pending_secret_requests: VecDeque<String>,
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Default for Registry {
    /// The registry written on first run.
    fn default() -> Self {
        Self {
            editors: default_editors(),
            shell: default_shell(),
            pending_secret_requests: VecDeque::new(),
            commands: vec![Command {
                id: "ping-test".to_string(),
                alias: "ping".to_string(),
                description: "Send ping localhost".to_string(),
                scripts: vec!["ping localhost".to_string()],
            }],
        }
    }
}

impl Registry {
    /// Finds a command by its exact identifier.
    pub fn command_by_id(&self, id: &str) -> Option<&Command> {
        self.commands.iter().find(|cmd| cmd.id == id)
    }
}

fn default_editors() -> Vec<String> {
    let mut editors: Vec<String> = ["micro", "vim", "nano"].iter().map(|e| e.to_string()).collect();
    if cfg!(target_os = "windows") {
        editors.push("notepad".to_string());
    }
    editors
}

fn default_shell() -> String {
    if cfg!(target_os = "windows") {
        "cmd /C".to_string()
    } else {
        "bash -c".to_string()
    }
}

// --- SETTINGS DOCUMENT MODELS (what the user edits with `tp -s`) ---

/// The editable view of the registry. The handoff queue is internal and never shown.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SettingsDocument {
    #[serde(default = "default_editors")]
    pub editors: Vec<String>,
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default)]
    pub commands: Vec<SettingsCommand>,
}

/// A command as it appears in the settings document.
///
/// `id` may be left empty for new entries. `secret` is an input-only slot: a non-empty
/// value is moved into the credential store and never written back to disk.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct SettingsCommand {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scripts: Vec<String>,
    #[serde(default)]
    pub secret: String,
}

// --- Conversions ---

impl From<&Registry> for SettingsDocument {
    fn from(registry: &Registry) -> Self {
        Self {
            editors: registry.editors.clone(),
            shell: registry.shell.clone(),
            commands: registry.commands.iter().map(SettingsCommand::from).collect(),
        }
    }
}

impl From<&Command> for SettingsCommand {
    fn from(cmd: &Command) -> Self {
        Self {
            id: cmd.id.clone(),
            alias: cmd.alias.clone(),
            description: cmd.description.clone(),
            scripts: cmd.scripts.clone(),
            secret: String::new(),
        }
    }
}

// The secret slot is dropped here; it must already be in the vault.
impl From<SettingsCommand> for Command {
    fn from(cmd: SettingsCommand) -> Self {
        Self {
            id: cmd.id,
            alias: cmd.alias,
            description: cmd.description,
            scripts: cmd.scripts,
        }
    }
}
