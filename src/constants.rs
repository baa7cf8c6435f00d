// src/constants.rs

/// The program version printed by `tp -v`.
pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The service name under which all secrets are filed in the OS credential store.
pub const SERVICE_NAME: &str = "tp-secret";

/// The name of the directory holding tp's state (inside the system config dir).
pub const CONFIG_DIR_NAME: &str = "tp";

/// The name of the persisted registry document (inside the config dir).
pub const REGISTRY_FILENAME: &str = "registry.toml";

/// Overrides the config directory. Inherited by the askpass child process.
pub const CONFIG_DIR_ENV: &str = "TP_CONFIG_DIR";

/// Names the password helper program that `ssh`/`scp` should run.
pub const SSH_ASKPASS_ENV: &str = "SSH_ASKPASS";

/// Controls when `ssh` consults the askpass helper.
pub const SSH_ASKPASS_REQUIRE_ENV: &str = "SSH_ASKPASS_REQUIRE";

/// Makes `ssh` always use the askpass helper, even with a terminal attached.
pub const SSH_ASKPASS_REQUIRE_FORCE: &str = "force";

/// Option inserted after `ssh`/`scp` so first connections do not stop at a host-key prompt.
pub const ACCEPT_NEW_HOST_KEY_OPTION: &str = "-oStrictHostKeyChecking=accept-new";
