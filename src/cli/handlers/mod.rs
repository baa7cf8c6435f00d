// src/cli/handlers/mod.rs

// One module per dispatcher mode.

pub mod askpass;
pub mod run;
pub mod secret;
pub mod settings;
pub mod version;
