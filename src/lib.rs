//! # tp
//!
//! A personal alias runner. Short aliases map to shell scripts; an alias may be
//! guarded by a secret kept in the OS credential store, which tp hands to `ssh`/`scp`
//! by acting as their askpass helper.

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod state;
pub mod system;
