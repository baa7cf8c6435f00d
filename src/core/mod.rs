// src/core/mod.rs

pub mod handoff;
pub mod paths;
pub mod reconciler;
pub mod registry_manager;
pub mod resolver;
pub mod task_executor;
pub mod vault;
