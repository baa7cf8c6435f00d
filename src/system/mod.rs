//! # System Interaction Layer
//!
//! Boundary between tp's logic and the operating system's process facilities.
//!
//! ## Modules
//!
//! - **`executor`**: Builds shell invocations from the configured `shell` setting and
//!   runs them with the terminal's stdio attached.
//! - **`editor`**: Finds the first available editor from the configured candidates and
//!   lets the user edit a scratch copy of the settings document.

pub mod editor;
pub mod executor;
