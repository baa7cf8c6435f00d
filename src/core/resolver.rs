//! # Alias Resolver
//!
//! Matches a user query against the registry. Exact alias matches always win and
//! short-circuit the substring scan; otherwise every alias containing the query is
//! collected. Results are always in registry order.

use crate::models::{Command, Registry};

/// The outcome of resolving a query. Two of the three variants are soft failures
/// that the caller reports to the user, never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// Nothing matched.
    NotFound,
    /// Exactly one command matched (exactly, or as the only substring match).
    Unique(&'a Command),
    /// Several commands matched; the caller must not pick one.
    Ambiguous(Vec<&'a Command>),
}

impl<'a> Resolution<'a> {
    /// Every command behind this resolution, in registry order.
    pub fn matches(&self) -> Vec<&'a Command> {
        match self {
            Resolution::NotFound => Vec::new(),
            Resolution::Unique(cmd) => vec![*cmd],
            Resolution::Ambiguous(cmds) => cmds.clone(),
        }
    }
}

/// Returns the commands matching `query`.
///
/// If any alias equals `query`, only the exact matches are returned (a lone exact
/// match is therefore never drowned out by longer aliases containing it).
/// Otherwise all commands whose alias contains `query` are returned.
pub fn find_commands<'a>(registry: &'a Registry, query: &str) -> Vec<&'a Command> {
    let exact: Vec<&Command> = registry
        .commands
        .iter()
        .filter(|cmd| cmd.alias == query)
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    registry
        .commands
        .iter()
        .filter(|cmd| cmd.alias.contains(query))
        .collect()
}

/// Classifies the matches for `query` into a [`Resolution`].
pub fn resolve<'a>(registry: &'a Registry, query: &str) -> Resolution<'a> {
    let mut found = find_commands(registry, query);
    match found.len() {
        0 => Resolution::NotFound,
        1 => found.pop().map_or(Resolution::NotFound, Resolution::Unique),
        _ => Resolution::Ambiguous(found),
    }
}
