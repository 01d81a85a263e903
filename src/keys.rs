//! Key namespaces
//!
//! Every collaborator prefixes its keys with one of these namespaces. The cache
//! itself treats keys as opaque strings and does not enforce the convention.

use std::fmt;

/// Logical key prefixes shared by all cache consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyNamespace {
    Portfolio,
    Ai,
    Analytics,
    Github,
    Template,
}

impl KeyNamespace {
    /// All namespaces, in declaration order.
    pub const ALL: [KeyNamespace; 5] = [
        KeyNamespace::Portfolio,
        KeyNamespace::Ai,
        KeyNamespace::Analytics,
        KeyNamespace::Github,
        KeyNamespace::Template,
    ];

    /// The raw prefix, including the trailing `:`.
    pub fn prefix(&self) -> &'static str {
        match self {
            KeyNamespace::Portfolio => "portfolio:",
            KeyNamespace::Ai => "ai:",
            KeyNamespace::Analytics => "analytics:",
            KeyNamespace::Github => "github:",
            KeyNamespace::Template => "template:",
        }
    }

    /// Builds a namespaced key, e.g. `portfolio:42`.
    pub fn key(&self, id: impl fmt::Display) -> String {
        format!("{}{}", self.prefix(), id)
    }

    /// Glob pattern matching every key in the namespace, for `clear_pattern`.
    pub fn pattern(&self) -> String {
        format!("{}*", self.prefix())
    }

    /// Prefix without the trailing separator, usable as a memoize key prefix.
    pub fn name(&self) -> &'static str {
        self.prefix().trim_end_matches(':')
    }
}

impl fmt::Display for KeyNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}
