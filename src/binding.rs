//! Binding records: what a host registers and what the store keeps

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::key::{display_key, normalize_key};

/// Provenance tier of a binding, the primary resolution tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingSource {
    /// Built-in default
    Core,
    /// Contributed by an extension
    Extension,
    /// Explicitly configured by the user
    User,
}

impl BindingSource {
    /// Sort weight: user-configured bindings outrank extension ones,
    /// which outrank built-ins.
    pub(crate) fn priority(self) -> u8 {
        match self {
            BindingSource::User => 3,
            BindingSource::Extension => 2,
            BindingSource::Core => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BindingSource::Core => "core",
            BindingSource::Extension => "extension",
            BindingSource::User => "user",
        }
    }
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "core" => Ok(BindingSource::Core),
            "extension" => Ok(BindingSource::Extension),
            "user" => Ok(BindingSource::User),
            _ => Err(()),
        }
    }
}

/// A keybinding as a host registers it: a chord string, a command name,
/// optional command arguments, an optional when clause and an optional
/// provenance tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Keybinding {
    pub key: String,
    pub command: String,
    pub args: Option<Value>,
    pub when: Option<String>,
    pub source: Option<BindingSource>,
}

impl Keybinding {
    pub fn new(key: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            command: command.into(),
            args: None,
            when: None,
            source: None,
        }
    }

    /// Attach a when clause (builder pattern)
    pub fn when(mut self, clause: impl Into<String>) -> Self {
        self.when = Some(clause.into());
        self
    }

    /// Attach command arguments
    pub fn args(mut self, args: Value) -> Self {
        self.args = Some(args);
        self
    }

    /// Tag the binding with an explicit provenance
    pub fn source(mut self, source: BindingSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Get display string for this binding's chord
    pub fn display_string(&self) -> String {
        display_key(&normalize_key(&self.key))
    }
}

/// A binding as the store keeps it: the registration record plus its
/// normalized chord, resolved provenance and registration id. The id is
/// assigned once, strictly increases across registrations and is the
/// sole recency signal.
#[derive(Debug, Clone)]
pub struct StoredBinding {
    pub binding: Keybinding,
    pub normalized_key: String,
    pub source: BindingSource,
    pub id: u64,
    /// Platform equivalence class of `normalized_key`, precomputed at
    /// registration so resolution stays allocation-light per key event
    pub(crate) expansions: Vec<String>,
}

/// One entry of a resolution result, in execution-precedence order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCommand {
    pub command: String,
    pub args: Option<Value>,
}
