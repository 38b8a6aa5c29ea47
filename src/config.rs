//! YAML parsing for binding seed tables
//!
//! Parses a `bindings:` list into `Keybinding` records ready for
//! registration.

use std::str::FromStr;

use serde::Deserialize;

use crate::binding::{BindingSource, Keybinding};
use crate::key::normalize_key;

/// Root structure of a keymap YAML document
#[derive(Debug, Deserialize)]
pub struct KeymapConfig {
    pub bindings: Vec<BindingConfig>,
}

/// A single binding entry from YAML
#[derive(Debug, Deserialize)]
pub struct BindingConfig {
    pub key: String,
    pub command: String,
    #[serde(default)]
    pub args: Option<serde_json::Value>,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Parse keybindings from a YAML string
pub fn parse_keymap_yaml(yaml: &str) -> Result<Vec<Keybinding>, KeymapError> {
    let config: KeymapConfig =
        serde_yaml::from_str(yaml).map_err(|e| KeymapError::ParseError(e.to_string()))?;

    let mut bindings = Vec::with_capacity(config.bindings.len());
    for entry in config.bindings {
        if normalize_key(&entry.key).is_empty() {
            return Err(KeymapError::InvalidKey(entry.key));
        }
        if entry.command.trim().is_empty() {
            return Err(KeymapError::InvalidCommand(entry.command));
        }
        let source = match entry.source {
            Some(ref name) => Some(
                BindingSource::from_str(name)
                    .map_err(|_| KeymapError::InvalidSource(name.clone()))?,
            ),
            None => None,
        };

        let mut binding = Keybinding::new(entry.key, entry.command);
        if let Some(args) = entry.args {
            binding = binding.args(args);
        }
        if let Some(when) = entry.when {
            binding = binding.when(when);
        }
        if let Some(source) = source {
            binding = binding.source(source);
        }
        bindings.push(binding);
    }

    Ok(bindings)
}

/// Errors that can occur when parsing a keymap document
#[derive(Debug, Clone)]
pub enum KeymapError {
    ParseError(String),
    InvalidKey(String),
    InvalidCommand(String),
    InvalidSource(String),
}

impl std::fmt::Display for KeymapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeymapError::ParseError(e) => write!(f, "Parse error: {}", e),
            KeymapError::InvalidKey(k) => write!(f, "Invalid key: {}", k),
            KeymapError::InvalidCommand(c) => write!(f, "Invalid command: {}", c),
            KeymapError::InvalidSource(s) => write!(f, "Invalid source: {}", s),
        }
    }
}

impl std::error::Error for KeymapError {}
