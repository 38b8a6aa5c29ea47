//! Default keybindings shipped with the engine
//!
//! The seed table lives in `keymap.yaml`, embedded at compile time, with
//! a hardcoded fallback in case the embedded table fails to parse.

use crate::binding::{BindingSource, Keybinding};
use crate::config::parse_keymap_yaml;
use crate::registry::KeymapEngine;

/// Default keymap YAML embedded at compile time
const DEFAULT_KEYMAP_YAML: &str = include_str!("../keymap.yaml");

/// Hardcoded fallback table, kept to the essentials
pub fn default_bindings() -> Vec<Keybinding> {
    vec![
        Keybinding::new("Mod+z", "undo").when("historyCanUndo"),
        Keybinding::new("Mod+Shift+z", "redo").when("historyCanRedo"),
        Keybinding::new("Mod+b", "toggleBold").when("editorFocused && !readonly"),
        Keybinding::new("Mod+i", "toggleItalic").when("editorFocused && !readonly"),
        Keybinding::new("Enter", "splitBlock").when("editorFocused && !modalActive"),
        Keybinding::new("Backspace", "deleteSelection").when("editorFocused && hasSelection"),
        Keybinding::new("Backspace", "joinBackward").when("editorFocused && !hasSelection"),
        Keybinding::new("Mod+a", "selectAll").when("editorFocused"),
    ]
}

/// Load the embedded default table, falling back to the hardcoded
/// bindings if it fails to parse.
pub fn load_default_bindings() -> Vec<Keybinding> {
    match parse_keymap_yaml(DEFAULT_KEYMAP_YAML) {
        Ok(bindings) => {
            tracing::info!("loaded embedded default keymap ({} bindings)", bindings.len());
            bindings
        }
        Err(e) => {
            tracing::warn!("failed to parse embedded keymap: {}, using hardcoded defaults", e);
            default_bindings()
        }
    }
}

/// Register the default table under the core source.
pub fn install_default_bindings(engine: &mut KeymapEngine) {
    let mut scope = engine.scoped_source(BindingSource::Core);
    for binding in load_default_bindings() {
        scope.register(binding);
    }
}
