//! Context-aware keybinding resolution for rich-text editors
//!
//! This crate resolves physical key chords to editor commands through a
//! layered registry (built-in, extension-contributed, user-defined) and
//! gates each binding on a small boolean expression language ("when
//! clauses") evaluated against a live context map.
//!
//! # Architecture
//!
//! ```text
//! key event → normalize_key() → KeymapEngine::resolve() → [ResolvedCommand]
//!                                     │
//!                      when clause → evaluate() against Context
//! ```
//!
//! # Resolving a chord
//!
//! ```ignore
//! let mut engine = KeymapEngine::new();
//! install_default_bindings(&mut engine);
//!
//! let mut ctx = Context::new();
//! ctx.set("editorFocused", true);
//! ctx.set("historyCanUndo", true);
//!
//! for candidate in engine.resolve("Ctrl+z", Some(&ctx)) {
//!     // execute the first candidate the host accepts
//! }
//! ```

mod binding;
mod config;
mod context;
mod defaults;
mod eval;
mod key;
mod registry;
mod tokenizer;

pub use binding::{BindingSource, Keybinding, ResolvedCommand, StoredBinding};
pub use config::{parse_keymap_yaml, BindingConfig, KeymapConfig, KeymapError};
pub use context::{Context, ContextProvider, ContextValue};
pub use defaults::{default_bindings, install_default_bindings, load_default_bindings};
pub use eval::evaluate;
pub use key::{display_key, expand_mod_key, keys_match, normalize_key};
pub use registry::{KeymapEngine, SourceScope};
pub use tokenizer::{tokenize, Token};
