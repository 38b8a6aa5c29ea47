//! Binding store and resolver
//!
//! One `KeymapEngine` per editor session. Registration appends to a
//! monotonically id-tagged store; resolution filters by chord
//! equivalence and when-clause truth, then orders survivors by
//! provenance and recency. Everything is synchronous and never errors
//! out of the public surface.

use std::ops::{Deref, DerefMut};

use crate::binding::{BindingSource, Keybinding, ResolvedCommand, StoredBinding};
use crate::context::{Context, ContextProvider};
use crate::eval::evaluate;
use crate::key::{display_key, expand_mod_key, normalize_key};

/// The engine: layered binding registry plus chord resolver.
#[derive(Default)]
pub struct KeymapEngine {
    bindings: Vec<StoredBinding>,
    next_id: u64,
    current_source: Option<BindingSource>,
    context_provider: Option<Box<dyn ContextProvider>>,
}

impl KeymapEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding.
    ///
    /// The effective provenance is the active source scope if one is
    /// set, else the binding's own `source` field, else `User`. A
    /// binding whose explicit source contradicts the active scope is
    /// overridden to the scope's source with a warning; registration
    /// itself always succeeds.
    pub fn register(&mut self, binding: Keybinding) {
        let source = match (self.current_source, binding.source) {
            (Some(scope), Some(explicit)) if scope != explicit => {
                tracing::warn!(
                    "binding {} -> {} declares source '{}' inside a '{}' scope; scope wins",
                    binding.key,
                    binding.command,
                    explicit,
                    scope
                );
                scope
            }
            (Some(scope), _) => scope,
            (None, Some(explicit)) => explicit,
            (None, None) => BindingSource::User,
        };

        let normalized_key = normalize_key(&binding.key);
        if normalized_key.is_empty() {
            tracing::warn!("ignoring binding for command {} with empty key", binding.command);
            return;
        }

        let id = self.next_id;
        self.next_id += 1;
        tracing::debug!(
            "registered {} -> {} (source {}, id {})",
            normalized_key,
            binding.command,
            source,
            id
        );
        self.bindings.push(StoredBinding {
            expansions: expand_mod_key(&normalized_key),
            normalized_key,
            source,
            id,
            binding,
        });
    }

    /// Remove bindings matching key and command, and source when given.
    /// Key comparison is by exact normalized chord, so removing
    /// `Ctrl+s` leaves a generic `Mod+s` binding in place.
    pub fn unregister(&mut self, key: &str, command: &str, source: Option<BindingSource>) {
        let normalized = normalize_key(key);
        self.bindings.retain(|stored| {
            !(stored.normalized_key == normalized
                && stored.binding.command == command
                && source.is_none_or(|s| s == stored.source))
        });
    }

    /// Remove every binding, or only those from one source.
    pub fn clear(&mut self, source: Option<BindingSource>) {
        match source {
            Some(s) => self.bindings.retain(|stored| stored.source != s),
            None => self.bindings.clear(),
        }
    }

    /// Resolve a raw chord to its candidate commands, highest precedence
    /// first.
    ///
    /// Context comes from the explicit argument when given, else from
    /// the registered provider (polled once), else an empty map. An
    /// unmatched chord yields an empty list; a binding whose when clause
    /// is malformed is excluded without disturbing the others.
    pub fn resolve(&self, raw_key: &str, context: Option<&Context>) -> Vec<ResolvedCommand> {
        let incoming = expand_mod_key(&normalize_key(raw_key));

        let snapshot;
        let effective: &Context = match context {
            Some(ctx) => ctx,
            None => {
                snapshot = self
                    .context_provider
                    .as_ref()
                    .map(|provider| provider.context())
                    .unwrap_or_default();
                &snapshot
            }
        };

        // candidates are collected before any when clause runs; one
        // resolve call sees one consistent view of the store
        let mut survivors: Vec<&StoredBinding> = self
            .bindings
            .iter()
            .filter(|stored| {
                stored
                    .expansions
                    .iter()
                    .any(|variant| incoming.contains(variant))
            })
            .filter(|stored| match &stored.binding.when {
                Some(clause) => evaluate(clause, effective),
                None => true,
            })
            .collect();

        survivors.sort_by(|a, b| {
            b.source
                .priority()
                .cmp(&a.source.priority())
                .then(b.id.cmp(&a.id))
        });

        survivors
            .into_iter()
            .map(|stored| ResolvedCommand {
                command: stored.binding.command.clone(),
                args: stored.binding.args.clone(),
            })
            .collect()
    }

    /// Install or remove the context source consulted when `resolve` is
    /// called without an explicit context.
    pub fn set_context_provider(&mut self, provider: Option<Box<dyn ContextProvider>>) {
        self.context_provider = provider;
    }

    /// Set or clear the source scope applied to subsequent
    /// registrations. Prefer [`KeymapEngine::scoped_source`], which
    /// restores the previous scope automatically.
    pub fn set_current_source(&mut self, source: Option<BindingSource>) {
        self.current_source = source;
    }

    /// Open a registration scope: bindings registered through the guard
    /// carry `source`, and the prior scope is restored when the guard
    /// drops, including on early return or panic.
    pub fn scoped_source(&mut self, source: BindingSource) -> SourceScope<'_> {
        let prior = self.current_source;
        self.current_source = Some(source);
        SourceScope { engine: self, prior }
    }

    /// Stable view of every stored binding, in registration order.
    pub fn bindings(&self) -> &[StoredBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// First stored binding for a command, in registration order.
    pub fn binding_for(&self, command: &str) -> Option<&StoredBinding> {
        self.bindings
            .iter()
            .find(|stored| stored.binding.command == command)
    }

    /// Display string for a command's chord, for menus and tooltips.
    pub fn display_for(&self, command: &str) -> Option<String> {
        self.binding_for(command)
            .map(|stored| display_key(&stored.normalized_key))
    }
}

/// RAII guard for a registration source scope; created by
/// [`KeymapEngine::scoped_source`]. Derefs to the engine so batches
/// register straight through it.
pub struct SourceScope<'a> {
    engine: &'a mut KeymapEngine,
    prior: Option<BindingSource>,
}

impl Deref for SourceScope<'_> {
    type Target = KeymapEngine;

    fn deref(&self) -> &KeymapEngine {
        self.engine
    }
}

impl DerefMut for SourceScope<'_> {
    fn deref_mut(&mut self) -> &mut KeymapEngine {
        self.engine
    }
}

impl Drop for SourceScope<'_> {
    fn drop(&mut self) {
        self.engine.current_source = self.prior;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn commands(resolved: &[ResolvedCommand]) -> Vec<&str> {
        resolved.iter().map(|r| r.command.as_str()).collect()
    }

    #[test]
    fn test_register_and_resolve() {
        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("Mod+s", "save"));

        let resolved = engine.resolve("Mod+s", None);
        assert_eq!(commands(&resolved), vec!["save"]);
        assert!(engine.resolve("Mod+q", None).is_empty());
    }

    #[test]
    fn test_resolve_is_case_invariant() {
        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("Ctrl+B", "toggleBold"));

        for chord in ["Ctrl+B", "ctrl+b", "CTRL+b", "cTRL+B"] {
            assert_eq!(commands(&engine.resolve(chord, None)), vec!["toggleBold"]);
        }
    }

    #[test]
    fn test_mod_expansion_both_directions() {
        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("Mod+b", "toggleBold"));
        assert_eq!(commands(&engine.resolve("Ctrl+b", None)), vec!["toggleBold"]);
        assert_eq!(commands(&engine.resolve("Cmd+b", None)), vec!["toggleBold"]);

        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("Cmd+b", "toggleBold"));
        assert_eq!(commands(&engine.resolve("Mod+b", None)), vec!["toggleBold"]);
    }

    #[test]
    fn test_provenance_ordering() {
        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("Mod+b", "coreBold").source(BindingSource::Core));
        engine.register(Keybinding::new("Mod+b", "extBold").source(BindingSource::Extension));
        engine.register(Keybinding::new("Mod+b", "userBold").source(BindingSource::User));

        let resolved = engine.resolve("Mod+b", None);
        assert_eq!(commands(&resolved), vec!["userBold", "extBold", "coreBold"]);
    }

    #[test]
    fn test_recency_breaks_ties() {
        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("Mod+b", "first"));
        engine.register(Keybinding::new("Mod+b", "second"));
        engine.register(Keybinding::new("Mod+b", "third"));

        let resolved = engine.resolve("Mod+b", None);
        assert_eq!(commands(&resolved), vec!["third", "second", "first"]);
    }

    #[test]
    fn test_recency_not_specificity_within_source() {
        // a later generic Mod binding outranks an earlier explicit one
        // of the same provenance; specificity is not a sort key
        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("Cmd+b", "explicit"));
        engine.register(Keybinding::new("Mod+b", "generic"));

        let resolved = engine.resolve("Cmd+b", None);
        assert_eq!(commands(&resolved), vec!["generic", "explicit"]);
    }

    #[test]
    fn test_when_clause_filters() {
        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("Mod+z", "undo").when("historyCanUndo"));

        let mut ctx = Context::new();
        ctx.set("historyCanUndo", false);
        assert!(engine.resolve("Ctrl+z", Some(&ctx)).is_empty());

        ctx.set("historyCanUndo", true);
        assert_eq!(commands(&engine.resolve("Ctrl+z", Some(&ctx))), vec!["undo"]);
    }

    #[test]
    fn test_malformed_when_excludes_only_that_binding() {
        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("Mod+z", "broken").when("a =~ b"));
        engine.register(Keybinding::new("Mod+z", "undo"));

        let resolved = engine.resolve("Mod+z", None);
        assert_eq!(commands(&resolved), vec!["undo"]);
    }

    #[test]
    fn test_args_pass_through() {
        let mut engine = KeymapEngine::new();
        engine.register(
            Keybinding::new("Mod+Alt+2", "setHeading").args(json!({"level": 2})),
        );

        let resolved = engine.resolve("Mod+Alt+2", None);
        assert_eq!(resolved[0].args, Some(json!({"level": 2})));
    }

    #[test]
    fn test_scope_determines_source() {
        let mut engine = KeymapEngine::new();
        {
            let mut scope = engine.scoped_source(BindingSource::Extension);
            scope.register(Keybinding::new("Mod+k", "insertLink"));
            // explicit self-assigned source loses to the scope
            scope.register(Keybinding::new("Mod+j", "joinLines").source(BindingSource::User));
        }
        engine.register(Keybinding::new("Mod+l", "selectLine"));

        assert_eq!(engine.bindings()[0].source, BindingSource::Extension);
        assert_eq!(engine.bindings()[1].source, BindingSource::Extension);
        // scope restored: an untagged registration defaults to user
        assert_eq!(engine.bindings()[2].source, BindingSource::User);
    }

    #[test]
    fn test_nested_scopes_restore() {
        let mut engine = KeymapEngine::new();
        let mut core = engine.scoped_source(BindingSource::Core);
        {
            let mut ext = core.scoped_source(BindingSource::Extension);
            ext.register(Keybinding::new("Mod+1", "one"));
        }
        core.register(Keybinding::new("Mod+2", "two"));
        drop(core);
        engine.register(Keybinding::new("Mod+3", "three"));

        let sources: Vec<_> = engine.bindings().iter().map(|b| b.source).collect();
        assert_eq!(
            sources,
            vec![
                BindingSource::Extension,
                BindingSource::Core,
                BindingSource::User
            ]
        );
    }

    #[test]
    fn test_unregister_matches_exact_key() {
        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("Mod+s", "save"));
        engine.register(Keybinding::new("Ctrl+s", "saveAs"));

        engine.unregister("ctrl+s", "saveAs", None);
        assert_eq!(engine.len(), 1);
        // the generic binding survives removal of the concrete one
        assert_eq!(commands(&engine.resolve("Ctrl+s", None)), vec!["save"]);
    }

    #[test]
    fn test_unregister_respects_source_filter() {
        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("Mod+d", "duplicate").source(BindingSource::Core));
        engine.register(Keybinding::new("Mod+d", "duplicate").source(BindingSource::User));

        engine.unregister("Mod+d", "duplicate", Some(BindingSource::User));
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.bindings()[0].source, BindingSource::Core);
    }

    #[test]
    fn test_clear_scoped_and_full() {
        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("Mod+1", "a").source(BindingSource::Core));
        engine.register(Keybinding::new("Mod+2", "b").source(BindingSource::Extension));
        engine.register(Keybinding::new("Mod+3", "c").source(BindingSource::User));

        engine.clear(Some(BindingSource::Extension));
        assert_eq!(engine.len(), 2);
        assert!(engine.resolve("Mod+2", None).is_empty());

        engine.clear(None);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_ids_are_monotonic_across_removal() {
        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("Mod+1", "a"));
        engine.register(Keybinding::new("Mod+2", "b"));
        engine.unregister("Mod+2", "b", None);
        engine.register(Keybinding::new("Mod+3", "c"));

        let ids: Vec<_> = engine.bindings().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn test_context_provider_polled_when_no_context_given() {
        struct Fixed;
        impl ContextProvider for Fixed {
            fn context(&self) -> Context {
                let mut ctx = Context::new();
                ctx.set("editorFocused", true);
                ctx
            }
        }

        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("Mod+b", "toggleBold").when("editorFocused"));

        // no provider, no context: clause sees an empty map
        assert!(engine.resolve("Mod+b", None).is_empty());

        engine.set_context_provider(Some(Box::new(Fixed)));
        assert_eq!(commands(&engine.resolve("Mod+b", None)), vec!["toggleBold"]);

        // explicit context wins over the provider
        let empty = Context::new();
        assert!(engine.resolve("Mod+b", Some(&empty)).is_empty());

        engine.set_context_provider(None);
        assert!(engine.resolve("Mod+b", None).is_empty());
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("", "noop"));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_display_for() {
        let mut engine = KeymapEngine::new();
        engine.register(Keybinding::new("mod+shift+z", "redo"));
        assert_eq!(engine.display_for("redo"), Some("Mod+Shift+Z".to_string()));
        assert_eq!(engine.display_for("missing"), None);
    }
}
