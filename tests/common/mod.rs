//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use chord::{Context, ContextValue};

/// Install a tracing subscriber so RUST_LOG works in test runs. Safe to
/// call from every test; only the first call wins.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// A context resembling a focused editor with nothing selected
pub fn editor_context() -> Context {
    let mut ctx = Context::new();
    ctx.set("editorFocused", true);
    ctx.set("readonly", false);
    ctx.set("modalActive", false);
    ctx.set("hasSelection", false);
    ctx.set("historyCanUndo", false);
    ctx.set("historyCanRedo", false);
    ctx.set("blockType", "paragraph");
    ctx.set(
        "listBlocks",
        ContextValue::list(["bulletListItem", "orderedListItem"]),
    );
    ctx.set("listDepth", 0);
    ctx
}
