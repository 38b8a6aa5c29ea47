//! Chord string normalization and platform modifier expansion
//!
//! A chord's identity is its normalized string, modifier order included:
//! `"CTRL+B"` and `"ctrl+b"` are the same binding, `"Ctrl+Shift+b"` and
//! `"Shift+Ctrl+b"` are not. The generic `Mod` modifier stands for Ctrl
//! on Windows/Linux and Cmd on macOS; expansion makes the three forms
//! matchable against each other.

/// Canonicalize a chord string: modifiers get a title-cased first letter,
/// the terminal key is lowercased, order is preserved.
///
/// `"CTRL+B"` becomes `"Ctrl+b"`, `"cmd+shift+z"` becomes `"Cmd+Shift+z"`.
/// Idempotent: normalizing a normalized chord is a no-op.
pub fn normalize_key(raw: &str) -> String {
    let parts: Vec<&str> = raw.split('+').map(str::trim).collect();
    let last = parts.len().saturating_sub(1);
    parts
        .iter()
        .enumerate()
        .map(|(idx, part)| {
            if idx == last {
                part.to_lowercase()
            } else {
                title_case(part)
            }
        })
        .collect::<Vec<_>>()
        .join("+")
}

fn title_case(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Expand a normalized chord into its platform equivalence class.
///
/// `Mod+X` yields `{Mod+X, Ctrl+X, Cmd+X}`; a concrete `Ctrl+X` or
/// `Cmd+X` yields `{itself, Mod+X}` so it stays matchable against
/// generically-registered bindings. Chords without a platform modifier
/// expand to themselves alone.
pub fn expand_mod_key(normalized: &str) -> Vec<String> {
    let parts: Vec<&str> = normalized.split('+').collect();
    if parts.len() < 2 {
        return vec![normalized.to_string()];
    }
    let modifiers = &parts[..parts.len() - 1];
    let mut variants = vec![normalized.to_string()];
    if modifiers.contains(&"Mod") {
        variants.push(swap_modifiers(&parts, "Mod", "Ctrl"));
        variants.push(swap_modifiers(&parts, "Mod", "Cmd"));
    } else if modifiers.contains(&"Ctrl") {
        variants.push(swap_modifiers(&parts, "Ctrl", "Mod"));
    } else if modifiers.contains(&"Cmd") {
        variants.push(swap_modifiers(&parts, "Cmd", "Mod"));
    }
    variants
}

/// Replace `from` with `to` at modifier positions (everything before the
/// terminal key).
fn swap_modifiers(parts: &[&str], from: &str, to: &str) -> String {
    let last = parts.len() - 1;
    parts
        .iter()
        .enumerate()
        .map(|(idx, part)| {
            if idx < last && *part == from {
                to
            } else {
                *part
            }
        })
        .collect::<Vec<_>>()
        .join("+")
}

/// Whether two normalized chords match: true when their expansion sets
/// intersect.
pub fn keys_match(a: &str, b: &str) -> bool {
    let left = expand_mod_key(a);
    let right = expand_mod_key(b);
    left.iter().any(|variant| right.contains(variant))
}

/// Human-readable form of a normalized chord for menus and tooltips:
/// single-character terminal keys are uppercased, named keys title-cased.
pub fn display_key(normalized: &str) -> String {
    let parts: Vec<&str> = normalized.split('+').collect();
    let last = parts.len().saturating_sub(1);
    parts
        .iter()
        .enumerate()
        .map(|(idx, part)| {
            if idx == last {
                if part.chars().count() == 1 {
                    part.to_uppercase()
                } else {
                    title_case(part)
                }
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("+")
}
