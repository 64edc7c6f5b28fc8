//! Global, unshadowable builtin functions (spec.md §3).
//!
//! `print`, `boolToString`, `numberToString` match
//! `examples/original_source/src/symbols.py`'s `BUILTIN_FUNCTIONS` dict
//! exactly, including their fixed signatures. They live in a separate
//! lookup ('builtin', consulted only after 'func' misses — mirrors
//! `SymbolTable.get_params_type`'s `get_symbol(name, 'func') or
//! get_symbol(name, 'builtin')` fallback) rather than as ordinary
//! `FunctionSymbol` entries in a scope's `functions` map, since they are
//! global and never shadowed by a user declaration.
//!
//! `concat_strings` is not a symbol-table entry in the source — it is a
//! TAC-level pseudo-call the generator emits directly for `@`/`@@` — but it
//! shares the same "global, unshadowable, unmangled" status, so its name is
//! reserved here too.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::types::{Type, TypeRegistry};

pub const BUILTIN_FUNCTIONS: &[&str] = &["print", "boolToString", "numberToString", "concat_strings"];

/// `is_builtin` runs on every call-site lookup; cache the membership set
/// once rather than rescanning `BUILTIN_FUNCTIONS` per call, matching
/// `subset_julia_vm/src/pipeline.rs`'s `Lazy`-cached-once-globally pattern.
static BUILTIN_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| BUILTIN_FUNCTIONS.iter().copied().collect());

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(name)
}

/// `(return type, ordered parameter types)` for a builtin, or `None` if
/// `name` isn't one (or is `concat_strings`, which has no symbol-table
/// signature — it's synthesized directly in the TAC generator).
pub fn signature(name: &str, registry: &TypeRegistry) -> Option<(Type, Vec<Type>)> {
    let string = registry.builtin("string").cloned().unwrap();
    let bool_ty = registry.builtin("bool").cloned().unwrap();
    let number = registry.builtin("number").cloned().unwrap();
    match name {
        "print" => Some((string.clone(), vec![string])),
        "boolToString" => Some((string.clone(), vec![bool_ty])),
        "numberToString" => Some((string, vec![number])),
        _ => None,
    }
}
