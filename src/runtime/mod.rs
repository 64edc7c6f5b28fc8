//! The two hand-written assembly fragments the emitted program is
//! concatenated with (spec.md §1/§4.6/§6): the data-section prelude and
//! the runtime trampolines (`push_all`/`pop_all`, `concat_strings`, and
//! the `print`/`boolToString`/`numberToString` builtins' implementations).
//! Both files are pure MIPS32 assembly authored directly from the
//! documented contract — the originals (`lib/data.s`, `lib/code.s`) are
//! plain-assembly files outside the Python-source filter used to build
//! `examples/original_source`, so no literal text survived to port; see
//! `DESIGN.md`.

pub const DATA_PRELUDE: &str = include_str!("data.s");
pub const CODE_PRELUDE: &str = include_str!("code.s");
