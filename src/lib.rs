#![deny(clippy::print_stderr)]

//! A HULK-to-MIPS32 compiler backend: semantic analysis over a typed AST,
//! lowering to three-address code, and MIPS32 instruction selection.
//!
//! The bundled [`parser`] exists only to give the [`pipeline`] and the CLI
//! real source text to drive; the compiler proper starts at
//! [`semantic::SemanticChecker`].

pub mod ast;
pub mod builtins;
pub mod codegen;
pub mod error;
pub mod inference;
pub mod parser;
pub mod pipeline;
pub mod runtime;
pub mod semantic;
pub mod symbols;
pub mod tac;
pub mod types;

pub use error::HulkError;
pub use pipeline::compile;
