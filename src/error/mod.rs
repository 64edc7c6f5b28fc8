//! Thin re-export hub over the per-phase error kinds, matching
//! `subset_julia_vm/src/error/mod.rs`'s layout.

pub mod diagnostics;
pub mod semantic;
pub mod tac;

pub use diagnostics::Diagnostic;
pub use semantic::SemanticError;
pub use tac::{CodegenError, TacError};

use thiserror::Error;

/// Top-level error a driver matches on. Parse errors are produced by the
/// bundled parser (external glue, not part of the core per spec.md §1) and
/// surfaced here so the CLI has one error type to report.
#[derive(Debug, Error)]
pub enum HulkError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("{} semantic error(s) found", .0.len())]
    Semantic(Vec<Diagnostic>),
    #[error("internal compiler error: {0}")]
    Internal(String),
}

impl From<TacError> for HulkError {
    fn from(e: TacError) -> Self {
        HulkError::Internal(e.to_string())
    }
}

impl From<CodegenError> for HulkError {
    fn from(e: CodegenError) -> Self {
        HulkError::Internal(e.to_string())
    }
}
