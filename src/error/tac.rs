//! TAC/MIPS-phase inconsistencies. Per spec.md §7 these are compiler bugs,
//! not user-facing diagnostics: they surface as [`crate::error::HulkError::Internal`]
//! and are never retried.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TacError {
    #[error("unresolved symbol '{0}' reached TAC generation")]
    UnresolvedSymbol(String),
    #[error("missing scope annotation for node")]
    MissingScope,
    #[error("type '{0}' was not registered before TAC generation")]
    UnregisteredType(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("no free or evictable register in the {0} bank")]
    NoRegister(&'static str),
    #[error("unknown temporary '{0}' referenced in TAC")]
    UnknownTemporary(String),
    #[error("unsupported binary operator '{0}'")]
    UnsupportedOp(String),
}
