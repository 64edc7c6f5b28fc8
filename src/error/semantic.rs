//! Error kinds raised by type resolution and per-node checking
//! (spec.md §7's "Type-resolution", "Expression-type", "Control-flow",
//! "Reference", and "Call-site" error categories). Each variant renders to
//! exactly the kind of human-readable message a [`Diagnostic`] carries.
//!
//! [`Diagnostic`]: crate::error::Diagnostic

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("type '{0}' cannot be resolved")]
    UnknownType(String),
    #[error("type '{0}' is already declared")]
    RedeclaredType(String),
    #[error("circular reference detected involving type '{0}'")]
    CircularInheritance(String),
    #[error("type declarations cannot be resolved")]
    UnresolvableTypeDeclarations,
    #[error("missing inherited constructor parameter '{0}' in type '{1}'")]
    MissingInheritedParam(String, String),
    #[error("inherited constructor parameter '{0}' has the wrong type in type '{1}'")]
    InheritedParamTypeMismatch(String, String),
    #[error("expression type cannot be deduced")]
    NonDeducible,
    #[error("expected type '{expected}' but found '{found}'")]
    TypeMismatch { expected: String, found: String },
    #[error("missing type annotation")]
    MissingAnnotation,
    #[error("multi-dimensional arrays are not supported")]
    MultiDimensionalArray,
    #[error("Cannot use a break statement outside a loop")]
    BreakOutsideLoop,
    #[error("Cannot use a continue statement outside a loop")]
    ContinueOutsideLoop,
    #[error("Cannot use a return statement outside a function")]
    ReturnOutsideFunction,
    #[error("function '{0}' has inconsistent return types")]
    InconsistentReturns(String),
    #[error("Variable {0} used but never declared")]
    UndefinedVariable(String),
    #[error("Function {0} used but never declared")]
    UndefinedFunction(String),
    #[error("Type {0} used but never declared")]
    UndefinedType(String),
    #[error("property '{0}' is not defined on type '{1}'")]
    UnknownProperty(String, String),
    #[error("method '{0}' is not defined on type '{1}'")]
    UnknownMethod(String, String),
    #[error("cannot index a non-array value")]
    NotIndexable,
    #[error("array index must be of type number")]
    NonNumberIndex,
    #[error("'{0}' is not an ancestor of '{1}', downcast is invalid")]
    InvalidDowncast(String, String),
    #[error("function '{0}' expects {1} argument(s) but {2} were given")]
    ArityMismatch(String, usize, usize),
    #[error("argument {0} of '{1}' expects type '{2}' but found '{3}'")]
    ParamTypeMismatch(usize, String, String, String),
    #[error("constructor of '{0}' expects {1} argument(s) but {2} were given")]
    ConstructorArityMismatch(String, usize, usize),
}
