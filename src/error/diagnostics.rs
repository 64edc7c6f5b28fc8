//! Accumulated, line-numbered semantic diagnostics (spec.md §7's "append to
//! an ordered error list and continue where safe" policy), grounded on the
//! accumulator shape in `subset_julia_vm/src/compile/diagnostics.rs`.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Diagnostic {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}
