//! Orchestrates parse -> semantic check -> TAC lowering -> MIPS codegen.
//!
//! Grounded on `subset_julia_vm/src/pipeline.rs`'s stage-by-stage driver
//! shape (one function per phase, each returning a `Result` the caller maps
//! into the crate's top-level error type).

use crate::ast::Node;
use crate::codegen::CodeGenerator;
use crate::error::HulkError;
use crate::parser;
use crate::semantic::SemanticChecker;
use crate::tac::TacGenerator;

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Also return the lowered TAC program's debug form alongside the
    /// assembly text (the CLI's `--emit-tac` flag).
    pub emit_tac: bool,
}

pub struct CompileOutput {
    pub assembly: String,
    pub tac: Option<String>,
}

/// Runs the full pipeline over `src`, stopping at the first stage that
/// fails. Parse errors and semantic diagnostics are distinguished in the
/// returned [`HulkError`] so the CLI can format them differently.
pub fn compile(src: &str, options: &CompileOptions) -> Result<CompileOutput, HulkError> {
    let program = parser::parse(src).map_err(HulkError::Parse)?;
    compile_ast(&program, options)
}

fn compile_ast(program: &Node, options: &CompileOptions) -> Result<CompileOutput, HulkError> {
    let Node::Program { functions, types, main, .. } = program else {
        return Err(HulkError::Internal("top-level node must be a program".to_string()));
    };

    let checker = SemanticChecker::new();
    let output = checker.check_program(program).map_err(HulkError::Semantic)?;

    let mut tac_gen = TacGenerator::new(&output.registry, &output.root, &output.annotations, &output.constructors);
    let tac_program = tac_gen.generate(functions, types, main)?;

    let tac_dump = options.emit_tac.then(|| format!("{tac_program:#?}"));

    let mut codegen = CodeGenerator::new(&output.registry, &output.root);
    let assembly = codegen.generate(&tac_program)?;

    Ok(CompileOutput { assembly, tac: tac_dump })
}
