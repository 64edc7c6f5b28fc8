use super::*;
use crate::tac::{Op, Operand, TacProgram};
use crate::types::TypeRegistry;

#[test]
fn non_main_function_gets_prologue_and_epilogue() {
    let registry = TypeRegistry::new();
    let root = SymbolTable::root();
    let mut gen = CodeGenerator::new(&registry, &root);

    let mut program = TacProgram::default();
    program.push_function(
        "function_f",
        vec![Op::Return {
            value: Some(Operand::Number(1.0)),
        }],
    );
    let text = gen.generate(&program).expect("codegen should succeed");

    assert!(text.contains("addi $sp, $sp, -8"));
    assert!(text.contains("jr $ra"));
}

#[test]
fn register_allocator_never_assigns_same_register_to_live_temps() {
    let mut allocator = regalloc::RegisterAllocator::new();
    let r0 = allocator.get_register("t00");
    let r1 = allocator.get_register("t01");
    assert_ne!(r0, r1);
}

#[test]
fn register_allocator_resets_at_function_boundary() {
    let mut allocator = regalloc::RegisterAllocator::new();
    let r0 = allocator.get_register("t00");
    allocator.reset();
    let r1 = allocator.get_register("t00");
    assert_eq!(r0, r1, "same temp name after reset maps to the first free register again");
}

#[test]
fn string_literals_are_interned_once() {
    let registry = TypeRegistry::new();
    let root = SymbolTable::root();
    let mut gen = CodeGenerator::new(&registry, &root);
    let first = gen.intern_string("hello");
    let second = gen.intern_string("hello");
    assert_eq!(first, second);
    assert_eq!(gen.strings.len(), 1);
}
