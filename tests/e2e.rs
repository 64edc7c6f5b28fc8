//! Black-box end-to-end tests driving the real parser -> checker -> tac ->
//! codegen pipeline, one per scenario in spec.md §8. Assertions are on
//! structural invariants (labels, op mnemonics present) rather than full
//! golden-file text, since the non-spilling allocator's eviction order and
//! the monotonic label counter make full-string comparisons brittle to
//! wording rather than to compiler behavior.

use hulkc::pipeline::CompileOptions;

fn compile_ok(src: &str) -> String {
    hulkc::compile(src, &CompileOptions::default())
        .unwrap_or_else(|e| panic!("expected {src:?} to compile, got {e}"))
        .assembly
}

#[test]
fn determinism_same_input_yields_identical_output() {
    let src = "let x : Number = 1 + (1 - -1) in print(numberToString(x));";
    let a = compile_ok(src);
    let b = compile_ok(src);
    // Full-text equality is exactly what's under test here, so a diffed
    // assertion (rather than the brittle-wording .contains() checks used
    // elsewhere in this file) is the right tool, not a liability.
    pretty_assertions::assert_eq!(a, b);
}

#[test]
fn compiled_output_round_trips_through_a_temp_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let input_path = dir.path().join("prog.hulk");
    std::fs::write(&input_path, "print(\"hi\");").expect("write temp input file");

    let src = std::fs::read_to_string(&input_path).expect("read temp input file back");
    let asm = compile_ok(&src);

    let output_path = dir.path().join("prog.s");
    std::fs::write(&output_path, &asm).expect("write temp output file");
    let written_back = std::fs::read_to_string(&output_path).expect("read temp output file back");

    assert_eq!(written_back, asm);
    assert!(written_back.contains("push_all:"));
}

#[test]
fn scenario_1_arithmetic_and_print() {
    // spec.md §8 scenario 1: computes 3.0 and routes it through the
    // string-conversion/print pipeline (the literal `print(x)` in the
    // prose elides the `numberToString` call every other scenario spells
    // out explicitly; `print` only accepts `string`).
    let asm = compile_ok("let x : Number = 1 + (1 - -1) in print(numberToString(x));");
    assert!(asm.contains("main:"));
    assert!(asm.contains("jal numberToString"));
    assert!(asm.contains("jal print"));
}

#[test]
fn scenario_2_while_loop_backedge_and_clear() {
    let src = "let a : Number = 1, b : Number = 1, n : Number = 10 in \
               while (n != 0) { let c : Number = a + b; b := a; a := c; n := n - 1; }";
    let asm = compile_ok(src);
    assert!(asm.contains("bnez"), "while condition should lower to a bnez back-edge");
    // one addi $sp,$sp,N per declare must be balanced by a clear.
    let declares = asm.matches("addi $sp, $sp, -4").count();
    assert!(declares >= 4, "expects declares for a, b, n, and the inner c");
}

#[test]
fn scenario_3_type_with_method_and_constructor() {
    let src = "type Point(x:Number, y:Number) { \
                   x:Number = x; y:Number = y; \
                   function dist():Number => self.x * self.x + self.y * self.y; \
               } \
               let p : Point = new Point(3, 4) in print(numberToString(p.dist()));";
    let asm = compile_ok(src);
    assert!(asm.contains("type_Point:"));
    assert!(asm.contains("method_Point_dist:"));
    assert!(asm.contains("jal type_Point"));
    assert!(asm.contains("jal method_Point_dist"));
}

#[test]
fn scenario_4_inherited_method_dispatches_through_parent() {
    let src = "type A(v:Number) { v:Number = v; function get():Number => self.v; } \
               type B(v:Number) inherits A { } \
               let b:B = new B(7) in print(numberToString(b.get()));";
    let asm = compile_ok(src);
    assert!(asm.contains("method_A_get:"));
    assert!(!asm.contains("method_B_get:"), "B has no override, no separate block should be emitted");
    assert!(asm.contains("jal method_A_get"), "b.get() must dispatch through the inherited parent method");
}

#[test]
fn scenario_5_array_literal_and_index() {
    let src = "let xs : Array_Number = [1, 2, 3] in print(numberToString(xs[1]));";
    let asm = compile_ok(src);
    assert!(asm.contains("li $a0, 12"), "alloc_array of 3 numbers should request 12 bytes");
    assert!(asm.contains("jal numberToString"));
}

#[test]
fn scenario_6_break_outside_loop_is_rejected() {
    let err = hulkc::compile("break;", &CompileOptions::default())
        .expect_err("a break outside any loop must be rejected");
    match err {
        hulkc::HulkError::Semantic(diags) => {
            assert!(diags.iter().any(|d| d.message.contains("break statement outside a loop")));
        }
        other => panic!("expected a semantic error, got {other}"),
    }
}

#[test]
fn emitted_assembly_carries_the_runtime_prelude() {
    let asm = compile_ok("print(\"hi\");");
    assert!(asm.contains("push_all:"));
    assert!(asm.contains("pop_all:"));
    assert!(asm.contains("concat_strings:"));
    assert!(asm.contains("boolToString:"));
}
