use super::*;
use crate::symbols::Symbol;

fn registry_and_scope() -> (TypeRegistry, SymbolTable) {
    let registry = TypeRegistry::new();
    let mut scope = SymbolTable::root();
    scope.define_var(Symbol {
        name: "x".to_string(),
        ty: registry.builtin("number").cloned().unwrap(),
        alias: 0,
    });
    (registry, scope)
}

#[test]
fn while_loop_lowers_with_jump_nz_backedge() {
    let (registry, mut scope) = registry_and_scope();
    let annotations = Annotations::new();
    let constructors = HashMap::new();
    let root = SymbolTable::root();
    let mut gen = TacGenerator::new(&registry, &root, &annotations, &constructors);

    let loop_node = Node::WhileLoop {
        condition: Box::new(Node::Name { name: "x".to_string(), line: 1 }),
        body: Box::new(Node::CompoundInstruction { instructions: vec![], line: 1 }),
        line: 1,
    };
    gen.lower(&loop_node, &mut scope);
    let ops = gen.take_ops();

    assert!(ops.iter().any(|op| matches!(op, Op::JumpNz { .. })));
    let labels: Vec<_> = ops.iter().filter(|op| matches!(op, Op::Label { .. })).collect();
    assert_eq!(labels.len(), 3, "start, condition, after labels");
}

#[test]
fn let_binding_declares_then_clears_in_reverse() {
    let (registry, mut scope) = registry_and_scope();
    let constructors = HashMap::new();

    let mut inner_scope = SymbolTable::root();
    inner_scope.define_var(Symbol {
        name: "a".to_string(),
        ty: registry.builtin("number").cloned().unwrap(),
        alias: 0,
    });
    inner_scope.define_var(Symbol {
        name: "b".to_string(),
        ty: registry.builtin("number").cloned().unwrap(),
        alias: 0,
    });
    let mut annotations = Annotations::new();
    let id = NodeId(0);
    annotations.set_scope(id, inner_scope);
    let gen_root = SymbolTable::root();
    let mut gen = TacGenerator::new(&registry, &gen_root, &annotations, &constructors);

    let node = Node::VarInst {
        declarations: vec![
            crate::ast::Declaration {
                name: "a".to_string(),
                annotation: Some("number".to_string()),
                init: Box::new(Node::Number { value: 1.0, line: 1 }),
                line: 1,
            },
            crate::ast::Declaration {
                name: "b".to_string(),
                annotation: Some("number".to_string()),
                init: Box::new(Node::Number { value: 2.0, line: 1 }),
                line: 1,
            },
        ],
        body: Box::new(Node::CompoundInstruction { instructions: vec![], line: 1 }),
        line: 1,
        id,
    };
    gen.lower(&node, &mut scope);
    let ops = gen.take_ops();

    let clears: Vec<&String> = ops
        .iter()
        .filter_map(|op| if let Op::Clear { name } = op { Some(name) } else { None })
        .collect();
    assert_eq!(clears, vec!["b", "a"]);
    let _ = gen;
}

fn op_kind(op: &Op) -> &'static str {
    match op {
        Op::Declare { .. } => "Declare",
        Op::Clear { .. } => "Clear",
        Op::Assign { .. } => "Assign",
        Op::BinOp { .. } => "BinOp",
        Op::Unary { .. } => "Unary",
        Op::Label { .. } => "Label",
        Op::Jump { .. } => "Jump",
        Op::JumpNz { .. } => "JumpNz",
        Op::Alloc { .. } => "Alloc",
        Op::AllocArray { .. } => "AllocArray",
        Op::Set { .. } => "Set",
        Op::Get { .. } => "Get",
        Op::SetIndex { .. } => "SetIndex",
        Op::GetIndex { .. } => "GetIndex",
        Op::GetParams { .. } => "GetParams",
        Op::FunctionCallStart => "FunctionCallStart",
        Op::SetParam { .. } => "SetParam",
        Op::Call { .. } => "Call",
        Op::FunctionCallEnd => "FunctionCallEnd",
        Op::Return { .. } => "Return",
    }
}

/// Snapshot of the op-kind shape a `let` binding with an empty body lowers
/// to, so a change to the declare/assign/clear bracketing shows up as a
/// readable diff instead of a silent behavior change.
#[test]
fn let_binding_op_shape_snapshot() {
    let (registry, mut scope) = registry_and_scope();
    let constructors = HashMap::new();
    let annotations = Annotations::new();
    let gen_root = SymbolTable::root();
    let mut gen = TacGenerator::new(&registry, &gen_root, &annotations, &constructors);

    let node = Node::VarInst {
        declarations: vec![crate::ast::Declaration {
            name: "y".to_string(),
            annotation: Some("number".to_string()),
            init: Box::new(Node::Number { value: 1.0, line: 1 }),
            line: 1,
        }],
        body: Box::new(Node::CompoundInstruction { instructions: vec![], line: 1 }),
        line: 1,
        id: NodeId(0),
    };
    gen.lower(&node, &mut scope);
    let ops = gen.take_ops();
    let kinds: Vec<&str> = ops.iter().map(op_kind).collect();

    insta::assert_snapshot!(kinds.join("\n"), @r###"
Declare
Assign
Clear
"###);
}
