use super::*;

fn line() -> u32 {
    1
}

#[test]
fn break_outside_loop_is_rejected() {
    let program = Node::Program {
        functions: vec![],
        types: vec![],
        main: Box::new(Node::CompoundInstruction {
            instructions: vec![Node::BreakStatement { line: line() }],
            line: line(),
        }),
        line: line(),
    };

    let result = SemanticChecker::new().check_program(&program);
    let diags = result.expect_err("expected break-outside-loop to be rejected");
    assert!(diags.iter().any(|d| d.message.contains("break statement outside a loop")));
}

#[test]
fn simple_let_binding_resolves_to_number() {
    let program = Node::Program {
        functions: vec![],
        types: vec![],
        main: Box::new(Node::VarInst {
            declarations: vec![crate::ast::Declaration {
                name: "x".to_string(),
                annotation: Some("number".to_string()),
                init: Box::new(Node::Number { value: 1.0, line: line() }),
                line: line(),
            }],
            body: Box::new(Node::Name {
                name: "x".to_string(),
                line: line(),
            }),
            line: line(),
            id: NodeId(0),
        }),
        line: line(),
    };

    let output = SemanticChecker::new().check_program(&program).expect("should typecheck");
    let scope = output.annotations.scope(NodeId(0)).expect("var_inst scope recorded");
    assert_eq!(scope.get_var("x").unwrap().ty.canonical_name, "number");
}

#[test]
fn undeclared_variable_is_rejected() {
    let program = Node::Program {
        functions: vec![],
        types: vec![],
        main: Box::new(Node::Name {
            name: "missing".to_string(),
            line: line(),
        }),
        line: line(),
    };

    let diags = SemanticChecker::new().check_program(&program).expect_err("should fail");
    assert!(diags.iter().any(|d| d.message.contains("missing")));
}

#[test]
fn inheritance_registers_method_through_parent() {
    use crate::ast::{Param, TypeDeclaration};

    let type_a = TypeDeclaration {
        name: "A".to_string(),
        params: vec![Param {
            name: "v".to_string(),
            annotation: "number".to_string(),
            line: line(),
        }],
        parent: None,
        parent_args: vec![],
        properties: vec![crate::ast::Declaration {
            name: "v".to_string(),
            annotation: Some("number".to_string()),
            init: Box::new(Node::Name { name: "v".to_string(), line: line() }),
            line: line(),
        }],
        methods: vec![Node::Function {
            name: "get".to_string(),
            params: vec![],
            return_annotation: "number".to_string(),
            body: Box::new(Node::Access {
                left: Box::new(Node::Name { name: "self".to_string(), line: line() }),
                right: Box::new(Node::Name { name: "v".to_string(), line: line() }),
                line: line(),
            }),
            line: line(),
            id: NodeId(1),
        }],
        line: line(),
    };

    let type_b = TypeDeclaration {
        name: "B".to_string(),
        params: vec![Param {
            name: "v".to_string(),
            annotation: "number".to_string(),
            line: line(),
        }],
        parent: Some("A".to_string()),
        parent_args: vec![],
        properties: vec![],
        methods: vec![],
        line: line(),
    };

    let program = Node::Program {
        functions: vec![],
        types: vec![type_a, type_b],
        main: Box::new(Node::CompoundInstruction {
            instructions: vec![],
            line: line(),
        }),
        line: line(),
    };

    let output = SemanticChecker::new().check_program(&program).expect("should typecheck");
    let b = output.root.get_type("B").expect("B registered");
    assert_eq!(b.inheritance.get("method_B_get"), Some(&"method_A_get".to_string()));
}

#[test]
fn self_inheriting_type_is_rejected() {
    use crate::ast::TypeDeclaration;

    let type_a = TypeDeclaration {
        name: "A".to_string(),
        params: vec![],
        parent: Some("A".to_string()),
        parent_args: vec![],
        properties: vec![],
        methods: vec![],
        line: line(),
    };

    let program = Node::Program {
        functions: vec![],
        types: vec![type_a],
        main: Box::new(Node::CompoundInstruction {
            instructions: vec![],
            line: line(),
        }),
        line: line(),
    };

    let diags = SemanticChecker::new().check_program(&program).expect_err("A inherits A must be rejected");
    assert!(diags.iter().any(|d| d.message.contains("circular")), "{diags:?}");
}

#[test]
fn mutually_inheriting_types_are_rejected() {
    use crate::ast::TypeDeclaration;

    let type_a = TypeDeclaration {
        name: "A".to_string(),
        params: vec![],
        parent: Some("B".to_string()),
        parent_args: vec![],
        properties: vec![],
        methods: vec![],
        line: line(),
    };
    let type_b = TypeDeclaration {
        name: "B".to_string(),
        params: vec![],
        parent: Some("A".to_string()),
        parent_args: vec![],
        properties: vec![],
        methods: vec![],
        line: line(),
    };

    let program = Node::Program {
        functions: vec![],
        types: vec![type_a, type_b],
        main: Box::new(Node::CompoundInstruction {
            instructions: vec![],
            line: line(),
        }),
        line: line(),
    };

    let diags = SemanticChecker::new()
        .check_program(&program)
        .expect_err("A inherits B; B inherits A must be rejected");
    assert!(diags.iter().any(|d| d.message.contains("circular")), "{diags:?}");
}

#[test]
fn method_calls_its_own_sibling_method_by_bare_name() {
    use crate::ast::{Param, TypeDeclaration};

    let helper = Node::Function {
        name: "helper".to_string(),
        params: vec![],
        return_annotation: "number".to_string(),
        body: Box::new(Node::Number { value: 1.0, line: line() }),
        line: line(),
        id: NodeId(1),
    };
    let caller = Node::Function {
        name: "caller".to_string(),
        params: vec![],
        return_annotation: "number".to_string(),
        body: Box::new(Node::FunctionCall {
            name: "helper".to_string(),
            args: vec![],
            line: line(),
        }),
        line: line(),
        id: NodeId(2),
    };

    let type_t = TypeDeclaration {
        name: "T".to_string(),
        params: vec![Param {
            name: "v".to_string(),
            annotation: "number".to_string(),
            line: line(),
        }],
        parent: None,
        parent_args: vec![],
        properties: vec![crate::ast::Declaration {
            name: "v".to_string(),
            annotation: Some("number".to_string()),
            init: Box::new(Node::Name { name: "v".to_string(), line: line() }),
            line: line(),
        }],
        methods: vec![helper, caller],
        line: line(),
    };

    let program = Node::Program {
        functions: vec![],
        types: vec![type_t],
        main: Box::new(Node::CompoundInstruction {
            instructions: vec![],
            line: line(),
        }),
        line: line(),
    };

    // A bare `helper()` call from inside `caller`'s body resolves to
    // `method_T_helper` without a `self.` prefix (spec.md §3: type-body
    // child scopes expose own methods as directly-visible functions).
    SemanticChecker::new()
        .check_program(&program)
        .expect("calling a sibling method by bare name inside a method body must typecheck");
}
