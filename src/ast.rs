//! The external AST contract (spec of the parser/lexer collaborators).
//!
//! Represented as a sealed enum rather than the source's dynamically tagged
//! tuples (`(tag, ...payload, line)`) — see `DESIGN.md` for the rationale.
//! Every variant carries its source line as a trailing field, mirroring the
//! "universal trailer" the original tagged-tuple shape also carried.

use serde::{Deserialize, Serialize};

pub type Line = u32;

/// Identity used to key [`Annotations`] entries. Assigned by the parser in
/// construction order; never reused and never interpreted as an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub annotation: String,
    pub line: Line,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub annotation: Option<String>,
    pub init: Box<Node>,
    pub line: Line,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,
    pub params: Vec<Param>,
    pub parent: Option<String>,
    pub parent_args: Vec<Node>,
    pub properties: Vec<Declaration>,
    pub methods: Vec<Node>,
    pub line: Line,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Program {
        functions: Vec<Node>,
        types: Vec<TypeDeclaration>,
        main: Box<Node>,
        line: Line,
    },
    /// `let d1, d2, ... in body`. Gets an [`NodeId`] so the semantic pass can
    /// stash the child scope it builds for `body` without mutating the node.
    VarInst {
        declarations: Vec<Declaration>,
        body: Box<Node>,
        line: Line,
        id: NodeId,
    },
    WhileLoop {
        condition: Box<Node>,
        body: Box<Node>,
        line: Line,
    },
    Conditional {
        if_condition: Box<Node>,
        if_body: Box<Node>,
        elifs: Vec<(Node, Node)>,
        else_body: Box<Node>,
        line: Line,
    },
    CompoundInstruction {
        instructions: Vec<Node>,
        line: Line,
    },
    Assignment {
        target: Box<Node>,
        value: Box<Node>,
        line: Line,
    },
    StrConcat {
        left: Box<Node>,
        right: Box<Node>,
        is_double: bool,
        line: Line,
    },
    BinOp {
        op: String,
        left: Box<Node>,
        right: Box<Node>,
        line: Line,
    },
    Unary {
        op: String,
        operand: Box<Node>,
        line: Line,
    },
    Grouped {
        inner: Box<Node>,
        line: Line,
    },
    Number {
        value: f64,
        line: Line,
    },
    StringLit {
        value: String,
        line: Line,
    },
    Bool {
        value: bool,
        line: Line,
    },
    Name {
        name: String,
        line: Line,
    },
    ArrayDeclarationExplicit {
        items: Vec<Node>,
        line: Line,
    },
    ArrayAccess {
        array: Box<Node>,
        index: Box<Node>,
        line: Line,
    },
    FunctionCall {
        name: String,
        args: Vec<Node>,
        line: Line,
    },
    /// Gets a [`NodeId`] so the semantic pass can stash the function-body
    /// child scope.
    Function {
        name: String,
        params: Vec<Param>,
        return_annotation: String,
        body: Box<Node>,
        line: Line,
        id: NodeId,
    },
    Instance {
        type_name: String,
        args: Vec<Node>,
        line: Line,
    },
    /// Dotted chain `left.right` (property access or method call).
    Access {
        left: Box<Node>,
        right: Box<Node>,
        line: Line,
    },
    Downcast {
        expr: Box<Node>,
        target_type: String,
        line: Line,
    },
    ReturnStatement {
        value: Option<Box<Node>>,
        line: Line,
    },
    BreakStatement {
        line: Line,
    },
    ContinueStatement {
        line: Line,
    },
}

impl Node {
    pub fn line(&self) -> Line {
        match self {
            Node::Program { line, .. }
            | Node::VarInst { line, .. }
            | Node::WhileLoop { line, .. }
            | Node::Conditional { line, .. }
            | Node::CompoundInstruction { line, .. }
            | Node::Assignment { line, .. }
            | Node::StrConcat { line, .. }
            | Node::BinOp { line, .. }
            | Node::Unary { line, .. }
            | Node::Grouped { line, .. }
            | Node::Number { line, .. }
            | Node::StringLit { line, .. }
            | Node::Bool { line, .. }
            | Node::Name { line, .. }
            | Node::ArrayDeclarationExplicit { line, .. }
            | Node::ArrayAccess { line, .. }
            | Node::FunctionCall { line, .. }
            | Node::Function { line, .. }
            | Node::Instance { line, .. }
            | Node::Access { line, .. }
            | Node::Downcast { line, .. }
            | Node::ReturnStatement { line, .. }
            | Node::BreakStatement { line }
            | Node::ContinueStatement { line } => *line,
        }
    }
}

/// Side table replacing the source's backpatched AST slots (`var_inst[3]`,
/// `function[5]`). Keyed by [`NodeId`] rather than spliced into the node.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    scopes: std::collections::HashMap<NodeId, crate::symbols::SymbolTable>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_scope(&mut self, id: NodeId, table: crate::symbols::SymbolTable) {
        self.scopes.insert(id, table);
    }

    pub fn scope(&self, id: NodeId) -> Option<&crate::symbols::SymbolTable> {
        self.scopes.get(&id)
    }
}

/// Monotonic [`NodeId`] allocator, owned by the parser during construction.
#[derive(Debug, Default)]
pub struct NodeIdAllocator {
    next: u32,
}

impl NodeIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}
