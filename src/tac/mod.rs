//! Three-address code: the op set and the lowering pass from typed AST to
//! per-function IR.
//!
//! The op set matches the handler surface `examples/original_source/src/codegen.py`
//! actually consumes (`generate_<op>` methods) rather than the older,
//! thinner `tac_generator.py` prototype — see `DESIGN.md`. Lowering shape
//! (the do-while-style `while` trick, the label-chain conditional lowering)
//! is ported from `tac_generator.py`.

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use crate::ast::{Annotations, Node, NodeId};
use crate::error::TacError;
use crate::semantic::PropertyInit;
use crate::symbols::SymbolTable;
use crate::types::{Type, TypeRegistry};

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Temp(String),
    Var(String),
    Number(f64),
    Bool(bool),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexOperand {
    Literal(u32),
    Temp(String),
}

#[derive(Debug, Clone)]
pub enum Op {
    Declare { name: String, size: u32, ty: Type },
    Clear { name: String },
    Assign { dst: Operand, src: Operand },
    BinOp { dst: Operand, op: String, a: Operand, b: Operand },
    Unary { dst: Operand, op: String, a: Operand },
    Label { name: String },
    Jump { label: String },
    JumpNz { t: Operand, label: String },
    Alloc { dst: Operand, ty: Type },
    AllocArray { dst: Operand, elem_ty: Type, n: u32 },
    Set { obj: Operand, offset: u32, src: Operand },
    Get { dst: Operand, obj: Operand, offset: u32 },
    SetIndex { arr: Operand, index: IndexOperand, src: Operand },
    GetIndex { dst: Operand, index: IndexOperand, arr: Operand },
    GetParams { params: Vec<(String, Type)> },
    FunctionCallStart,
    SetParam { t: Operand, ty: Type },
    Call { dst: Operand, name: String },
    FunctionCallEnd,
    Return { value: Option<Operand> },
}

/// `function name -> ordered ops`. A `Vec` rather than a `HashMap` so
/// emission order — and therefore the final assembly text — is independent
/// of hash-table iteration order (spec.md §8's determinism property).
#[derive(Debug, Clone, Default)]
pub struct TacProgram {
    functions: Vec<(String, Vec<Op>)>,
}

impl TacProgram {
    pub fn push_function(&mut self, name: impl Into<String>, ops: Vec<Op>) {
        self.functions.push((name.into(), ops));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Vec<Op>)> {
        self.functions.iter()
    }
}

struct LoopLabels {
    condition: String,
    after: String,
}

pub struct TacGenerator<'a> {
    registry: &'a TypeRegistry,
    root: &'a SymbolTable,
    annotations: &'a Annotations,
    constructors: &'a HashMap<String, Vec<PropertyInit>>,
    temp_seq: u32,
    label_seq: u32,
    ops: Vec<Op>,
    loops: Vec<LoopLabels>,
}

impl<'a> TacGenerator<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        root: &'a SymbolTable,
        annotations: &'a Annotations,
        constructors: &'a HashMap<String, Vec<PropertyInit>>,
    ) -> Self {
        TacGenerator {
            registry,
            root,
            annotations,
            constructors,
            temp_seq: 0,
            label_seq: 0,
            ops: Vec::new(),
            loops: Vec::new(),
        }
    }

    fn fresh_temp(&mut self, ty: &Type) -> Operand {
        let n = self.temp_seq;
        self.temp_seq += 1;
        let prefix = if ty.is_number() { "f" } else { "t" };
        Operand::Temp(format!("{prefix}{n:02}"))
    }

    fn fresh_label(&mut self) -> String {
        let n = self.label_seq;
        self.label_seq += 1;
        format!("_L{n}")
    }

    fn emit(&mut self, op: Op) {
        self.ops.push(op);
    }

    fn take_ops(&mut self) -> Vec<Op> {
        self.temp_seq = 0;
        std::mem::take(&mut self.ops)
    }

    /// Lowers the whole program: one block per user function, one per
    /// method (inherited methods dispatch through the symbol table's
    /// `inheritance` map and need no separate block), one synthetic
    /// constructor per registered type, and `main`.
    pub fn generate(
        &mut self,
        functions: &[Node],
        types: &[crate::ast::TypeDeclaration],
        main: &Node,
    ) -> Result<TacProgram, TacError> {
        let mut program = TacProgram::default();

        for t in types {
            self.generate_constructor(t)?;
            let ops = self.take_ops();
            program.push_function(format!("type_{}", t.name), ops);
        }

        for f in functions {
            self.generate_function(f)?;
            let ops = self.take_ops();
            if let Node::Function { name, .. } = f {
                program.push_function(format!("function_{name}"), ops);
            }
        }

        for t in types {
            for m in &t.methods {
                self.generate_method(t, m)?;
                let ops = self.take_ops();
                if let Node::Function { name, .. } = m {
                    program.push_function(format!("method_{}_{}", t.name, name), ops);
                }
            }
        }

        let mut scope = self.root.make_child();
        self.lower(main, &mut scope);
        let ops = self.take_ops();
        program.push_function("main", ops);

        Ok(program)
    }

    /// Every `Node::Function` reaching TAC generation must carry a scope
    /// recorded by the semantic pass (`Annotations::scope`) — a miss here
    /// means the two passes disagree about which nodes were checked, so this
    /// is a compiler bug, not a recoverable condition (spec.md §7: internal
    /// inconsistencies surface as fatal errors, not malformed output).
    fn generate_function(&mut self, node: &Node) -> Result<(), TacError> {
        let Node::Function { params, body, id, .. } = node else {
            return Ok(());
        };
        let Some(scope) = self.annotations.scope(*id).cloned() else {
            return Err(TacError::MissingScope);
        };
        let param_list = params
            .iter()
            .filter_map(|p| scope.get_var(&p.name).map(|s| (p.name.clone(), s.ty.clone())))
            .collect();
        self.emit(Op::GetParams { params: param_list });
        let mut scope = scope;
        self.lower(body, &mut scope);
        Ok(())
    }

    fn generate_method(&mut self, decl: &crate::ast::TypeDeclaration, node: &Node) -> Result<(), TacError> {
        let Node::Function { params, body, id, .. } = node else {
            return Ok(());
        };
        let Some(scope) = self.annotations.scope(*id).cloned() else {
            return Err(TacError::MissingScope);
        };
        let self_ty = self.registry.resolve_from_annotation(Some(&decl.name));
        let mut param_list = vec![("self".to_string(), self_ty)];
        param_list.extend(
            params
                .iter()
                .filter_map(|p| scope.get_var(&p.name).map(|s| (p.name.clone(), s.ty.clone()))),
        );
        self.emit(Op::GetParams { params: param_list });
        let mut scope = scope;
        self.lower(body, &mut scope);
        Ok(())
    }

    /// The synthetic constructor: allocate the type's size, evaluate every
    /// property initializer (parent's first, via the concatenated list in
    /// `constructors`), store each at its registry-assigned offset, return
    /// the pointer. A missing layout or type symbol here means `discover`
    /// let an unregistered type through to TAC generation — a compiler bug.
    fn generate_constructor(&mut self, decl: &crate::ast::TypeDeclaration) -> Result<(), TacError> {
        let Some(layout) = self.registry.layout(&decl.name) else {
            return Err(TacError::UnregisteredType(decl.name.clone()));
        };
        let ty = layout.ty.clone();
        let Some(type_symbol) = self.root.get_type(&decl.name).cloned() else {
            return Err(TacError::UnregisteredType(decl.name.clone()));
        };
        let mut scope = self.root.make_child_inside_type(&type_symbol);
        for (pname, pty) in &type_symbol.params {
            scope.define_var(crate::symbols::Symbol {
                name: pname.clone(),
                ty: pty.clone(),
                alias: 0,
            });
        }
        let param_list = type_symbol.params.clone();
        self.emit(Op::GetParams { params: param_list });

        let obj = self.fresh_temp(&self.registry.builtin("object").cloned().unwrap());
        self.emit(Op::Alloc { dst: obj.clone(), ty });

        if let Some(inits) = self.constructors.get(&decl.name) {
            for init in inits.clone() {
                let value = self.lower_expr(&init.init, &mut scope);
                let offset = layout
                    .property_offsets
                    .get(&init.name)
                    .copied()
                    .unwrap_or(0);
                self.emit(Op::Set {
                    obj: obj.clone(),
                    offset,
                    src: value,
                });
            }
        }

        self.emit(Op::Return { value: Some(obj) });
        Ok(())
    }

    /// Lowers a statement/expression executed for effect (its value, if
    /// any, is discarded by the caller unless used as the tail of a
    /// compound instruction).
    fn lower(&mut self, node: &Node, scope: &mut SymbolTable) -> Option<Operand> {
        match node {
            Node::VarInst { declarations, body, id, .. } => {
                let mut inner = self.annotations.scope(*id).cloned().unwrap_or_else(|| scope.make_child());
                for decl in declarations {
                    let ty = inner.get_var(&decl.name).map(|s| s.ty.clone()).unwrap_or_else(|| self.registry.no_deduced.clone());
                    self.emit(Op::Declare {
                        name: decl.name.clone(),
                        size: ty.size,
                        ty: ty.clone(),
                    });
                    let value = self.lower_expr(&decl.init, &mut inner);
                    self.emit(Op::Assign {
                        dst: Operand::Var(decl.name.clone()),
                        src: value,
                    });
                }
                let result = self.lower(body, &mut inner);
                for decl in declarations.iter().rev() {
                    self.emit(Op::Clear { name: decl.name.clone() });
                }
                result
            }

            Node::CompoundInstruction { instructions, .. } => {
                let mut last = None;
                for instr in instructions {
                    last = self.lower(instr, scope);
                }
                last
            }

            Node::WhileLoop { condition, body, .. } => {
                let start = self.fresh_label();
                let cond_label = self.fresh_label();
                let after = self.fresh_label();
                self.loops.push(LoopLabels {
                    condition: cond_label.clone(),
                    after: after.clone(),
                });

                self.emit(Op::Jump { label: cond_label.clone() });
                self.emit(Op::Label { name: start.clone() });
                self.lower(body, scope);
                self.emit(Op::Label { name: cond_label });
                let cond_val = self.lower_expr(condition, scope);
                self.emit(Op::JumpNz {
                    t: cond_val,
                    label: start,
                });
                self.emit(Op::Label { name: after });
                self.loops.pop();
                None
            }

            Node::Conditional {
                if_condition,
                if_body,
                elifs,
                else_body,
                ..
            } => {
                let end = self.fresh_label();

                // `if_cond` true -> fall into `if_body`; false -> jump to
                // the first elif/else test.
                let taken = self.fresh_label();
                let else_target = self.fresh_label();
                let c = self.lower_expr(if_condition, scope);
                self.emit(Op::JumpNz { t: c, label: taken.clone() });
                self.emit(Op::Jump { label: else_target.clone() });
                self.emit(Op::Label { name: taken });
                self.lower(if_body, scope);
                self.emit(Op::Jump { label: end.clone() });
                self.emit(Op::Label { name: else_target });

                for (cond, body) in elifs {
                    let taken = self.fresh_label();
                    let skip = self.fresh_label();
                    let c = self.lower_expr(cond, scope);
                    self.emit(Op::JumpNz { t: c, label: taken.clone() });
                    self.emit(Op::Jump { label: skip.clone() });
                    self.emit(Op::Label { name: taken });
                    self.lower(body, scope);
                    self.emit(Op::Jump { label: end.clone() });
                    self.emit(Op::Label { name: skip });
                }

                self.lower(else_body, scope);
                self.emit(Op::Label { name: end });
                None
            }

            Node::Assignment { target, value, .. } => {
                let v = self.lower_expr(value, scope);
                match target.as_ref() {
                    Node::Name { name, .. } => {
                        self.emit(Op::Assign {
                            dst: Operand::Var(name.clone()),
                            src: v,
                        });
                    }
                    Node::ArrayAccess { array, index, .. } => {
                        let arr = self.lower_expr(array, scope);
                        let idx = self.lower_index(index, scope);
                        self.emit(Op::SetIndex { arr, index: idx, src: v });
                    }
                    Node::Access { left, right, .. } => {
                        let obj = self.lower_expr(left, scope);
                        if let Node::Name { name: prop, .. } = right.as_ref() {
                            let left_ty = self.node_type_hint(left, scope);
                            let offset = self
                                .registry
                                .layout(&left_ty)
                                .and_then(|l| l.property_offsets.get(prop).copied())
                                .unwrap_or(0);
                            self.emit(Op::Set { obj, offset, src: v });
                        }
                    }
                    _ => {}
                }
                None
            }

            Node::ReturnStatement { value, .. } => {
                let v = value.as_ref().map(|e| self.lower_expr(e, scope));
                self.emit(Op::Return { value: v });
                None
            }

            Node::BreakStatement { .. } => {
                if let Some(l) = self.loops.last() {
                    self.emit(Op::Jump { label: l.after.clone() });
                }
                None
            }

            Node::ContinueStatement { .. } => {
                if let Some(l) = self.loops.last() {
                    self.emit(Op::Jump { label: l.condition.clone() });
                }
                None
            }

            other => Some(self.lower_expr(other, scope)),
        }
    }

    fn lower_index(&mut self, node: &Node, scope: &mut SymbolTable) -> IndexOperand {
        if let Node::Number { value, .. } = node {
            return IndexOperand::Literal(*value as u32);
        }
        match self.lower_expr(node, scope) {
            Operand::Temp(t) => IndexOperand::Temp(t),
            Operand::Number(n) => IndexOperand::Literal(n as u32),
            other => {
                let ty = self.registry.builtin("number").cloned().unwrap();
                let tmp = self.fresh_temp(&ty);
                self.emit(Op::Assign { dst: tmp.clone(), src: other });
                match tmp {
                    Operand::Temp(t) => IndexOperand::Temp(t),
                    _ => unreachable!(),
                }
            }
        }
    }

    /// Best-effort canonical-name hint for a sub-expression, used only to
    /// resolve a property offset at an assignment site. Falls back to
    /// `object` (offset 0) when the expression shape isn't a plain name or
    /// a chained access, matching the "object pointer" treatment array
    /// index/assignment targets get at the TAC level.
    fn node_type_hint(&self, node: &Node, scope: &SymbolTable) -> String {
        match node {
            Node::Name { name, .. } => scope.get_var(name).map(|s| s.ty.canonical_name.clone()).unwrap_or_default(),
            Node::Access { .. } => String::new(),
            _ => String::new(),
        }
    }

    fn lower_expr(&mut self, node: &Node, scope: &mut SymbolTable) -> Operand {
        match node {
            Node::Number { value, .. } => Operand::Number(*value),
            Node::Bool { value, .. } => Operand::Bool(*value),
            Node::StringLit { value, .. } => Operand::Str(value.clone()),
            Node::Grouped { inner, .. } => self.lower_expr(inner, scope),
            Node::Name { name, .. } => Operand::Var(name.clone()),

            Node::Unary { op, operand, .. } => {
                let a = self.lower_expr(operand, scope);
                let ty = self.expr_ty(operand, scope);
                let dst = self.fresh_temp(&ty);
                self.emit(Op::Unary { dst: dst.clone(), op: op.clone(), a });
                dst
            }

            Node::BinOp { op, left, right, .. } => {
                let a = self.lower_expr(left, scope);
                let b = self.lower_expr(right, scope);
                let result_ty = match op.as_str() {
                    "==" | "!=" | "<" | "<=" | ">" | ">=" => self.registry.builtin("bool").cloned().unwrap(),
                    _ => self.expr_ty(left, scope),
                };
                let dst = self.fresh_temp(&result_ty);
                self.emit(Op::BinOp { dst: dst.clone(), op: op.clone(), a, b });
                dst
            }

            Node::StrConcat { left, right, is_double, .. } => {
                let l = self.lower_expr(left, scope);
                let r = self.lower_expr(right, scope);
                self.emit(Op::FunctionCallStart);
                let string_ty = self.registry.builtin("string").cloned().unwrap();
                let bool_ty = self.registry.builtin("bool").cloned().unwrap();
                self.emit(Op::SetParam { t: l, ty: string_ty.clone() });
                self.emit(Op::SetParam { t: r, ty: string_ty.clone() });
                self.emit(Op::SetParam { t: Operand::Bool(*is_double), ty: bool_ty });
                let dst = self.fresh_temp(&string_ty);
                self.emit(Op::Call { dst: dst.clone(), name: "concat_strings".to_string() });
                self.emit(Op::FunctionCallEnd);
                dst
            }

            Node::ArrayDeclarationExplicit { items, .. } => {
                let elem_ty = if items.is_empty() {
                    self.registry.no_deduced.clone()
                } else {
                    self.expr_ty(&items[0], scope)
                };
                let array_ty = self.registry.make_array_type(elem_ty.clone(), items.len() as u32);
                let dst = self.fresh_temp(&self.registry.builtin("object").cloned().unwrap());
                self.emit(Op::AllocArray {
                    dst: dst.clone(),
                    elem_ty,
                    n: items.len() as u32,
                });
                for (i, item) in items.iter().enumerate() {
                    let v = self.lower_expr(item, scope);
                    self.emit(Op::SetIndex {
                        arr: dst.clone(),
                        index: IndexOperand::Literal(i as u32),
                        src: v,
                    });
                }
                let _ = array_ty;
                dst
            }

            Node::ArrayAccess { array, index, .. } => {
                let arr = self.lower_expr(array, scope);
                let idx = self.lower_index(index, scope);
                let elem_ty = self.expr_ty(node, scope);
                let dst = self.fresh_temp(&elem_ty);
                self.emit(Op::GetIndex { dst: dst.clone(), index: idx, arr });
                dst
            }

            Node::FunctionCall { name, args, .. } => {
                self.emit(Op::FunctionCallStart);
                let inf = crate::inference::TypeInferenceService::new(self.registry);
                let mangled = inf.mangle_call(name, scope);
                let ret_ty = scope
                    .get_function(&mangled)
                    .map(|f| f.return_type.clone())
                    .or_else(|| crate::builtins::signature(name, self.registry).map(|(ret, _)| ret))
                    .unwrap_or_else(|| self.registry.no_deduced.clone());
                for arg in args {
                    let v = self.lower_expr(arg, scope);
                    let ty = self.expr_ty(arg, scope);
                    self.emit(Op::SetParam { t: v, ty });
                }
                let dst = self.fresh_temp(&ret_ty);
                self.emit(Op::Call { dst: dst.clone(), name: mangled });
                self.emit(Op::FunctionCallEnd);
                dst
            }

            Node::Instance { type_name, args, .. } => {
                self.emit(Op::FunctionCallStart);
                let type_symbol = self.root.get_type(type_name).cloned();
                for (i, arg) in args.iter().enumerate() {
                    let v = self.lower_expr(arg, scope);
                    let ty = type_symbol
                        .as_ref()
                        .and_then(|t| t.params.get(i))
                        .map(|(_, t)| t.clone())
                        .unwrap_or_else(|| self.registry.no_deduced.clone());
                    self.emit(Op::SetParam { t: v, ty });
                }
                let dst = self.fresh_temp(&self.registry.builtin("object").cloned().unwrap());
                self.emit(Op::Call { dst: dst.clone(), name: format!("type_{type_name}") });
                self.emit(Op::FunctionCallEnd);
                dst
            }

            Node::Access { left, right, .. } => {
                let obj = self.lower_expr(left, scope);
                match right.as_ref() {
                    Node::Name { name: prop, .. } => {
                        let left_ty = self.expr_ty(left, scope);
                        let offset = self
                            .registry
                            .layout(&left_ty.canonical_name)
                            .and_then(|l| l.property_offsets.get(prop).copied())
                            .unwrap_or(0);
                        let prop_ty = self
                            .root
                            .get_type(&left_ty.canonical_name)
                            .and_then(|t| t.property(prop))
                            .map(|s| s.ty.clone())
                            .unwrap_or_else(|| self.registry.no_deduced.clone());
                        let dst = self.fresh_temp(&prop_ty);
                        self.emit(Op::Get { dst: dst.clone(), obj, offset });
                        dst
                    }
                    Node::FunctionCall { name, args, .. } => {
                        let left_ty = self.expr_ty(left, scope);
                        let type_symbol = self.root.get_type(&left_ty.canonical_name);
                        let mangled = type_symbol
                            .and_then(|t| {
                                t.method(name)
                                    .map(|m| m.name.clone())
                                    .or_else(|| t.inheritance.get(&format!("method_{}_{name}", t.name)).cloned())
                            })
                            .unwrap_or_else(|| format!("method_{}_{name}", left_ty.canonical_name));
                        self.emit(Op::FunctionCallStart);
                        let self_ty = left_ty.clone();
                        self.emit(Op::SetParam { t: obj, ty: self_ty });
                        for arg in args {
                            let v = self.lower_expr(arg, scope);
                            let ty = self.expr_ty(arg, scope);
                            self.emit(Op::SetParam { t: v, ty });
                        }
                        let ret_ty = type_symbol
                            .and_then(|t| t.method(name))
                            .map(|m| m.return_type.clone())
                            .unwrap_or_else(|| self.registry.no_deduced.clone());
                        let dst = self.fresh_temp(&ret_ty);
                        self.emit(Op::Call { dst: dst.clone(), name: mangled });
                        self.emit(Op::FunctionCallEnd);
                        dst
                    }
                    _ => obj,
                }
            }

            Node::Downcast { expr, .. } => self.lower_expr(expr, scope),

            Node::Conditional { .. } | Node::CompoundInstruction { .. } | Node::VarInst { .. } => {
                self.lower(node, scope).unwrap_or(Operand::Number(0.0))
            }

            _ => Operand::Number(0.0),
        }
    }

    /// Re-derives an expression's type using the inference service; used
    /// where the TAC pass needs a `Type` (temp bank, property offsets) and
    /// the semantic pass's own deduction isn't directly at hand.
    fn expr_ty(&self, node: &Node, scope: &SymbolTable) -> Type {
        let mut returns = crate::inference::ReturnTypeAccumulator::default();
        let inf = crate::inference::TypeInferenceService::new(self.registry);
        inf.infer(node, scope, &mut returns)
    }
}
