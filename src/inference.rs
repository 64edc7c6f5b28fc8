//! Bottom-up expression type deduction.
//!
//! Grounded on `examples/original_source/src/symbols.py::TypeInferenceService`.
//! One method per AST variant, dispatched via an exhaustive `match` instead
//! of the source's `getattr(self, f'infer_{tag}')`. Failure yields
//! `NO_DEDUCIBLE` rather than raising, matching the source's contract —
//! callers (the semantic checker) decide whether a `NO_DEDUCIBLE` result is
//! itself an error worth reporting at that call site.

use crate::ast::Node;
use crate::symbols::SymbolTable;
use crate::types::{Type, TypeRegistry};

/// Owns the per-function return-site type accumulator. The source keeps
/// this as a module-level `currentFunction -> [types]` dict; here it is a
/// field the checker threads through recursion (see `DESIGN.md`).
#[derive(Debug, Default)]
pub struct ReturnTypeAccumulator {
    by_function: std::collections::HashMap<String, Vec<Type>>,
}

impl ReturnTypeAccumulator {
    pub fn record(&mut self, function: &str, ty: Type) {
        self.by_function.entry(function.to_string()).or_default().push(ty);
    }

    pub fn for_function(&self, function: &str) -> &[Type] {
        self.by_function.get(function).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn clear(&mut self, function: &str) {
        self.by_function.remove(function);
    }
}

pub struct TypeInferenceService<'a> {
    pub registry: &'a TypeRegistry,
}

impl<'a> TypeInferenceService<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        TypeInferenceService { registry }
    }

    /// Deduce the type of `node` under `scope`. `returns` accumulates
    /// return-statement types for the enclosing function as a side effect,
    /// matching spec.md §4.3's `return_statement` rule.
    pub fn infer(
        &self,
        node: &Node,
        scope: &SymbolTable,
        returns: &mut ReturnTypeAccumulator,
    ) -> Type {
        match node {
            Node::Number { .. } => self.registry.builtin("number").cloned().unwrap(),
            Node::StringLit { .. } => self.registry.builtin("string").cloned().unwrap(),
            Node::Bool { .. } => self.registry.builtin("bool").cloned().unwrap(),
            Node::Grouped { inner, .. } => self.infer(inner, scope, returns),

            Node::Name { name, .. } => scope
                .get_var(name)
                .map(|s| s.ty.clone())
                .unwrap_or_else(|| self.registry.not_found.clone()),

            Node::Unary { op, operand, .. } => {
                let t = self.infer(operand, scope, returns);
                match op.as_str() {
                    "+" | "-" if t.is_number() => t,
                    "!" if t.is_bool() => t,
                    _ => self.registry.no_deducible.clone(),
                }
            }

            Node::BinOp { op, left, right, .. } => {
                let lt = self.infer(left, scope, returns);
                let rt = self.infer(right, scope, returns);
                if lt.is_error || rt.is_error || lt != rt {
                    return self.registry.no_deducible.clone();
                }
                match op.as_str() {
                    "+" | "-" | "*" | "/" if lt.is_number() => lt,
                    "==" | "!=" | "<" | "<=" | ">" | ">=" if lt.is_number() => {
                        self.registry.builtin("bool").cloned().unwrap()
                    }
                    "&&" | "||" if lt.is_bool() => lt,
                    _ => self.registry.no_deducible.clone(),
                }
            }

            Node::StrConcat { left, right, .. } => {
                let lt = self.infer(left, scope, returns);
                let rt = self.infer(right, scope, returns);
                if lt.is_string() && rt.is_string() {
                    self.registry.builtin("string").cloned().unwrap()
                } else {
                    self.registry.no_deducible.clone()
                }
            }

            Node::ArrayDeclarationExplicit { items, .. } => {
                if items.is_empty() {
                    return self.registry.no_deducible.clone();
                }
                let first = self.infer(&items[0], scope, returns);
                if first.is_error {
                    return self.registry.no_deducible.clone();
                }
                for item in &items[1..] {
                    if self.infer(item, scope, returns) != first {
                        return self.registry.no_deducible.clone();
                    }
                }
                self.registry.make_array_type(first, items.len() as u32)
            }

            Node::ArrayAccess { array, .. } => {
                let at = self.infer(array, scope, returns);
                at.item_type.map(|t| *t).unwrap_or_else(|| self.registry.no_deducible.clone())
            }

            Node::FunctionCall { name, .. } => {
                let mangled = self.mangle_call(name, scope);
                if let Some(f) = scope.get_function(&mangled) {
                    f.return_type.clone()
                } else if let Some((ret, _)) = crate::builtins::signature(name, self.registry) {
                    ret
                } else {
                    self.registry.not_found.clone()
                }
            }

            Node::Access { left, right, .. } => {
                let lt = self.infer(left, scope, returns);
                let type_name = lt.canonical_name.clone();
                let Some(type_symbol) = scope.get_type(&type_name) else {
                    return self.registry.no_deducible.clone();
                };
                let inner_scope = scope.make_child_inside_type(type_symbol);
                self.infer(right, &inner_scope, returns)
            }

            Node::Instance { type_name, .. } => self
                .registry
                .layout(type_name)
                .map(|l| l.ty.clone())
                .unwrap_or_else(|| self.registry.not_found.clone()),

            Node::Downcast { target_type, .. } => self.registry.resolve_from_annotation(Some(target_type)),

            Node::Conditional {
                if_body,
                elifs,
                else_body,
                ..
            } => {
                let first = self.infer(if_body, scope, returns);
                if first.is_error {
                    return self.registry.no_deducible.clone();
                }
                for (_, body) in elifs {
                    if self.infer(body, scope, returns) != first {
                        return self.registry.no_deducible.clone();
                    }
                }
                if self.infer(else_body, scope, returns) != first {
                    return self.registry.no_deducible.clone();
                }
                first
            }

            Node::CompoundInstruction { instructions, .. } => {
                let mut last = self.registry.no_deduced.clone();
                for instr in instructions {
                    last = self.infer(instr, scope, returns);
                }
                last
            }

            Node::ReturnStatement { value, .. } => {
                let t = match value {
                    Some(v) => self.infer(v, scope, returns),
                    None => self.registry.no_deduced.clone(),
                };
                returns.record(&scope.current_function, t.clone());
                t
            }

            Node::VarInst { body, .. } => self.infer(body, scope, returns),
            Node::Assignment { value, .. } => self.infer(value, scope, returns),
            Node::WhileLoop { .. } | Node::BreakStatement { .. } | Node::ContinueStatement { .. } => {
                self.registry.no_deduced.clone()
            }
            Node::Function { .. } | Node::Program { .. } => self.registry.no_deduced.clone(),
        }
    }

    /// Mangles a called name per the current scope: `method_<Type>_<name>`
    /// inside a type body, `function_<name>` at top level, or the raw name
    /// if it is a builtin.
    pub fn mangle_call(&self, name: &str, scope: &SymbolTable) -> String {
        if crate::builtins::is_builtin(name) {
            return name.to_string();
        }
        if let Some(current_type) = &scope.current_type {
            format!("method_{current_type}_{name}")
        } else {
            format!("function_{name}")
        }
    }
}
