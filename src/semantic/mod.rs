//! Program-level discovery and per-node validation.
//!
//! Grounded on `examples/original_source/src/semantic_checker.py` in full:
//! the `functions`/`types`/`mainCode` partition, the two-phase
//! `define_all_types` + fixed-point `check_functions_and_types` worklist,
//! `has_circular_reference`, `get_inherited_params`, and the per-tag
//! dispatch in `check` (ported here to an exhaustive `match` on
//! [`crate::ast::Node`] instead of `getattr`).

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use crate::ast::{Annotations, Node, NodeId, TypeDeclaration};
use crate::builtins;
use crate::error::{Diagnostic, SemanticError};
use crate::inference::{ReturnTypeAccumulator, TypeInferenceService};
use crate::symbols::{FunctionSymbol, Symbol, SymbolKind, SymbolTable, TypeSymbol};
use crate::types::{Type, TypeRegistry};

/// One property initializer, carried from a type declaration's own body.
/// Concatenated parent-then-child so the constructor's TAC writes parent
/// properties first (spec.md §4.4.1, last paragraph).
#[derive(Debug, Clone)]
pub struct PropertyInit {
    pub name: String,
    pub init: Node,
}

/// Everything the TAC generator needs that the semantic pass produced:
/// the populated root table, per-node scope annotations, and the
/// concatenated constructor initializer lists.
pub struct SemanticOutput {
    pub registry: TypeRegistry,
    pub root: SymbolTable,
    pub annotations: Annotations,
    pub constructors: HashMap<String, Vec<PropertyInit>>,
}

pub struct SemanticChecker {
    registry: TypeRegistry,
    root: SymbolTable,
    diagnostics: Vec<Diagnostic>,
    annotations: Annotations,
    returns: ReturnTypeAccumulator,
    constructors: HashMap<String, Vec<PropertyInit>>,
}

impl SemanticChecker {
    pub fn new() -> Self {
        SemanticChecker {
            registry: TypeRegistry::new(),
            root: SymbolTable::root(),
            diagnostics: Vec::new(),
            annotations: Annotations::new(),
            returns: ReturnTypeAccumulator::default(),
            constructors: HashMap::new(),
        }
    }

    pub fn check_program(mut self, program: &Node) -> Result<SemanticOutput, Vec<Diagnostic>> {
        let Node::Program { functions, types, main, .. } = program else {
            self.diagnostics.push(Diagnostic::new(0, "top-level node must be a program".to_string()));
            return Err(self.diagnostics);
        };

        if self.discover(functions, types).is_err() {
            return Err(self.diagnostics);
        }

        for f in functions {
            self.check_function(f);
        }
        for t in types {
            self.check_type_methods(t);
        }

        let mut main_scope = self.root.make_child();
        self.check_node(main, &mut main_scope);

        if self.diagnostics.is_empty() {
            Ok(SemanticOutput {
                registry: self.registry,
                root: self.root,
                annotations: self.annotations,
                constructors: self.constructors,
            })
        } else {
            Err(self.diagnostics)
        }
    }

    // ---- 4.4.1 Program-level discovery --------------------------------

    fn discover(&mut self, functions: &[Node], types: &[TypeDeclaration]) -> Result<(), ()> {
        for t in types {
            if self.registry.is_known_name(&t.name) {
                self.diagnostics
                    .push(Diagnostic::new(t.line, SemanticError::RedeclaredType(t.name.clone()).to_string()));
                return Err(());
            }
            self.registry.reserve_placeholder(&t.name);
        }

        if let Some(name) = Self::find_inheritance_cycle(types) {
            let line = types.iter().find(|t| t.name == name).map(|t| t.line).unwrap_or(0);
            self.diagnostics
                .push(Diagnostic::new(line, SemanticError::CircularInheritance(name).to_string()));
            return Err(());
        }

        let mut pending_functions: Vec<usize> = (0..functions.len()).collect();
        let mut pending_types: Vec<usize> = (0..types.len()).collect();

        loop {
            let mut progress = false;

            let mut still_pending = Vec::new();
            for i in pending_functions {
                if self.try_register_function(&functions[i]) {
                    progress = true;
                } else {
                    still_pending.push(i);
                }
            }
            pending_functions = still_pending;

            let mut still_pending_types = Vec::new();
            for i in pending_types {
                if self.try_register_type(&types[i]) {
                    progress = true;
                } else {
                    still_pending_types.push(i);
                }
            }
            pending_types = still_pending_types;

            if !progress {
                if !pending_functions.is_empty() || !pending_types.is_empty() {
                    self.diagnostics
                        .push(Diagnostic::new(0, SemanticError::UnresolvableTypeDeclarations.to_string()));
                    return Err(());
                }
                return Ok(());
            }
        }
    }

    /// Walks each declared type's `parent` chain over the raw (still
    /// unregistered) declaration list and reports the first name revisited
    /// along its own chain. Runs before any type is registered, so it finds
    /// `A inherits A` and longer mutual cycles (`A inherits B; B inherits A`)
    /// that `self.root` can never witness — by the time a cycle's first
    /// member reaches `self.root`, the cycle has already blocked every
    /// member from registering, and `try_register_type` would just spin
    /// until `discover`'s fixed point gives up with
    /// `UnresolvableTypeDeclarations` instead of naming the cycle.
    fn find_inheritance_cycle(types: &[TypeDeclaration]) -> Option<String> {
        let parent_of: HashMap<&str, Option<&str>> =
            types.iter().map(|t| (t.name.as_str(), t.parent.as_deref())).collect();

        for t in types {
            let mut seen = std::collections::HashSet::new();
            let mut current = t.name.as_str();
            loop {
                if !seen.insert(current) {
                    return Some(t.name.clone());
                }
                match parent_of.get(current).copied().flatten() {
                    Some(next) if parent_of.contains_key(next) => current = next,
                    _ => break,
                }
            }
        }
        None
    }

    fn try_register_function(&mut self, node: &Node) -> bool {
        let Node::Function { name, params, return_annotation, .. } = node else {
            return true;
        };
        let return_type = self.registry.resolve_from_annotation(Some(return_annotation));
        if return_type.is_error {
            return false;
        }
        let mut param_types = Vec::with_capacity(params.len());
        for p in params {
            let pt = self.registry.resolve_from_annotation(Some(&p.annotation));
            if pt.is_error {
                return false;
            }
            param_types.push(pt);
        }
        let param_names = params.iter().map(|p| p.name.clone()).collect();
        self.root.define_function(FunctionSymbol {
            name: format!("function_{name}"),
            return_type,
            param_types,
            param_names,
        });
        true
    }

    fn try_register_type(&mut self, decl: &TypeDeclaration) -> bool {
        let parent_symbol = match &decl.parent {
            Some(p) => match self.root.get_type(p) {
                Some(s) => Some(s.clone()),
                None => return false,
            },
            None => None,
        };

        // `discover` rejects every cyclic `inherits` chain up front via
        // `find_inheritance_cycle`, so by the time a type reaches here its
        // parent chain is known acyclic.

        // Properties: parent's, then this type's own, preserving order.
        let mut properties: Vec<(String, Symbol)> = Vec::new();
        if let Some(parent_sym) = &parent_symbol {
            properties.extend(parent_sym.properties.clone());
        }
        let mut own_inits = Vec::new();
        if let Some(parent_sym) = &parent_symbol {
            if let Some(parent_inits) = self.constructors.get(&parent_sym.name) {
                own_inits.extend(parent_inits.clone());
            }
        }
        for prop in &decl.properties {
            let Some(ann) = &prop.annotation else {
                return false;
            };
            let pt = self.registry.resolve_from_annotation(Some(ann));
            if pt.is_error {
                return false;
            }
            let alias = properties.len() as i32 * 4;
            properties.push((
                prop.name.clone(),
                Symbol {
                    name: prop.name.clone(),
                    ty: pt,
                    alias,
                },
            ));
            own_inits.push(PropertyInit {
                name: prop.name.clone(),
                init: (*prop.init).clone(),
            });
        }

        // Methods: parent's (carrying forward grandparent overrides already
        // resolved), then this type's own, overriding by name.
        let mut methods: Vec<(String, FunctionSymbol)> = Vec::new();
        if let Some(parent_sym) = &parent_symbol {
            methods.extend(parent_sym.methods.clone());
        }
        let mut own_methods = Vec::new();
        for m in &decl.methods {
            let Node::Function { name, params, return_annotation, .. } = m else {
                continue;
            };
            let ret = self.registry.resolve_from_annotation(Some(return_annotation));
            if ret.is_error {
                return false;
            }
            let self_type = self.registry.resolve_from_annotation(Some(&decl.name));
            if self_type.is_error {
                return false;
            }
            let mut param_types = vec![self_type];
            let mut param_names = vec!["self".to_string()];
            for p in params {
                let pt = self.registry.resolve_from_annotation(Some(&p.annotation));
                if pt.is_error {
                    return false;
                }
                param_types.push(pt);
                param_names.push(p.name.clone());
            }
            own_methods.push((
                name.clone(),
                FunctionSymbol {
                    name: format!("method_{}_{}", decl.name, name),
                    return_type: ret,
                    param_types,
                    param_names,
                },
            ));
        }

        let mut inheritance = HashMap::new();
        if let Some(parent_sym) = &parent_symbol {
            for (mname, sym) in &parent_sym.methods {
                if !own_methods.iter().any(|(n, _)| n == mname) {
                    inheritance.insert(format!("method_{}_{}", decl.name, mname), sym.name.clone());
                }
            }
        }
        for (name, sym) in own_methods {
            methods.retain(|(n, _)| n != &name);
            methods.push((name, sym));
        }

        // Constructor params: this type's own declared signature (not
        // concatenated with the parent's — see DESIGN.md), validated for
        // inherited subsumption by name and type.
        let mut params: Vec<(String, Type)> = Vec::new();
        for p in &decl.params {
            let pt = self.registry.resolve_from_annotation(Some(&p.annotation));
            if pt.is_error {
                return false;
            }
            params.push((p.name.clone(), pt));
        }

        if let Some(parent_sym) = &parent_symbol {
            let mut required = parent_sym.params.clone();
            for ancestor in &parent_sym.ancestors {
                if let Some(anc) = self.root.get_type(ancestor) {
                    required.extend(anc.params.clone());
                }
            }
            for (pname, ptype) in &required {
                match params.iter().find(|(n, _)| n == pname) {
                    None => self.diagnostics.push(Diagnostic::new(
                        decl.line,
                        SemanticError::MissingInheritedParam(pname.clone(), decl.name.clone()).to_string(),
                    )),
                    Some((_, found)) if found != ptype => self.diagnostics.push(Diagnostic::new(
                        decl.line,
                        SemanticError::InheritedParamTypeMismatch(pname.clone(), decl.name.clone()).to_string(),
                    )),
                    _ => {}
                }
            }
        }

        let mut ancestors = Vec::new();
        if let Some(parent_sym) = &parent_symbol {
            ancestors.extend(parent_sym.ancestors.clone());
            ancestors.push(parent_sym.name.clone());
        }

        let property_order: Vec<String> = properties.iter().map(|(n, _)| n.clone()).collect();
        let ty = self
            .registry
            .create_type(&decl.name, decl.parent.as_deref(), property_order);

        self.root.define_type(TypeSymbol {
            name: decl.name.clone(),
            ty,
            properties,
            methods,
            params,
            parent_type: decl.parent.clone(),
            ancestors,
            inheritance,
        });
        self.constructors.insert(decl.name.clone(), own_inits);
        true
    }

    // ---- 4.4.2 Per-node checks ------------------------------------------

    fn check_function(&mut self, node: &Node) {
        let Node::Function { name, params, body, id, .. } = node else {
            return;
        };
        let Some(func) = self.root.get_function(&format!("function_{name}")).cloned() else {
            return;
        };
        let mut scope = self.root.make_child();
        scope.set_function(format!("function_{name}"));
        for (pname, ptype) in params.iter().map(|p| p.name.clone()).zip(func.param_types.iter()) {
            scope.define_var(Symbol {
                name: pname,
                ty: ptype.clone(),
                alias: 0,
            });
        }
        self.check_node(body, &mut scope);
        self.annotations.set_scope(*id, scope.clone());
        self.check_return_consistency(&func.name, &func.return_type, node.line());
    }

    fn check_type_methods(&mut self, decl: &TypeDeclaration) {
        let Some(type_symbol) = self.root.get_type(&decl.name).cloned() else {
            return;
        };
        for m in &decl.methods {
            let Node::Function { name: method_name, body, id, .. } = m else {
                continue;
            };
            let Some(func) = type_symbol.method(method_name).cloned() else {
                continue;
            };
            let mut scope = self.root.make_child_inside_type(&type_symbol);
            scope.set_function(func.name.clone());
            self.check_node(body, &mut scope);
            self.annotations.set_scope(*id, scope.clone());
            self.check_return_consistency(&func.name, &func.return_type, m.line());
        }
    }

    fn check_return_consistency(&mut self, mangled_name: &str, declared: &Type, line: u32) {
        let sites = self.returns.for_function(mangled_name).to_vec();
        for t in &sites {
            if t != declared {
                self.diagnostics
                    .push(Diagnostic::new(line, SemanticError::InconsistentReturns(mangled_name.to_string()).to_string()));
                break;
            }
        }
        self.returns.clear(mangled_name);
    }

    /// Recursively validates `node` under `scope`, returning its deduced
    /// type. Mirrors `semantic_checker.py::check`'s per-tag dispatch.
    fn check_node(&mut self, node: &Node, scope: &mut SymbolTable) -> Type {
        match node {
            Node::VarInst { declarations, body, id, line } => {
                let mut inner = scope.make_child();
                for decl in declarations {
                    let init_ty = self.check_node(&decl.init, &mut inner);
                    let declared_ty = self.registry.resolve_from_annotation(decl.annotation.as_deref());
                    let effective = if declared_ty.canonical_name == "NO_DEDUCED" {
                        init_ty.clone()
                    } else {
                        if declared_ty != init_ty {
                            self.diagnostics.push(Diagnostic::new(
                                *line,
                                SemanticError::TypeMismatch {
                                    expected: declared_ty.canonical_name.clone(),
                                    found: init_ty.canonical_name.clone(),
                                }
                                .to_string(),
                            ));
                        }
                        declared_ty
                    };
                    inner.define_var(Symbol {
                        name: decl.name.clone(),
                        ty: effective,
                        alias: 0,
                    });
                }
                let result = self.check_node(body, &mut inner);
                self.annotations.set_scope(*id, inner);
                result
            }

            Node::WhileLoop { condition, body, line } => {
                let cond_ty = self.check_node(condition, scope);
                if !cond_ty.is_bool() {
                    self.diagnostics.push(Diagnostic::new(
                        *line,
                        SemanticError::TypeMismatch {
                            expected: "bool".into(),
                            found: cond_ty.canonical_name,
                        }
                        .to_string(),
                    ));
                }
                scope.add_loop();
                self.check_node(body, scope);
                scope.remove_loop();
                self.registry.no_deduced.clone()
            }

            Node::Conditional {
                if_condition,
                if_body,
                elifs,
                else_body,
                line,
            } => {
                self.require_bool(if_condition, scope, *line);
                let first = self.check_node(if_body, scope);
                for (cond, body) in elifs {
                    self.require_bool(cond, scope, *line);
                    let t = self.check_node(body, scope);
                    if t != first {
                        self.diagnostics.push(Diagnostic::new(*line, SemanticError::NonDeducible.to_string()));
                    }
                }
                let else_ty = self.check_node(else_body, scope);
                if else_ty != first {
                    self.diagnostics.push(Diagnostic::new(*line, SemanticError::NonDeducible.to_string()));
                }
                first
            }

            Node::CompoundInstruction { instructions, .. } => {
                let mut last = self.registry.no_deduced.clone();
                for instr in instructions {
                    last = self.check_node(instr, scope);
                }
                last
            }

            Node::Assignment { target, value, line } => {
                let target_ty = match target.as_ref() {
                    Node::Name { name, .. } => {
                        if !scope.is_defined(name, SymbolKind::Variable) {
                            self.diagnostics.push(Diagnostic::new(
                                *line,
                                SemanticError::UndefinedVariable(name.clone()).to_string(),
                            ));
                            self.registry.not_found.clone()
                        } else {
                            scope.get_var(name).unwrap().ty.clone()
                        }
                    }
                    Node::ArrayAccess { array, .. } => self.check_node(array, scope).item_type.map(|t| *t).unwrap_or_else(|| self.registry.not_found.clone()),
                    other => self.check_node(other, scope),
                };
                let value_ty = self.check_node(value, scope);
                if target_ty != value_ty {
                    self.diagnostics.push(Diagnostic::new(
                        *line,
                        SemanticError::TypeMismatch {
                            expected: target_ty.canonical_name.clone(),
                            found: value_ty.canonical_name,
                        }
                        .to_string(),
                    ));
                }
                target_ty
            }

            Node::StrConcat { left, right, line, .. } => {
                let lt = self.check_node(left, scope);
                let rt = self.check_node(right, scope);
                if !lt.is_string() || !rt.is_string() {
                    self.diagnostics.push(Diagnostic::new(*line, SemanticError::NonDeducible.to_string()));
                }
                self.registry.builtin("string").cloned().unwrap()
            }

            Node::BinOp { .. } | Node::Unary { .. } | Node::Grouped { .. } | Node::Number { .. } | Node::StringLit { .. } | Node::Bool { .. } => {
                let mut returns = ReturnTypeAccumulator::default();
                let inf = TypeInferenceService::new(&self.registry);
                let t = inf.infer(node, scope, &mut returns);
                if t.is_error && t.canonical_name != "NO_DEDUCED" && matches!(node, Node::BinOp { .. } | Node::Unary { .. }) {
                    self.diagnostics.push(Diagnostic::new(node.line(), SemanticError::NonDeducible.to_string()));
                }
                t
            }

            Node::Name { name, line } => {
                if let Some(sym) = scope.get_var(name) {
                    sym.ty.clone()
                } else {
                    self.diagnostics.push(Diagnostic::new(*line, SemanticError::UndefinedVariable(name.clone()).to_string()));
                    self.registry.not_found.clone()
                }
            }

            Node::ArrayDeclarationExplicit { items, line } => {
                if items.is_empty() {
                    return self.registry.no_deducible.clone();
                }
                let first = self.check_node(&items[0], scope);
                for item in &items[1..] {
                    let t = self.check_node(item, scope);
                    if t != first {
                        self.diagnostics.push(Diagnostic::new(*line, SemanticError::NonDeducible.to_string()));
                    }
                }
                if first.is_array {
                    self.diagnostics
                        .push(Diagnostic::new(*line, SemanticError::MultiDimensionalArray.to_string()));
                }
                self.registry.make_array_type(first, items.len() as u32)
            }

            Node::ArrayAccess { array, index, line } => {
                let at = self.check_node(array, scope);
                let it = self.check_node(index, scope);
                if !it.is_number() {
                    self.diagnostics.push(Diagnostic::new(*line, SemanticError::NonNumberIndex.to_string()));
                }
                if !at.is_array {
                    self.diagnostics.push(Diagnostic::new(*line, SemanticError::NotIndexable.to_string()));
                    return self.registry.not_found.clone();
                }
                at.item_type.map(|t| *t).unwrap_or_else(|| self.registry.no_deducible.clone())
            }

            Node::FunctionCall { name, args, line } => {
                let arg_types: Vec<Type> = args.iter().map(|a| self.check_node(a, scope)).collect();
                let inf = TypeInferenceService::new(&self.registry);
                let mangled = inf.mangle_call(name, scope);
                // Ordinary functions/methods are looked up mangled; builtins
                // are a separate, unmangled, global lookup consulted only
                // once the 'func' lookup misses (spec.md §3).
                let (return_type, expected) = if let Some(func) = scope.get_function(&mangled).cloned() {
                    (func.return_type, func.param_types)
                } else if let Some((ret, params)) = builtins::signature(name, &self.registry) {
                    (ret, params)
                } else {
                    self.diagnostics
                        .push(Diagnostic::new(*line, SemanticError::UndefinedFunction(name.clone()).to_string()));
                    return self.registry.not_found.clone();
                };
                if expected.len() != arg_types.len() {
                    self.diagnostics.push(Diagnostic::new(
                        *line,
                        SemanticError::ArityMismatch(name.clone(), expected.len(), arg_types.len()).to_string(),
                    ));
                } else {
                    for (i, (e, a)) in expected.iter().zip(arg_types.iter()).enumerate() {
                        if e != a {
                            self.diagnostics.push(Diagnostic::new(
                                *line,
                                SemanticError::ParamTypeMismatch(i, name.clone(), e.canonical_name.clone(), a.canonical_name.clone())
                                    .to_string(),
                            ));
                        }
                    }
                }
                return_type
            }

            Node::Instance { type_name, args, line } => {
                let arg_types: Vec<Type> = args.iter().map(|a| self.check_node(a, scope)).collect();
                let Some(type_symbol) = scope.get_type(type_name).cloned() else {
                    self.diagnostics
                        .push(Diagnostic::new(*line, SemanticError::UndefinedType(type_name.clone()).to_string()));
                    return self.registry.not_found.clone();
                };
                if type_symbol.params.len() != arg_types.len() {
                    self.diagnostics.push(Diagnostic::new(
                        *line,
                        SemanticError::ConstructorArityMismatch(type_name.clone(), type_symbol.params.len(), arg_types.len())
                            .to_string(),
                    ));
                } else {
                    for (i, ((_, e), a)) in type_symbol.params.iter().zip(arg_types.iter()).enumerate() {
                        if e != a {
                            self.diagnostics.push(Diagnostic::new(
                                *line,
                                SemanticError::ParamTypeMismatch(i, type_name.clone(), e.canonical_name.clone(), a.canonical_name.clone())
                                    .to_string(),
                            ));
                        }
                    }
                }
                type_symbol.ty
            }

            Node::Access { left, right, line } => {
                let lt = self.check_node(left, scope);
                let Some(type_symbol) = scope.get_type(&lt.canonical_name).cloned() else {
                    self.diagnostics
                        .push(Diagnostic::new(*line, SemanticError::NotIndexable.to_string()));
                    return self.registry.not_found.clone();
                };
                let mut inner = scope.make_child_inside_type(&type_symbol);
                self.check_node(right, &mut inner)
            }

            Node::Downcast { expr, target_type, line } => {
                let et = self.check_node(expr, scope);
                let Some(type_symbol) = scope.get_type(&et.canonical_name).cloned() else {
                    return self.registry.not_found.clone();
                };
                if !type_symbol.ancestors.contains(target_type) {
                    self.diagnostics.push(Diagnostic::new(
                        *line,
                        SemanticError::InvalidDowncast(target_type.clone(), et.canonical_name.clone()).to_string(),
                    ));
                }
                self.registry.resolve_from_annotation(Some(target_type))
            }

            Node::ReturnStatement { value, line } => {
                if !scope.is_on_function() {
                    self.diagnostics
                        .push(Diagnostic::new(*line, SemanticError::ReturnOutsideFunction.to_string()));
                }
                let t = match value {
                    Some(v) => self.check_node(v, scope),
                    None => self.registry.no_deduced.clone(),
                };
                self.returns.record(&scope.current_function, t.clone());
                t
            }

            Node::BreakStatement { line } => {
                if !scope.is_on_loop() {
                    self.diagnostics.push(Diagnostic::new(*line, SemanticError::BreakOutsideLoop.to_string()));
                }
                self.registry.no_deduced.clone()
            }

            Node::ContinueStatement { line } => {
                if !scope.is_on_loop() {
                    self.diagnostics
                        .push(Diagnostic::new(*line, SemanticError::ContinueOutsideLoop.to_string()));
                }
                self.registry.no_deduced.clone()
            }

            Node::Function { .. } | Node::Program { .. } => self.registry.no_deduced.clone(),
        }
    }

    fn require_bool(&mut self, cond: &Node, scope: &mut SymbolTable, line: u32) {
        let t = self.check_node(cond, scope);
        if !t.is_bool() {
            self.diagnostics.push(Diagnostic::new(
                line,
                SemanticError::TypeMismatch {
                    expected: "bool".into(),
                    found: t.canonical_name,
                }
                .to_string(),
            ));
        }
    }
}

impl Default for SemanticChecker {
    fn default() -> Self {
        Self::new()
    }
}

// `NodeId` must be hashable for `Annotations`; re-exported here so callers
// of this module don't need a separate import.
pub use crate::ast::NodeId as ScopeKey;
