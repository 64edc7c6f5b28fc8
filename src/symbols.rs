//! Symbols and the layered symbol table.
//!
//! Grounded on `examples/original_source/src/symbols.py`'s `Symbol` /
//! `SymbolFunction` / `SymbolObject` / `SymbolTable` classes. Scopes clone
//! the four name maps on every child, matching `make_child` /
//! `make_child_inside_type` exactly (see `DESIGN.md` for why this repo keeps
//! the clone-based shape rather than a parent-pointer chain).

use std::collections::HashMap;

use crate::types::Type;

/// `alias` is the stack/frame offset the MIPS generator addresses the
/// symbol's storage with (relative to `$sp`/`$fp`).
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub alias: i32,
}

#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub name: String,
    pub return_type: Type,
    /// Ordered; a method's first entry is always the enclosing type (the
    /// implicit `self` receiver), added by the semantic checker at
    /// registration time rather than by mutating the AST's parameter list.
    pub param_types: Vec<Type>,
    pub param_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TypeSymbol {
    pub name: String,
    pub ty: Type,
    /// Ordered name -> property symbol; parent's properties precede the
    /// child's own, matching inheritance-closure ordering.
    pub properties: Vec<(String, Symbol)>,
    /// Ordered name -> method signature.
    pub methods: Vec<(String, FunctionSymbol)>,
    /// Constructor parameters, ordered; a child's list extends the parent's.
    pub params: Vec<(String, Type)>,
    pub parent_type: Option<String>,
    /// Farthest ancestor first, nearest parent last.
    pub ancestors: Vec<String>,
    /// `method_<Child>_<m>` -> `method_<Ancestor>_<m>` for methods the child
    /// did not override.
    pub inheritance: HashMap<String, String>,
}

impl TypeSymbol {
    pub fn property(&self, name: &str) -> Option<&Symbol> {
        self.properties.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn method(&self, name: &str) -> Option<&FunctionSymbol> {
        self.methods.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Type,
}

/// Layered scope. `make_child`/`make_child_inside_type` clone the four maps
/// plus context flags; `globals` preserves the enclosing scope's variables
/// so array-indexing expressions inside a type body can still resolve
/// outer identifiers (mirrors the source's `object_property_address`/
/// `globals` duplication).
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    variables: HashMap<String, Symbol>,
    functions: HashMap<String, FunctionSymbol>,
    types: HashMap<String, TypeSymbol>,
    globals: HashMap<String, Symbol>,
    pub current_function: String,
    pub current_type: Option<String>,
    loops: u32,
}

impl SymbolTable {
    pub fn root() -> Self {
        SymbolTable {
            current_function: "main".to_string(),
            ..Default::default()
        }
    }

    pub fn define_var(&mut self, symbol: Symbol) {
        self.variables.insert(symbol.name.clone(), symbol);
    }

    pub fn define_function(&mut self, symbol: FunctionSymbol) {
        self.functions.insert(symbol.name.clone(), symbol);
    }

    pub fn define_type(&mut self, symbol: TypeSymbol) {
        self.types.insert(symbol.name.clone(), symbol);
    }

    pub fn is_defined(&self, name: &str, kind: SymbolKind) -> bool {
        match kind {
            SymbolKind::Variable => self.variables.contains_key(name) || self.globals.contains_key(name),
            SymbolKind::Function => self.functions.contains_key(name),
            SymbolKind::Type => self.types.contains_key(name),
        }
    }

    pub fn get_var(&self, name: &str) -> Option<&Symbol> {
        self.variables.get(name).or_else(|| self.globals.get(name))
    }

    pub fn get_function(&self, name: &str) -> Option<&FunctionSymbol> {
        self.functions.get(name)
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeSymbol> {
        self.types.get(name)
    }

    pub fn make_child(&self) -> SymbolTable {
        SymbolTable {
            variables: self.variables.clone(),
            functions: self.functions.clone(),
            types: self.types.clone(),
            globals: self.globals.clone(),
            current_function: self.current_function.clone(),
            current_type: self.current_type.clone(),
            loops: self.loops,
        }
    }

    /// `makeChildInsideType(T)`: a fresh table whose `variables` come from
    /// `T`'s properties and `functions` from `T`'s methods; the parent's own
    /// variables survive as `globals`.
    pub fn make_child_inside_type(&self, type_symbol: &TypeSymbol) -> SymbolTable {
        let mut variables = HashMap::new();
        for (name, sym) in &type_symbol.properties {
            variables.insert(name.clone(), sym.clone());
        }
        let mut functions = self.functions.clone();
        for (_, sym) in &type_symbol.methods {
            // Keyed by the symbol's own (mangled) name, not the bare method
            // name in the `(name, FunctionSymbol)` pair — `mangle_call`
            // always produces `method_<Type>_<name>`, and every lookup goes
            // through that mangled form.
            functions.insert(sym.name.clone(), sym.clone());
        }
        let mut globals = self.globals.clone();
        for (name, sym) in &self.variables {
            globals.entry(name.clone()).or_insert_with(|| sym.clone());
        }

        SymbolTable {
            variables,
            functions,
            types: self.types.clone(),
            globals,
            current_function: self.current_function.clone(),
            current_type: Some(type_symbol.name.clone()),
            loops: self.loops,
        }
    }

    pub fn set_current_type(&mut self, name: impl Into<String>) {
        self.current_type = Some(name.into());
    }

    pub fn unset_current_type(&mut self) {
        self.current_type = None;
    }

    pub fn set_function(&mut self, name: impl Into<String>) {
        self.current_function = name.into();
    }

    pub fn add_loop(&mut self) {
        self.loops += 1;
    }

    pub fn remove_loop(&mut self) {
        self.loops = self.loops.saturating_sub(1);
    }

    pub fn is_on_function(&self) -> bool {
        self.current_function != "main"
    }

    pub fn is_on_loop(&self) -> bool {
        self.loops > 0
    }

    pub fn is_on_type_body(&self) -> bool {
        self.current_type.is_some()
    }
}
