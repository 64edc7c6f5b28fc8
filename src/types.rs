//! Canonical type values and the registry that resolves annotations to them.
//!
//! Grounded on `examples/original_source/src/symbols.py`'s `SymbolType`
//! class and the module-level `TYPES`/sentinel constants, restructured as a
//! struct (`TypeRegistry`) instead of module-global dicts — see `DESIGN.md`.

use std::collections::HashMap;

/// A resolved type value. `size` is excluded from [`PartialEq`] on purpose:
/// an array type's `size` is overwritten between its "literal of N items"
/// incarnation and its "pointer slot" incarnation (see `make_array_type` /
/// `resolve_from_annotation`), and the source's equality check does not
/// consider it either.
#[derive(Debug, Clone)]
pub struct Type {
    pub annotation: String,
    pub canonical_name: String,
    pub is_error: bool,
    pub is_array: bool,
    pub size: u32,
    pub item_type: Option<Box<Type>>,
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.annotation == other.annotation
            && self.canonical_name == other.canonical_name
            && self.is_error == other.is_error
            && self.is_array == other.is_array
    }
}

impl Eq for Type {}

impl Type {
    fn builtin(annotation: &str, canonical_name: &str, size: u32) -> Type {
        Type {
            annotation: annotation.to_string(),
            canonical_name: canonical_name.to_string(),
            is_error: false,
            is_array: false,
            size,
            item_type: None,
        }
    }

    fn sentinel(annotation: &str, canonical_name: &str, is_error: bool) -> Type {
        Type {
            annotation: annotation.to_string(),
            canonical_name: canonical_name.to_string(),
            is_error,
            is_array: false,
            size: 0,
            item_type: None,
        }
    }

    pub fn is_number(&self) -> bool {
        self.canonical_name == "number"
    }

    pub fn is_bool(&self) -> bool {
        self.canonical_name == "bool"
    }

    pub fn is_string(&self) -> bool {
        self.canonical_name == "string"
    }
}

/// Ordered, layout-carrying registration for a user-declared type. Stored in
/// the registry once its fixed-point discovery has resolved it fully.
#[derive(Debug, Clone)]
pub struct TypeLayout {
    pub name: String,
    pub ty: Type,
    pub parent: Option<String>,
    /// property name -> byte offset (`index * 4`), parent properties first.
    pub property_offsets: HashMap<String, u32>,
    pub property_order: Vec<String>,
}

/// Canonical store of builtin and user-declared types; annotation -> type
/// resolution; array-type synthesis; property layout sizing.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    builtins: HashMap<String, Type>,
    /// Surface-syntax annotation (`Number`, `String`, ...) -> builtin type,
    /// mirroring `symbols.py`'s `ANNOTATIONS = {TYPES[tp].annotation: ...}`.
    /// Kept separate from `builtins` (keyed by lowercase canonical name,
    /// used internally to construct literal/builtin-call types) because the
    /// source's `SymbolType` carries a capitalized annotation distinct from
    /// its lowercase `type` field, and only the annotation form is valid
    /// concrete syntax.
    annotations: HashMap<String, Type>,
    user_types: HashMap<String, TypeLayout>,
    pub no_deduced: Type,
    pub no_deducible: Type,
    pub not_found: Type,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let entries = [
            ("Number", "number"),
            ("String", "string"),
            ("Bool", "bool"),
            ("Function", "function"),
            ("Type", "type"),
            ("Object", "object"),
        ];

        let mut builtins = HashMap::new();
        let mut annotations = HashMap::new();
        for (annotation, canonical) in entries {
            let ty = Type::builtin(annotation, canonical, 4);
            builtins.insert(canonical.to_string(), ty.clone());
            annotations.insert(annotation.to_string(), ty);
        }

        TypeRegistry {
            builtins,
            annotations,
            user_types: HashMap::new(),
            no_deduced: Type::sentinel("NO_DEDUCED", "NO_DEDUCED", false),
            no_deducible: Type::sentinel("NO_DEDUCIBLE", "NO_DEDUCIBLE", true),
            not_found: Type::sentinel("NOT_FOUND", "NOT_FOUND", true),
        }
    }

    pub fn builtin(&self, name: &str) -> Option<&Type> {
        self.builtins.get(name)
    }

    /// Reserve a user type name as an error-valued placeholder so forward
    /// references parse during discovery (spec.md §4.4.1 step 1).
    pub fn reserve_placeholder(&mut self, name: &str) {
        self.user_types.insert(
            name.to_string(),
            TypeLayout {
                name: name.to_string(),
                ty: Type::sentinel(name, name, true),
                parent: None,
                property_offsets: HashMap::new(),
                property_order: Vec::new(),
            },
        );
    }

    pub fn is_known_name(&self, name: &str) -> bool {
        self.annotations.contains_key(name) || self.user_types.contains_key(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.user_types
            .get(name)
            .map(|layout| !layout.ty.is_error)
            .unwrap_or(false)
    }

    pub fn layout(&self, name: &str) -> Option<&TypeLayout> {
        self.user_types.get(name).filter(|l| !l.ty.is_error)
    }

    /// `resolveFromAnnotation`: `None` -> `NO_DEDUCED`; known name -> its
    /// type; `"Array_" + T` -> synthesized array (pointer-sized, 4 bytes);
    /// else -> `NOT_FOUND`.
    pub fn resolve_from_annotation(&self, annotation: Option<&str>) -> Type {
        let annotation = match annotation {
            None => return self.no_deduced.clone(),
            Some(a) => a,
        };
        if let Some(rest) = annotation.strip_prefix("Array_") {
            let item = self.resolve_from_annotation(Some(rest));
            if item.is_array {
                // Non-goal: multi-dimensional arrays are rejected upstream
                // in the semantic checker, not silently flattened here.
                return self.not_found.clone();
            }
            let mut arr = self.make_array_type(item, 0);
            arr.annotation = annotation.to_string();
            return arr;
        }
        if let Some(t) = self.annotations.get(annotation) {
            return t.clone();
        }
        if let Some(layout) = self.user_types.get(annotation) {
            if !layout.ty.is_error {
                return layout.ty.clone();
            }
            // Placeholder reserved but not yet registered: caller retries.
            return self.not_found.clone();
        }
        self.not_found.clone()
    }

    /// `makeArrayType`: `size * itemType.size` when `size > 0` (a literal
    /// array value), else 4 (a pointer/heap-reference slot).
    pub fn make_array_type(&self, item_type: Type, size: u32) -> Type {
        let byte_size = if size > 0 { size * item_type.size } else { 4 };
        Type {
            annotation: format!("Array_{}", item_type.annotation),
            canonical_name: format!("Array<{}>", item_type.canonical_name),
            is_error: false,
            is_array: true,
            size: byte_size,
            item_type: Some(Box::new(item_type)),
        }
    }

    /// `createType`: register a new `Type` with `size = 4 * propertyCount +
    /// 4` (one word header), and its property offset layout.
    pub fn create_type(
        &mut self,
        name: &str,
        parent: Option<&str>,
        property_order: Vec<String>,
    ) -> Type {
        let ty = Type {
            annotation: name.to_string(),
            canonical_name: name.to_string(),
            is_error: false,
            is_array: false,
            size: 4 * property_order.len() as u32 + 4,
            item_type: None,
        };
        let mut property_offsets = HashMap::new();
        for (i, prop) in property_order.iter().enumerate() {
            property_offsets.insert(prop.clone(), i as u32 * 4);
        }
        self.user_types.insert(
            name.to_string(),
            TypeLayout {
                name: name.to_string(),
                ty: ty.clone(),
                parent: parent.map(|p| p.to_string()),
                property_offsets,
                property_order,
            },
        );
        ty
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
