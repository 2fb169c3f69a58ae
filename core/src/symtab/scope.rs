use indexmap::IndexMap;

use super::scope_id::ScopeId;
use super::symbol::Symbol;

/// Lexical scope kind (spec 3, "Scope tree").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Function,
    Block,
    Loop,
}

/// A node in the scope tree. Symbols are stored in an `IndexMap` so
/// iteration always reflects declaration order, which spec 5
/// ("Determinism") requires of every scope symbol map.
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub symbols: IndexMap<String, Symbol>,
    /// Set on the root module scope once the module declaration is seen.
    pub module_name: Option<String>,
    /// Set on function scopes: the function's declared return-type
    /// annotation string, consulted by the checker for `return` typing.
    pub return_type_annotation: Option<String>,
    /// Set on loop scopes: nesting depth counting outward, 1 = outermost.
    pub loop_nesting_level: Option<usize>,
}

impl Scope {
    pub fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self {
            id,
            kind,
            parent,
            children: Vec::new(),
            symbols: IndexMap::new(),
            module_name: None,
            return_type_annotation: None,
            loop_nesting_level: None,
        }
    }
}
