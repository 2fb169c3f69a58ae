use indexmap::IndexMap;

use super::scope::{Scope, ScopeKind};
use super::scope_id::ScopeId;
use super::symbol::{Symbol, SymbolKind};

/// Returned by `declare` when the current scope already has a symbol of
/// that name (spec 4.3: "fails with duplicate-declaration error if name
/// exists in current scope").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateDeclaration {
    pub name: String,
}

/// Owns the scope tree and the name -> symbol mapping within each scope
/// (spec 4.3). Scopes are kept in an arena (`IndexMap<ScopeId, Scope>`)
/// rather than embedded parent/child references, per spec 9's cyclic-graph
/// design note - this also happens to give deterministic iteration over
/// all scopes in creation order.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: IndexMap<ScopeId, Scope>,
    current: ScopeId,
    next_id: u32,
}

impl SymbolTable {
    /// A fresh table with only the root module scope.
    pub fn new() -> Self {
        let root = ScopeId::root();
        let mut scopes = IndexMap::new();
        scopes.insert(root, Scope::new(root, ScopeKind::Module, None));
        Self { scopes, current: root, next_id: 1 }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId::root()
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(&id)
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        self.scopes.get_mut(&id)
    }

    pub fn set_module_name(&mut self, name: String) {
        if let Some(scope) = self.scopes.get_mut(&self.root()) {
            scope.module_name = Some(name);
        }
    }

    pub fn module_name(&self) -> Option<&str> {
        self.scopes.get(&self.root()).and_then(|s| s.module_name.as_deref())
    }

    /// Create a new child scope of the current scope and make it current.
    /// Returns the new scope's id.
    pub fn enter_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.next_id);
        self.next_id += 1;
        let parent = self.current;
        self.scopes.insert(id, Scope::new(id, kind, Some(parent)));
        if let Some(parent_scope) = self.scopes.get_mut(&parent) {
            parent_scope.children.push(id);
        }

        if kind == ScopeKind::Loop {
            let depth = self.enclosing_loop_depth(parent) + 1;
            if let Some(scope) = self.scopes.get_mut(&id) {
                scope.loop_nesting_level = Some(depth);
            }
        }

        self.current = id;
        id
    }

    /// Return to the parent of the current scope. A no-op at the root.
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes.get(&self.current).and_then(|s| s.parent) {
            self.current = parent;
        }
    }

    fn enclosing_loop_depth(&self, from: ScopeId) -> usize {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let Some(scope) = self.scopes.get(&id) else { break };
            if scope.kind == ScopeKind::Loop {
                return scope.loop_nesting_level.unwrap_or(0);
            }
            cursor = scope.parent;
        }
        0
    }

    /// Nearest enclosing loop scope starting from `from`, walking up
    /// through block scopes (spec 4.6: `break`/`continue` validity).
    pub fn nearest_enclosing_loop(&self, from: ScopeId) -> Option<ScopeId> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = self.scopes.get(&id)?;
            if scope.kind == ScopeKind::Loop {
                return Some(id);
            }
            cursor = scope.parent;
        }
        None
    }

    /// Nearest enclosing function scope, used to read the declared return
    /// type during `return` statement checking.
    pub fn nearest_enclosing_function(&self, from: ScopeId) -> Option<ScopeId> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = self.scopes.get(&id)?;
            if scope.kind == ScopeKind::Function {
                return Some(id);
            }
            cursor = scope.parent;
        }
        None
    }

    /// Declare a symbol in the current scope. Fails if the name already
    /// exists in the current scope only - shadowing an ancestor's symbol
    /// is always permitted (spec 4.3, "Shadowing rule").
    pub fn declare(&mut self, mut symbol: Symbol) -> Result<(), DuplicateDeclaration> {
        let scope = self.scopes.get_mut(&self.current).expect("current scope must exist");
        if scope.symbols.contains_key(&symbol.name) {
            return Err(DuplicateDeclaration { name: symbol.name });
        }
        symbol.scope = self.current;
        symbol.declaration_order = scope.symbols.len();
        scope.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Declare into a specific scope, regardless of which scope is
    /// currently active. Used by import resolution, which edits imported
    /// symbols after the builder pass has moved on.
    pub fn declare_in(&mut self, scope_id: ScopeId, mut symbol: Symbol) -> Result<(), DuplicateDeclaration> {
        let scope = self.scopes.get_mut(&scope_id).expect("scope must exist");
        if scope.symbols.contains_key(&symbol.name) {
            return Err(DuplicateDeclaration { name: symbol.name });
        }
        symbol.scope = scope_id;
        symbol.declaration_order = scope.symbols.len();
        scope.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Look up `name` starting at `from`, walking the parent chain and
    /// returning the first hit (spec 4.3: `lookup` walks chain).
    pub fn lookup(&self, from: ScopeId, name: &str) -> Option<&Symbol> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = self.scopes.get(&id)?;
            if let Some(symbol) = scope.symbols.get(name) {
                return Some(symbol);
            }
            cursor = scope.parent;
        }
        None
    }

    pub fn lookup_mut(&mut self, from: ScopeId, name: &str) -> Option<&mut Symbol> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = self.scopes.get(&id)?;
            if scope.symbols.contains_key(name) {
                return self.scopes.get_mut(&id)?.symbols.get_mut(name);
            }
            cursor = scope.parent;
        }
        None
    }

    pub fn lookup_in_current(&self, name: &str) -> Option<&Symbol> {
        self.scopes.get(&self.current)?.symbols.get(name)
    }

    pub fn lookup_in_scope(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.scopes.get(&scope)?.symbols.get(name)
    }

    /// All symbols across all scopes with `exported = true`, in scope
    /// creation then declaration order.
    pub fn exported_symbols(&self) -> Vec<&Symbol> {
        self.scopes
            .values()
            .flat_map(|scope| scope.symbols.values())
            .filter(|sym| sym.exported)
            .collect()
    }

    /// All symbols declared directly in the root module scope, in
    /// declaration order - exported and non-exported alike. Used to seed
    /// the cross-module global table (spec 4.10), which must be able to
    /// tell "absent" apart from "present but not exported".
    pub fn module_scope_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.scopes.get(&self.root()).into_iter().flat_map(|scope| scope.symbols.values())
    }

    pub fn function_symbols(&self) -> Vec<&Symbol> {
        self.scopes
            .values()
            .flat_map(|scope| scope.symbols.values())
            .filter(|sym| sym.kind == SymbolKind::Function)
            .collect()
    }

    /// All symbols in every scope, in scope-creation then declaration order.
    pub fn all_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.scopes.values().flat_map(|scope| scope.symbols.values())
    }

    pub fn all_symbols_mut(&mut self) -> impl Iterator<Item = &mut Symbol> {
        self.scopes.values_mut().flat_map(|scope| scope.symbols.values_mut())
    }

    pub fn total_symbol_count(&self) -> usize {
        self.scopes.values().map(|s| s.symbols.len()).sum()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.values()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
