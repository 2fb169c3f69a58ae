//! Global symbol table (spec 4.10): every analyzed module's module-scope
//! symbols, keyed by `(module-name, symbol-name)`. Non-exported symbols
//! are kept alongside exported ones so import resolution can tell "no
//! such symbol" apart from "symbol exists but isn't exported" - only
//! `exported_in_module` (wildcard imports) and named-import resolution's
//! `exported` check filter down to the exported subset.

use indexmap::IndexMap;

use crate::symtab::Symbol;

#[derive(Debug, Default)]
pub struct GlobalSymbolTable {
    symbols: IndexMap<(String, String), Symbol>,
}

impl GlobalSymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every module-scope symbol of `module`, exported or not
    /// (spec 4.10: "after the analyzer finishes a module, it registers
    /// that module's symbols into the global table"). Keeping
    /// non-exported symbols lets `lookup_in_module` distinguish an
    /// unknown name from a private one.
    pub fn register_module<'a>(&mut self, module: &str, symbols: impl Iterator<Item = &'a Symbol>) {
        for symbol in symbols {
            self.symbols.insert((module.to_string(), symbol.name.clone()), symbol.clone());
        }
    }

    /// Looks up `name` in `module` regardless of export status; callers
    /// that care must check `Symbol::exported` themselves (spec 4.10's
    /// "present but not exported" case).
    pub fn lookup_in_module(&self, module: &str, name: &str) -> Option<&Symbol> {
        self.symbols.get(&(module.to_string(), name.to_string()))
    }

    /// Only `module`'s exported symbols - what a wildcard import brings in.
    pub fn exported_in_module<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a Symbol> {
        self.symbols.iter().filter(move |((m, _), sym)| m == module && sym.exported).map(|(_, sym)| sym)
    }
}
