use blend65_common::SourceSpan;

use crate::ast::StorageClass;
use crate::types::Type;

use super::metadata::MetadataMap;
use super::scope_id::ScopeId;

/// What kind of entity a `Symbol` names (spec 3, "Symbol").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Function,
    Parameter,
    ImportedSymbol,
    MapVariable,
    EnumMember,
    TypeAlias,
}

/// The analyzer's record of a named entity.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub span: SourceSpan,
    pub storage: StorageClass,
    pub exported: bool,
    pub constant: bool,
    pub used: bool,
    pub resolved_type: Option<Type>,
    /// Parameter types, in declaration order - populated for `Function` symbols.
    pub parameters: Option<Vec<Type>>,
    /// Dotted module name this import came from - populated for `ImportedSymbol`.
    pub source_module: Option<String>,
    pub metadata: MetadataMap,
    pub scope: ScopeId,
    pub declaration_order: usize,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, span: SourceSpan) -> Self {
        Self {
            name: name.into(),
            kind,
            span,
            storage: StorageClass::None,
            exported: false,
            constant: false,
            used: false,
            resolved_type: None,
            parameters: None,
            source_module: None,
            metadata: MetadataMap::new(),
            scope: ScopeId::root(),
            declaration_order: 0,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, SymbolKind::Function)
    }
}
