//! Symbol table and scope tree (spec 3 "Symbol"/"Scope tree", spec 4.3
//! "Symbol table").

mod metadata;
mod scope;
mod scope_id;
mod symbol;
mod table;

pub use metadata::{AccessPattern, Metadata, MetadataMap, Register, RegisterPreference};
pub use scope::{Scope, ScopeKind};
pub use scope_id::ScopeId;
pub use symbol::{Symbol, SymbolKind};
pub use table::{DuplicateDeclaration, SymbolTable};
