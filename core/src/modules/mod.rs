//! Multi-module coordination (spec 4.9, 4.10): the module registry, the
//! inter-module dependency graph with cycle detection, the global exported-
//! symbol table, and cross-module import resolution.

mod dependency_graph;
mod global_table;
mod import_resolver;
mod registry;

pub use dependency_graph::{Cycle, DependencyGraph};
pub use global_table::GlobalSymbolTable;
pub use import_resolver::resolve_imports;
pub use registry::{DuplicateModule, ModuleRegistry};
