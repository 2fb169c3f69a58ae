//! Semantic analysis core for the Blend65 6502/C64 front-end compiler
//! (spec 1 "Overview"). Consumes a parsed `Program` AST and runs the
//! pass pipeline over it: symbol-table building, type resolution,
//! type checking, control-flow analysis, the hardware-specific analyses,
//! and - in multi-module programs - import resolution and a global
//! memory-layout builder. Code generation is out of scope; this crate's
//! job ends at a populated symbol table, call graph, CFG map, and
//! diagnostic stream.

pub mod analyzer;
pub mod ast;
pub mod call_graph;
pub mod cfg;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod frontend;
pub mod hw;
pub mod modules;
pub mod orchestrator;
pub mod passes;
pub mod symtab;
pub mod types;

pub use analyzer::ModuleAnalysis;
pub use config::AnalysisConfig;
pub use error::CoreError;
pub use orchestrator::{Orchestrator, OrchestratorResult};
