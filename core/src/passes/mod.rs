//! The analysis passes (spec 4.4-4.10, spec 5 "Pass order"). Each pass is a
//! free function taking the shared `ModuleAnalysis` and the program; none of
//! them own state of their own between calls.

pub mod builder;
pub mod checker;
pub mod cfg_analysis;
pub mod resolver;
pub mod unused_imports;
