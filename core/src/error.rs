//! Implementation-bug error type (SPEC_FULL.md A.1), distinct from the
//! user-facing `Diagnostic` stream: a `Diagnostic` reports something
//! wrong with the program being analyzed, a `CoreError` reports something
//! wrong with the orchestration around it - a module name collision, a
//! request to analyze a module the registry never saw. Every core entry
//! point that can fail this way returns `Result<_, CoreError>` rather than
//! panicking.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("module '{0}' was registered more than once")]
    DuplicateModule(String),

    #[error("no module named '{0}' was registered")]
    UnknownModule(String),

    #[error("dependency graph is cyclic: {0}")]
    CircularImport(String),
}
