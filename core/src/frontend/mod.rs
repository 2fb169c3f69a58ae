//! Small concrete-syntax front end standing in for the out-of-scope
//! upstream Blend65 parser (spec 6, "Source syntax recognized"). Produces
//! the same `Program` AST the semantic passes consume, so the CLI and the
//! integration tests have real source text to drive the core with rather
//! than hand-built AST literals.
//!
//! The parser provides its own diagnostics separately from the analyzer's
//! (spec 6: "The parser separately provides its own diagnostics; the core
//! merges them into the diagnostic stream before running semantic
//! passes"). A syntax error is always fatal for that module - there is no
//! partial AST worth handing to the passes.

mod parser;

use blend65_common::{Diagnostic, DiagnosticCode};

use crate::ast::Program;

/// Parses `source` into a `Program`, or the syntax errors pest reported.
pub fn parse(source: &str) -> Result<Program, Vec<Diagnostic>> {
    parser::parse(source).map_err(|errors| errors.into_iter().map(to_diagnostic).collect())
}

fn to_diagnostic(error: parser::ParseError) -> Diagnostic {
    Diagnostic::new(DiagnosticCode::PARSE_ERROR, error.message, error.span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_surface_as_parse_error_diagnostics() {
        let errors = parse("function (( {\n").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, DiagnosticCode::PARSE_ERROR);
    }

    #[test]
    fn well_formed_source_parses_to_a_program() {
        let program = parse("module demo;\nexport function main(): void {\n  return;\n}\n").unwrap();
        assert_eq!(program.module.name, vec!["demo".to_string()]);
        assert_eq!(program.declarations.len(), 1);
    }
}
