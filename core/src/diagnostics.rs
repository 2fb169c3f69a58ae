//! The diagnostic sink (spec 4.1): an append-only log with filtered
//! queries. No pass deduplicates - the same finding reported twice by two
//! passes is expected and tolerated (spec 4.1: "duplicates are expected
//! and tolerable in error paths").

use std::collections::BTreeMap;

use blend65_common::{Diagnostic, DiagnosticCode, Severity, SourceSpan};

#[derive(Debug, Clone, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, code: DiagnosticCode, message: impl Into<String>, span: SourceSpan) {
        self.diagnostics.push(Diagnostic::new(code, message, span));
    }

    pub fn emit_with_severity(
        &mut self,
        code: DiagnosticCode,
        severity: Severity,
        message: impl Into<String>,
        span: SourceSpan,
    ) {
        self.diagnostics.push(Diagnostic::with_severity(code, severity, message, span));
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(other);
    }

    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors_only(&self) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error).collect()
    }

    pub fn by_severity(&self, severity: Severity) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == severity).collect()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn counts_by_severity(&self) -> BTreeMap<Severity, usize> {
        let mut counts = BTreeMap::new();
        for d in &self.diagnostics {
            *counts.entry(d.severity).or_insert(0) += 1;
        }
        counts
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
