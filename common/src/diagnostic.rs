use enum_assoc::Assoc;

use super::severity::Severity;
use super::span::SourceSpan;

/// Closed set of stable diagnostic codes (spec 6, "Diagnostic codes
/// (stable external surface)"). Each variant carries its default severity
/// via `#[assoc]`, mirroring how `FixedBarracudaOperators` in the teacher
/// associates `consume`/`produce` arity with each opcode - the goal is the
/// same: keep the data next to the tag instead of a parallel match arm
/// that can drift out of sync.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Assoc)]
#[func(pub const fn default_severity(&self) -> Severity)]
#[func(pub const fn numeric_id(&self) -> u32)]
pub enum DiagnosticCode {
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 1)]
    DUPLICATE_DECLARATION,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 2)]
    UNKNOWN_TYPE,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 3)]
    TYPE_MISMATCH,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 4)]
    UNDEFINED_IDENTIFIER,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 5)]
    INVALID_RETURN,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 6)]
    MISSING_RETURN_VALUE,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 7)]
    BREAK_OUTSIDE_LOOP,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 8)]
    CONTINUE_OUTSIDE_LOOP,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 9)]
    ARITY_MISMATCH,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 10)]
    NON_LVALUE_ASSIGNMENT,

    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 11)]
    DUPLICATE_MODULE,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 12)]
    CIRCULAR_IMPORT,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 13)]
    IMPORT_MODULE_NOT_FOUND,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 14)]
    IMPORT_SYMBOL_NOT_FOUND,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 15)]
    IMPORT_NOT_EXPORTED,
    #[assoc(default_severity = Severity::Hint)]
    #[assoc(numeric_id = 16)]
    UNUSED_IMPORT,

    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 17)]
    RESERVED_ZERO_PAGE,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 18)]
    ZERO_PAGE_ALLOCATION_INTO_RESERVED,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 19)]
    ZERO_PAGE_OVERFLOW,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 20)]
    MEMORY_MAP_OVERLAP,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 21)]
    ZERO_PAGE_MAP_OVERLAP,

    #[assoc(default_severity = Severity::Warning)]
    #[assoc(numeric_id = 22)]
    SID_VOICE_CONFLICT,
    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 23)]
    SID_VOICE_CONTROL_CONFLICT,
    #[assoc(default_severity = Severity::Warning)]
    #[assoc(numeric_id = 24)]
    SID_FILTER_CONFLICT,
    #[assoc(default_severity = Severity::Warning)]
    #[assoc(numeric_id = 25)]
    SID_VOLUME_CONFLICT,
    #[assoc(default_severity = Severity::Warning)]
    #[assoc(numeric_id = 26)]
    RASTER_LINE_OVERRUN,

    #[assoc(default_severity = Severity::Warning)]
    #[assoc(numeric_id = 27)]
    DEAD_CODE,
    #[assoc(default_severity = Severity::Warning)]
    #[assoc(numeric_id = 28)]
    MISSING_RETURN,

    #[assoc(default_severity = Severity::Error)]
    #[assoc(numeric_id = 29)]
    PARSE_ERROR,
}

/// A single structured finding. The diagnostic sink is append-only
/// (spec 3/4.1): nothing here deduplicates, and order of construction is
/// emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub span: SourceSpan,
}

impl Diagnostic {
    /// Build a diagnostic using the code's default severity.
    pub fn new(code: DiagnosticCode, message: impl Into<String>, span: SourceSpan) -> Self {
        Self { severity: code.default_severity(), code, message: message.into(), span }
    }

    /// Build a diagnostic overriding the code's default severity (used by
    /// the SID analysis, where the same code family can surface as either
    /// a warning or a hard error depending on which register is hit).
    pub fn with_severity(code: DiagnosticCode, severity: Severity, message: impl Into<String>, span: SourceSpan) -> Self {
        Self { severity, code, message: message.into(), span }
    }

    /// One-line human-readable rendering, e.g. `error[3]: type mismatch (4:9-4:13)`.
    /// This is a minimal convenience, not the full pretty-printer (out of
    /// scope per spec 1).
    pub fn render(&self) -> String {
        format!("{}[{}]: {} ({})", self.severity, self.code.numeric_id(), self.message, self.span)
    }
}
