//! Unused-import detection (spec 4.10, "runs at module end"). Always runs,
//! even if earlier passes errored (spec 5, item 7), since it only reads the
//! `used` flag the builder and checker passes leave on every
//! `ImportedSymbol` they declared.

use blend65_common::DiagnosticCode;

use crate::analyzer::ModuleAnalysis;
use crate::ast::Program;
use crate::symtab::SymbolKind;

pub fn run(ctx: &mut ModuleAnalysis, _program: &Program) {
    let mut hits = Vec::new();
    for symbol in ctx.symtab.all_symbols() {
        if symbol.kind == SymbolKind::ImportedSymbol && !symbol.used {
            hits.push((symbol.name.clone(), symbol.span));
        }
    }
    for (name, span) in hits {
        ctx.diagnostics.emit(DiagnosticCode::UNUSED_IMPORT, format!("imported symbol '{}' is never used", name), span);
    }
}
