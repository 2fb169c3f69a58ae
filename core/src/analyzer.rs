//! Per-module analysis state shared across passes 1-5 and the hardware
//! analyses (spec 2 item 8, "Per-module analyzer"). The symbol table,
//! type system, call graph, CFG map, and diagnostic sink are all owned
//! here and loaned to each pass function for the duration of its call
//! (spec 9, "Shared state across passes").

use indexmap::IndexMap;

use crate::ast::{ImportDecl, Program};
use crate::call_graph::CallGraph;
use crate::cfg::ControlFlowGraph;
use crate::config::AnalysisConfig;
use crate::diagnostics::DiagnosticSink;
use crate::hw::zero_page::ZeroPageAllocation;
use crate::symtab::SymbolTable;
use crate::types::TypeSystem;

/// Everything one module's analysis run produces and consumes.
pub struct ModuleAnalysis {
    pub module_name: String,
    pub symtab: SymbolTable,
    pub diagnostics: DiagnosticSink,
    pub types: TypeSystem,
    pub call_graph: CallGraph,
    /// Per-function CFGs, keyed by function name.
    pub cfgs: IndexMap<String, ControlFlowGraph>,
    pub config: AnalysisConfig,
    /// Wildcard imports recorded by the builder pass (spec 4.4: "Wildcard
    /// imports create no symbols at this pass but record the wildcard
    /// intent for later resolution").
    pub wildcard_imports: Vec<ImportDecl>,
    /// Zero-page allocations this module produced (spec 4.11), consumed
    /// by the orchestrator's global memory-layout builder (spec 4.14).
    pub zero_page_allocations: Vec<ZeroPageAllocation>,
    pub success: bool,
}

impl ModuleAnalysis {
    pub fn new(module_name: impl Into<String>, config: AnalysisConfig) -> Self {
        Self {
            module_name: module_name.into(),
            symtab: SymbolTable::new(),
            diagnostics: DiagnosticSink::new(),
            types: TypeSystem::new(),
            call_graph: CallGraph::new(),
            cfgs: IndexMap::new(),
            config,
            wildcard_imports: Vec::new(),
            zero_page_allocations: Vec::new(),
            success: true,
        }
    }

    /// Run passes 1-5 and, if configured and no blocking errors occurred,
    /// the hardware analyses - for a module with no cross-module imports
    /// to resolve. `analyze_with_imports` in the orchestrator module
    /// extends this with cross-module import resolution between passes
    /// 1 and 2 (spec 5, "Pass order").
    #[tracing::instrument(skip(self, program), fields(module = %self.module_name))]
    pub fn analyze(&mut self, program: &Program) {
        self.analyze_with_import_resolution(program, |_ctx| {});
    }

    /// Same as `analyze`, but calls `resolve_imports` after pass 1 and
    /// before pass 2, giving the orchestrator a chance to splice in
    /// cross-module symbol types (spec 4.10).
    pub fn analyze_with_import_resolution(&mut self, program: &Program, resolve_imports: impl FnOnce(&mut ModuleAnalysis)) {
        tracing::debug!("pass 1: symbol table builder");
        crate::passes::builder::run(self, program);
        let pass1_ok = !self.diagnostics.has_errors();

        resolve_imports(self);

        if !self.diagnostics.has_errors() {
            tracing::debug!("pass 2: type resolver");
            crate::passes::resolver::run(self, program);
        }

        if !self.diagnostics.has_errors() {
            tracing::debug!("pass 4: type checker");
            crate::passes::checker::run(self, program);
        }

        // Pass 5 gates on pass 1 only (spec 5, item 5).
        if pass1_ok {
            tracing::debug!("pass 5: control-flow analyzer");
            crate::passes::cfg_analysis::run(self, program);
        }

        if !self.diagnostics.has_errors() && self.config.run_hardware_analysis {
            tracing::debug!("hardware analyses");
            crate::hw::run_all(self, program);
        }

        // Unused-import detection always runs (spec 5, item 7).
        crate::passes::unused_imports::run(self, program);

        self.success = !self.diagnostics.has_errors();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blend65_common::{DiagnosticCode, SourceSpan};

    use crate::ast::{Decl, FunctionDecl, ModuleDecl, Stmt, VariableDecl};

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    /// Duplicate top-level declarations are a pass-1 error, so pass 5
    /// (control-flow analysis) must not run at all - no CFG is built and
    /// no dead-code warning is emitted for the function that does have
    /// unreachable code after its first `return` (spec 5, item 5).
    #[test]
    fn pass_five_does_not_run_when_pass_one_has_errors() {
        let dup = FunctionDecl {
            name: "f".into(),
            params: vec![],
            return_type: Some("byte".into()),
            body: Some(vec![
                Stmt::Return { value: Some(crate::ast::Expr::Literal { value: crate::ast::Literal::Integer { value: 1, radix: crate::ast::Radix::Decimal }, span: span() }), span: span() },
                Stmt::Let(VariableDecl {
                    name: "dead".into(),
                    type_annotation: Some("byte".into()),
                    initializer: None,
                    storage: crate::ast::StorageClass::None,
                    explicit_address: None,
                    constant: false,
                    exported: false,
                    span: span(),
                }),
            ]),
            exported: false,
            callback: false,
            stub: false,
            span: span(),
        };

        let program = Program {
            module: ModuleDecl { name: vec!["demo".into()], explicit: true, span: span() },
            declarations: vec![Decl::Function(dup.clone()), Decl::Function(dup)],
            span: span(),
        };

        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        ctx.analyze(&program);

        assert!(!ctx.success);
        assert!(ctx.diagnostics.all().iter().any(|d| d.code == DiagnosticCode::DUPLICATE_DECLARATION));
        assert!(ctx.cfgs.is_empty());
        assert!(!ctx.diagnostics.all().iter().any(|d| d.code == DiagnosticCode::DEAD_CODE));
    }
}
