//! Multi-module orchestrator (spec 2 item 9; spec 9, "Multi-module
//! orchestration and partial failure"). Three phases, each a plain
//! function over the previous phase's result rather than shared mutable
//! state:
//!
//! - **A (discover/validate).** Build the dependency graph from every
//!   registered module's imports; fail fast on a cyclic graph or an
//!   import of a module that was never registered.
//! - **B (analyze).** Walk modules in topological order, splicing
//!   cross-module import types in between passes 1 and 2 of each
//!   module's analysis, then publish its exported symbols before moving
//!   to the next module.
//! - **C (aggregate).** Build the global memory layout across every
//!   module's zero-page allocations and memory maps.

use indexmap::IndexMap;

use blend65_common::{Diagnostic, DiagnosticCode, SourceSpan};

use crate::analyzer::ModuleAnalysis;
use crate::ast::{Decl, Program};
use crate::config::AnalysisConfig;
use crate::error::CoreError;
use crate::hw::layout::{self, GlobalMemoryLayout, ModuleLayoutInput};
use crate::modules::{resolve_imports, DependencyGraph, GlobalSymbolTable, ModuleRegistry};

/// Everything a full multi-module analysis run produces. Populated even
/// on fail-fast failure (spec 7: "the orchestrator still returns a
/// populated result with the diagnostics emitted so far").
pub struct OrchestratorResult {
    pub modules: IndexMap<String, ModuleAnalysis>,
    pub dependency_graph: DependencyGraph,
    pub global_layout: GlobalMemoryLayout,
    pub diagnostics: Vec<Diagnostic>,
    pub success: bool,
}

pub struct Orchestrator {
    registry: ModuleRegistry,
    config: AnalysisConfig,
}

impl Orchestrator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { registry: ModuleRegistry::new(), config }
    }

    pub fn add_module(&mut self, name: impl Into<String>, program: Program) -> Result<(), CoreError> {
        let name = name.into();
        self.registry.register(name.clone(), program).map_err(|_| CoreError::DuplicateModule(name))
    }

    #[tracing::instrument(skip(self))]
    pub fn analyze_all(self) -> OrchestratorResult {
        let graph = self.build_dependency_graph();

        let order = match graph.topological_order() {
            Ok(order) => order,
            Err(cycles) => return self.fail_fast(graph, cycles.iter().map(|c| {
                Diagnostic::new(DiagnosticCode::CIRCULAR_IMPORT, format!("circular import: {}", c.render()), SourceSpan::synthetic())
            }).collect()),
        };

        if let Some(diagnostics) = self.check_missing_imports(&graph) {
            return self.fail_fast(graph, diagnostics);
        }

        let (modules, mut diagnostics) = self.analyze_in_order(&order);

        let layout_inputs: Vec<ModuleLayoutInput> = modules
            .iter()
            .map(|(name, ctx)| ModuleLayoutInput {
                module: name.as_str(),
                zero_page_allocations: &ctx.zero_page_allocations,
                program: self.registry.get(name).expect("every analyzed module was registered"),
            })
            .collect();
        let (global_layout, layout_diagnostics) = layout::build(&layout_inputs, &self.config);
        diagnostics.extend(layout_diagnostics);

        let success = modules.values().all(|ctx| ctx.success) && !diagnostics.iter().any(|d| d.severity.is_gating());

        OrchestratorResult { modules, dependency_graph: graph, global_layout, diagnostics, success }
    }

    fn build_dependency_graph(&self) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (name, program) in self.registry.all() {
            graph.add_module(name);
            for decl in &program.declarations {
                let (inner, _) = decl.unwrap_export();
                if let Decl::Import(import) = inner {
                    graph.add_dependency(name, &import.dotted_module());
                }
            }
        }
        graph
    }

    /// `None` if every import target was registered; otherwise one
    /// `IMPORT_MODULE_NOT_FOUND` diagnostic per dangling import.
    fn check_missing_imports(&self, graph: &DependencyGraph) -> Option<Vec<Diagnostic>> {
        let mut diagnostics = Vec::new();
        for name in graph.modules() {
            for dep in graph.dependencies_of(name) {
                if !self.registry.contains(&dep) {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticCode::IMPORT_MODULE_NOT_FOUND,
                        format!("module '{name}' imports unknown module '{dep}'"),
                        SourceSpan::synthetic(),
                    ));
                }
            }
        }
        if diagnostics.is_empty() { None } else { Some(diagnostics) }
    }

    /// Phase A's two gates (spec 9: "cycles stop at A; missing modules
    /// stop at A"): no per-module analysis runs, `modules` stays empty,
    /// but the dependency graph built so far is still returned.
    fn fail_fast(self, graph: DependencyGraph, diagnostics: Vec<Diagnostic>) -> OrchestratorResult {
        OrchestratorResult {
            modules: IndexMap::new(),
            dependency_graph: graph,
            global_layout: GlobalMemoryLayout::default(),
            diagnostics,
            success: false,
        }
    }

    fn analyze_in_order(&self, order: &[String]) -> (IndexMap<String, ModuleAnalysis>, Vec<Diagnostic>) {
        let mut global_table = GlobalSymbolTable::new();
        let mut modules: IndexMap<String, ModuleAnalysis> = IndexMap::new();
        let mut diagnostics = Vec::new();

        for name in order {
            let Some(program) = self.registry.get(name) else { continue };
            let mut ctx = ModuleAnalysis::new(name.clone(), self.config);
            ctx.symtab.set_module_name(name.clone());

            let global_ref = &global_table;
            ctx.analyze_with_import_resolution(program, |m| resolve_imports(m, global_ref, program));

            let module_symbols: Vec<_> = ctx.symtab.module_scope_symbols().cloned().collect();
            global_table.register_module(name, module_symbols.iter());

            diagnostics.extend(ctx.diagnostics.all().iter().cloned());
            modules.insert(name.clone(), ctx);
        }

        (modules, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Decl, FunctionDecl, ImportDecl, ModuleDecl, Stmt};
    use blend65_common::SourceSpan;

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    fn module_named(parts: &[&str]) -> ModuleDecl {
        ModuleDecl { name: parts.iter().map(|s| s.to_string()).collect(), explicit: true, span: span() }
    }

    fn program(name: &str, declarations: Vec<Decl>) -> Program {
        Program { module: module_named(&[name]), declarations, span: span() }
    }

    fn importing(module_path: &[&str], identifiers: &[&str]) -> Decl {
        Decl::Import(ImportDecl {
            identifiers: identifiers.iter().map(|s| s.to_string()).collect(),
            module_path: module_path.iter().map(|s| s.to_string()).collect(),
            wildcard: false,
            span: span(),
        })
    }

    fn exported_fn(name: &str) -> Decl {
        Decl::Export {
            inner: Box::new(Decl::Function(FunctionDecl {
                name: name.into(),
                params: vec![],
                return_type: None,
                body: Some(vec![Stmt::Return { value: None, span: span() }]),
                exported: true,
                callback: false,
                stub: false,
                span: span(),
            })),
            span: span(),
        }
    }

    fn private_fn(name: &str) -> Decl {
        Decl::Function(FunctionDecl {
            name: name.into(),
            params: vec![],
            return_type: None,
            body: Some(vec![Stmt::Return { value: None, span: span() }]),
            exported: false,
            callback: false,
            stub: false,
            span: span(),
        })
    }

    #[test]
    fn importing_a_private_symbol_is_reported_as_not_exported() {
        let program_b = program("B", vec![private_fn("helper")]);
        let program_a = program("A", vec![importing(&["B"], &["helper"])]);

        let mut orch = Orchestrator::new(AnalysisConfig::default());
        orch.add_module("A", program_a).unwrap();
        orch.add_module("B", program_b).unwrap();

        let result = orch.analyze_all();

        assert_eq!(result.modules.len(), 2);
        assert!(result.diagnostics.iter().any(|d| d.code == DiagnosticCode::IMPORT_NOT_EXPORTED));
        assert!(!result.diagnostics.iter().any(|d| d.code == DiagnosticCode::IMPORT_SYMBOL_NOT_FOUND));
    }

    #[test]
    fn circular_import_fails_fast_with_empty_modules_map() {
        let program_a = program("A", vec![importing(&["B"], &["thing"])]);
        let program_b = program("B", vec![importing(&["A"], &["other"])]);

        let mut orch = Orchestrator::new(AnalysisConfig::default());
        orch.add_module("A", program_a).unwrap();
        orch.add_module("B", program_b).unwrap();

        let result = orch.analyze_all();

        assert!(!result.success);
        assert!(result.modules.is_empty());
        assert_eq!(result.diagnostics.iter().filter(|d| d.code == DiagnosticCode::CIRCULAR_IMPORT).count(), 1);
        assert_eq!(result.dependency_graph.modules().count(), 2);
    }

    #[test]
    fn missing_import_module_fails_fast() {
        let program_a = program("A", vec![importing(&["Ghost"], &["thing"])]);

        let mut orch = Orchestrator::new(AnalysisConfig::default());
        orch.add_module("A", program_a).unwrap();

        let result = orch.analyze_all();

        assert!(!result.success);
        assert!(result.modules.is_empty());
        assert!(result.diagnostics.iter().any(|d| d.code == DiagnosticCode::IMPORT_MODULE_NOT_FOUND));
    }

    #[test]
    fn dependent_module_sees_the_exported_symbol_it_imports() {
        let program_b = program("B", vec![exported_fn("helper")]);
        let program_a = program("A", vec![importing(&["B"], &["helper"])]);

        let mut orch = Orchestrator::new(AnalysisConfig::default());
        orch.add_module("A", program_a).unwrap();
        orch.add_module("B", program_b).unwrap();

        let result = orch.analyze_all();

        assert_eq!(result.modules.len(), 2);
        assert!(!result.diagnostics.iter().any(|d| d.code == DiagnosticCode::IMPORT_SYMBOL_NOT_FOUND));
    }
}
