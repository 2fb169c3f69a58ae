//! End-to-end scenarios from spec 8, "Concrete end-to-end scenarios" -
//! source text in, diagnostics and analysis state out, using the real
//! frontend parser instead of hand-built AST literals.

use blend65_compiler::config::AnalysisConfig;
use blend65_compiler::frontend;
use blend65_compiler::{Orchestrator, OrchestratorResult};
use blend65_common::DiagnosticCode;

fn analyze_single(module_name: &str, source: &str) -> OrchestratorResult {
    let program = frontend::parse(source).expect("test source must parse");
    let mut orch = Orchestrator::new(AnalysisConfig::default());
    orch.add_module(module_name, program).unwrap();
    orch.analyze_all()
}

#[test]
fn scenario_a_simple_multi_function() {
    let source = "module Test;\n\
        function level1(): byte { return level2() + 1; }\n\
        function level2(): byte { return level3() + 1; }\n\
        function level3(): byte { return 10; }\n";

    let result = analyze_single("Test", source);
    assert!(result.success);

    let ctx = &result.modules["Test"];
    assert_eq!(ctx.symtab.function_symbols().len(), 3);
    assert!(ctx.call_graph.callees("level1").contains("level2"));
    assert!(ctx.call_graph.callees("level2").contains("level3"));
    assert!(ctx.call_graph.callees("level3").is_empty());
}

#[test]
fn scenario_b_type_mismatch_in_argument() {
    let source = "module Test;\n\
        function process(x: byte): void {}\n\
        function main(): void { let flag: bool = true; process(flag); }\n";

    let result = analyze_single("Test", source);
    assert!(!result.success);

    let ctx = &result.modules["Test"];
    assert!(ctx.diagnostics.all().iter().any(|d| d.code == DiagnosticCode::TYPE_MISMATCH));
    assert!(ctx.symtab.function_symbols().iter().any(|s| s.name == "process"));
}

#[test]
fn scenario_c_zero_page_violation() {
    let source = "module Test;\nlet @zp($00) flag: byte = 1;\n";

    let result = analyze_single("Test", source);

    let ctx = &result.modules["Test"];
    assert!(ctx.diagnostics.all().iter().any(|d| d.code == DiagnosticCode::RESERVED_ZERO_PAGE));
    assert!(ctx.symtab.lookup(ctx.symtab.root(), "flag").is_some());
}

#[test]
fn scenario_d_circular_import() {
    let program_a = frontend::parse("module A;\nimport thing from B;\n").unwrap();
    let program_b = frontend::parse("module B;\nimport other from A;\n").unwrap();

    let mut orch = Orchestrator::new(AnalysisConfig::default());
    orch.add_module("A", program_a).unwrap();
    orch.add_module("B", program_b).unwrap();

    let result = orch.analyze_all();

    assert!(!result.success);
    assert!(result.modules.is_empty());
    let circular: Vec<_> = result.diagnostics.iter().filter(|d| d.code == DiagnosticCode::CIRCULAR_IMPORT).collect();
    assert_eq!(circular.len(), 1);
    assert!(circular[0].message.contains('A') && circular[0].message.contains('B'));
    assert_eq!(result.dependency_graph.modules().count(), 2);
}

#[test]
fn scenario_e_dead_code_after_return() {
    let source = "module Test;\nfunction f(): byte { return 1; let x: byte = 0; return 2; }\n";

    let result = analyze_single("Test", source);
    assert!(result.success);

    let ctx = &result.modules["Test"];
    let dead_code: Vec<_> = ctx.diagnostics.all().iter().filter(|d| d.code == DiagnosticCode::DEAD_CODE).collect();
    assert_eq!(dead_code.len(), 1);
}

#[test]
fn scenario_f_unused_import() {
    let program_n = frontend::parse("module N;\nexport function foo(): void {}\n").unwrap();
    let program_m = frontend::parse("module M;\nimport foo from N;\n").unwrap();

    let mut orch = Orchestrator::new(AnalysisConfig::default());
    orch.add_module("N", program_n).unwrap();
    orch.add_module("M", program_m).unwrap();

    let result = orch.analyze_all();
    assert!(result.success);

    let ctx = &result.modules["M"];
    let unused: Vec<_> = ctx.diagnostics.all().iter().filter(|d| d.code == DiagnosticCode::UNUSED_IMPORT).collect();
    assert_eq!(unused.len(), 1);
}
