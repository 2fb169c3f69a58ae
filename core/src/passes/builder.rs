//! Pass 1: symbol table builder (spec 4.4). Walks the AST once, building
//! the scope tree and declaring every named entity it finds. Never
//! inspects expressions for types - that is pass 2's job - and never
//! aborts on a duplicate declaration, only skips the redeclaration
//! (spec 4.4: "recovery: continue after a duplicate-declaration error").

use blend65_common::DiagnosticCode;

use crate::analyzer::ModuleAnalysis;
use crate::ast::{Decl, EnumDecl, FunctionDecl, MemoryMapDecl, Program, Stmt, VariableDecl};
use crate::symtab::{ScopeKind, Symbol, SymbolKind};

pub fn run(ctx: &mut ModuleAnalysis, program: &Program) {
    ctx.symtab.set_module_name(program.module.dotted());

    for decl in &program.declarations {
        declare_top_level(ctx, decl);
    }
}

fn declare_top_level(ctx: &mut ModuleAnalysis, decl: &Decl) {
    let (inner, exported_wrapper) = decl.unwrap_export();
    match inner {
        Decl::Function(f) => declare_function(ctx, f, exported_wrapper || f.exported),
        Decl::Variable(v) => declare_variable(ctx, v, exported_wrapper || v.exported),
        Decl::TypeAlias(t) => {
            let mut symbol = Symbol::new(t.name.clone(), SymbolKind::TypeAlias, t.span);
            symbol.constant = true;
            symbol.exported = exported_wrapper || t.exported;
            declare_or_report(ctx, symbol);
        }
        Decl::Enum(e) => declare_enum(ctx, e, exported_wrapper || e.exported),
        Decl::MemoryMap(m) => declare_memory_map(ctx, m),
        Decl::Import(i) => declare_import(ctx, i),
        // `unwrap_export` already strips every wrapper, so a nested
        // `Export` cannot appear here.
        Decl::Export { .. } => unreachable!("export wrapper already unwrapped"),
    }
}

fn declare_function(ctx: &mut ModuleAnalysis, f: &FunctionDecl, exported: bool) {
    let mut symbol = Symbol::new(f.name.clone(), SymbolKind::Function, f.span);
    symbol.exported = exported;
    symbol.parameters = Some(Vec::new()); // filled in by the resolver (pass 2)
    declare_or_report(ctx, symbol);

    let scope = ctx.symtab.enter_scope(ScopeKind::Function);
    if let Some(s) = ctx.symtab.scope_mut(scope) {
        s.return_type_annotation = f.return_type.clone();
    }

    for param in &f.params {
        let param_symbol = Symbol::new(param.name.clone(), SymbolKind::Parameter, param.span);
        declare_or_report(ctx, param_symbol);
    }

    // Stub functions (no body) still get a function scope's worth of
    // parameter symbols and nothing else (spec 4.4).
    if let Some(body) = &f.body {
        declare_block(ctx, body);
    }

    ctx.symtab.exit_scope();
}

fn declare_variable(ctx: &mut ModuleAnalysis, v: &VariableDecl, exported: bool) {
    let kind = if v.constant { SymbolKind::Constant } else { SymbolKind::Variable };
    let mut symbol = Symbol::new(v.name.clone(), kind, v.span);
    symbol.storage = v.storage;
    symbol.constant = v.constant;
    symbol.exported = exported;
    declare_or_report(ctx, symbol);
}

fn declare_enum(ctx: &mut ModuleAnalysis, e: &EnumDecl, exported: bool) {
    let mut enum_symbol = Symbol::new(e.name.clone(), SymbolKind::Constant, e.span);
    enum_symbol.constant = true;
    enum_symbol.exported = exported;
    declare_or_report(ctx, enum_symbol);

    for member in &e.members {
        let member_symbol = Symbol::new(member.name.clone(), SymbolKind::EnumMember, member.span);
        declare_or_report(ctx, member_symbol);
    }
}

fn declare_memory_map(ctx: &mut ModuleAnalysis, m: &MemoryMapDecl) {
    let mut symbol = Symbol::new(m.name().to_string(), SymbolKind::MapVariable, m.span());
    symbol.storage = crate::ast::StorageClass::Map;
    declare_or_report(ctx, symbol);

    if let MemoryMapDecl::SequentialStruct { fields, .. } | MemoryMapDecl::ExplicitStruct { fields, .. } = m {
        // Struct-map fields are not independently addressable symbols in
        // the module scope - they are resolved through `map.field`
        // member access, so the builder records only the map name here.
        let _ = fields;
    }
}

fn declare_import(ctx: &mut ModuleAnalysis, i: &crate::ast::ImportDecl) {
    if i.wildcard {
        ctx.wildcard_imports.push(i.clone());
        return;
    }
    for name in &i.identifiers {
        let mut symbol = Symbol::new(name.clone(), SymbolKind::ImportedSymbol, i.span);
        symbol.source_module = Some(i.dotted_module());
        declare_or_report(ctx, symbol);
    }
}

fn declare_or_report(ctx: &mut ModuleAnalysis, symbol: Symbol) -> bool {
    let span = symbol.span;
    let name = symbol.name.clone();
    match ctx.symtab.declare(symbol) {
        Ok(()) => true,
        Err(_) => {
            ctx.diagnostics.emit(
                DiagnosticCode::DUPLICATE_DECLARATION,
                format!("'{}' is already declared in this scope", name),
                span,
            );
            false
        }
    }
}

fn declare_block(ctx: &mut ModuleAnalysis, stmts: &[Stmt]) {
    for stmt in stmts {
        declare_stmt(ctx, stmt);
    }
}

fn declare_stmt(ctx: &mut ModuleAnalysis, stmt: &Stmt) {
    match stmt {
        Stmt::Let(v) => declare_variable(ctx, v, false),
        Stmt::Block(body) => with_scope(ctx, ScopeKind::Block, |ctx| declare_block(ctx, body)),
        Stmt::If { then_branch, else_branch, .. } => {
            with_scope(ctx, ScopeKind::Block, |ctx| declare_block(ctx, then_branch));
            if let Some(else_body) = else_branch {
                with_scope(ctx, ScopeKind::Block, |ctx| declare_block(ctx, else_body));
            }
        }
        Stmt::While { body, .. } => with_scope(ctx, ScopeKind::Loop, |ctx| declare_block(ctx, body)),
        Stmt::DoWhile { body, .. } => with_scope(ctx, ScopeKind::Loop, |ctx| declare_block(ctx, body)),
        Stmt::For { loop_var, body, span, .. } => {
            let loop_var = loop_var.clone();
            let span = *span;
            with_scope(ctx, ScopeKind::Loop, |ctx| {
                let symbol = Symbol::new(loop_var.clone(), SymbolKind::Variable, span);
                declare_or_report(ctx, symbol);
                declare_block(ctx, body);
            });
        }
        Stmt::Switch { cases, default, .. } => {
            for case in cases {
                let body = &case.body;
                with_scope(ctx, ScopeKind::Block, |ctx| declare_block(ctx, body));
            }
            if let Some(default_body) = default {
                with_scope(ctx, ScopeKind::Block, |ctx| declare_block(ctx, default_body));
            }
        }
        Stmt::ExprStmt(_) | Stmt::Return { .. } | Stmt::Break(_) | Stmt::Continue(_) => {}
    }
}

fn with_scope(ctx: &mut ModuleAnalysis, kind: ScopeKind, f: impl FnOnce(&mut ModuleAnalysis)) {
    ctx.symtab.enter_scope(kind);
    f(ctx);
    ctx.symtab.exit_scope();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ModuleDecl, Param};
    use crate::config::AnalysisConfig;
    use blend65_common::SourceSpan;

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    fn module(name: &str) -> ModuleDecl {
        ModuleDecl { name: vec![name.to_string()], explicit: true, span: span() }
    }

    #[test]
    fn declares_function_and_parameters_in_own_scope() {
        let program = Program {
            module: module("demo"),
            declarations: vec![Decl::Function(FunctionDecl {
                name: "add".into(),
                params: vec![
                    Param { name: "a".into(), type_annotation: "byte".into(), span: span() },
                    Param { name: "b".into(), type_annotation: "byte".into(), span: span() },
                ],
                return_type: Some("byte".into()),
                body: Some(vec![Stmt::Return { value: None, span: span() }]),
                exported: false,
                callback: false,
                stub: false,
                span: span(),
            })],
            span: span(),
        };

        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        run(&mut ctx, &program);

        assert!(!ctx.diagnostics.has_errors());
        let root = ctx.symtab.root();
        let func = ctx.symtab.lookup(root, "add").expect("function symbol");
        assert_eq!(func.kind, SymbolKind::Function);

        let func_scope = ctx.symtab.scopes().find(|s| s.kind == ScopeKind::Function).expect("function scope");
        assert!(func_scope.symbols.contains_key("a"));
        assert!(func_scope.symbols.contains_key("b"));
    }

    #[test]
    fn duplicate_declaration_in_same_scope_is_reported_and_recovered() {
        let program = Program {
            module: module("demo"),
            declarations: vec![
                Decl::Variable(VariableDecl {
                    name: "x".into(),
                    type_annotation: Some("byte".into()),
                    initializer: None,
                    storage: crate::ast::StorageClass::None,
                    explicit_address: None,
                    constant: false,
                    exported: false,
                    span: span(),
                }),
                Decl::Variable(VariableDecl {
                    name: "x".into(),
                    type_annotation: Some("byte".into()),
                    initializer: None,
                    storage: crate::ast::StorageClass::None,
                    explicit_address: None,
                    constant: false,
                    exported: false,
                    span: span(),
                }),
            ],
            span: span(),
        };

        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        run(&mut ctx, &program);

        assert_eq!(ctx.diagnostics.all().len(), 1);
        assert_eq!(ctx.diagnostics.all()[0].code, DiagnosticCode::DUPLICATE_DECLARATION);
    }

    #[test]
    fn stub_function_still_gets_a_scope_with_parameters() {
        let program = Program {
            module: module("demo"),
            declarations: vec![Decl::Function(FunctionDecl {
                name: "callback_sink".into(),
                params: vec![Param { name: "value".into(), type_annotation: "byte".into(), span: span() }],
                return_type: None,
                body: None,
                exported: false,
                callback: true,
                stub: true,
                span: span(),
            })],
            span: span(),
        };

        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        run(&mut ctx, &program);

        assert!(!ctx.diagnostics.has_errors());
        let func_scope = ctx.symtab.scopes().find(|s| s.kind == ScopeKind::Function).unwrap();
        assert!(func_scope.symbols.contains_key("value"));
    }

    #[test]
    fn wildcard_import_records_intent_without_declaring_symbols() {
        let program = Program {
            module: module("demo"),
            declarations: vec![Decl::Import(crate::ast::ImportDecl {
                identifiers: vec![],
                module_path: vec!["gfx".into(), "sprites".into()],
                wildcard: true,
                span: span(),
            })],
            span: span(),
        };

        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        run(&mut ctx, &program);

        assert_eq!(ctx.wildcard_imports.len(), 1);
        assert_eq!(ctx.symtab.total_symbol_count(), 0);
    }
}
