//! Pass 2: type resolver (spec 4.5). Resolves every type-annotation string
//! and array-length expression attached to a declaration, and writes the
//! resolved `Type` onto the matching symbol. Runs only when pass 1 left no
//! errors (spec 5, "Pass order").

use blend65_common::DiagnosticCode;

use crate::analyzer::ModuleAnalysis;
use crate::ast::{Decl, Expr, FunctionDecl, Literal, Program, TypeAliasDecl, VariableDecl};
use crate::symtab::ScopeId;
use crate::types::Type;

/// Resolution statistics for one invocation (spec 4.5: "Statistics exposed:
/// resolved-count and failed-count per invocation").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub resolved: usize,
    pub failed: usize,
}

pub fn run(ctx: &mut ModuleAnalysis, program: &Program) -> ResolutionStats {
    let mut stats = ResolutionStats::default();
    let root = ctx.symtab.root();

    for decl in &program.declarations {
        resolve_top_level(ctx, root, decl, &mut stats);
    }

    stats
}

fn resolve_top_level(ctx: &mut ModuleAnalysis, root: ScopeId, decl: &Decl, stats: &mut ResolutionStats) {
    let (inner, _) = decl.unwrap_export();
    match inner {
        Decl::Function(f) => resolve_function(ctx, f, stats),
        Decl::Variable(v) => resolve_variable(ctx, root, v, stats),
        Decl::TypeAlias(t) => resolve_type_alias(ctx, root, t, stats),
        Decl::Enum(e) => resolve_enum(ctx, root, e),
        Decl::MemoryMap(_) | Decl::Import(_) => {}
        Decl::Export { .. } => unreachable!("export wrapper already unwrapped"),
    }
}

/// The spec leaves per-member enum typing unspecified beyond "numeric or
/// enum" at switch sites; members default to `byte` unless their own
/// initializer literal forces `word` (mirrors integer-literal promotion,
/// spec 4.6).
fn resolve_enum(ctx: &mut ModuleAnalysis, root: ScopeId, e: &crate::ast::EnumDecl) {
    if let Some(symbol) = ctx.symtab.lookup_mut(root, &e.name) {
        symbol.resolved_type = Some(Type::Byte);
    }
    for member in &e.members {
        let ty = match &member.value {
            Some(Expr::Literal { value: Literal::Integer { value, .. }, .. }) if !(0..=255).contains(value) => {
                Type::Word
            }
            _ => Type::Byte,
        };
        if let Some(symbol) = ctx.symtab.lookup_mut(root, &member.name) {
            symbol.resolved_type = Some(ty);
        }
    }
}

/// Resolves a type-annotation string, recursing into `T[n]`/`T[]` array
/// syntax as needed (spec 4.5: "Re-entrant resolution for nested arrays is
/// required").
pub(crate) fn resolve_type_name(ctx: &ModuleAnalysis, name: &str) -> Option<Type> {
    let name = name.trim();
    if let Some(rest) = name.strip_suffix("[]") {
        return resolve_type_name(ctx, rest).map(|element| ctx.types.array_of(element, None));
    }
    if let Some(open) = name.rfind('[') {
        if name.ends_with(']') {
            let base = &name[..open];
            let count_str = &name[open + 1..name.len() - 1];
            if let Ok(count) = count_str.trim().parse::<usize>() {
                return resolve_type_name(ctx, base).map(|element| ctx.types.array_of(element, Some(count)));
            }
            return None;
        }
    }
    ctx.types.builtin(name)
}

pub(crate) fn resolve_or_report(ctx: &mut ModuleAnalysis, name: &str, span: blend65_common::SourceSpan, stats: &mut ResolutionStats) -> Type {
    match resolve_type_name(ctx, name) {
        Some(ty) => {
            stats.resolved += 1;
            ty
        }
        None => {
            stats.failed += 1;
            ctx.diagnostics.emit(DiagnosticCode::UNKNOWN_TYPE, format!("unknown type '{}'", name), span);
            Type::Unknown
        }
    }
}

fn resolve_function(ctx: &mut ModuleAnalysis, f: &FunctionDecl, stats: &mut ResolutionStats) {
    let root = ctx.symtab.root();

    let param_types: Vec<Type> =
        f.params.iter().map(|p| resolve_or_report(ctx, &p.type_annotation, p.span, stats)).collect();

    // `return_type: None` means `void` (spec 4.5: "return type `null` means void").
    let return_type = match &f.return_type {
        Some(name) => resolve_or_report(ctx, name, f.span, stats),
        None => Type::Void,
    };

    if let Some(symbol) = ctx.symtab.lookup_mut(root, &f.name) {
        symbol.parameters = Some(param_types.clone());
        symbol.resolved_type = Some(Type::Function { params: param_types.clone(), ret: Box::new(return_type.clone()) });
    }

    // Parameters live in the function's own scope, created by pass 1 as a
    // sibling of every other function scope - find it by name match on the
    // parameter list, since scope ids are not threaded back from pass 1.
    if let Some(function_scope) = ctx
        .symtab
        .scopes()
        .find(|s| s.kind == crate::symtab::ScopeKind::Function && has_exact_params(s, &f.params))
        .map(|s| s.id)
    {
        for (param, ty) in f.params.iter().zip(param_types.iter()) {
            if let Some(symbol) = ctx.symtab.lookup_mut(function_scope, &param.name) {
                if symbol.resolved_type.is_none() {
                    symbol.resolved_type = Some(ty.clone());
                }
            }
        }
    }
}

fn has_exact_params(scope: &crate::symtab::Scope, params: &[crate::ast::Param]) -> bool {
    params.iter().all(|p| scope.symbols.contains_key(&p.name)) && scope.symbols.len() == params.len()
}

fn resolve_variable(ctx: &mut ModuleAnalysis, root: ScopeId, v: &VariableDecl, stats: &mut ResolutionStats) {
    let resolved = match &v.type_annotation {
        Some(name) => resolve_or_report(ctx, name, v.span, stats),
        None => infer_from_initializer(ctx, v.initializer.as_ref()),
    };
    if let Some(symbol) = ctx.symtab.lookup_mut(root, &v.name) {
        symbol.resolved_type = Some(resolved);
    }
}

/// A variable with no explicit annotation gets its type from a literal
/// initializer where trivially inferable; anything else resolves to
/// `Unknown` here and is refined by the checker pass in pass 4.
fn infer_from_initializer(ctx: &ModuleAnalysis, initializer: Option<&Expr>) -> Type {
    match initializer {
        Some(Expr::Literal { value: Literal::Integer { value, .. }, .. }) => {
            if (0..=255).contains(value) {
                Type::Byte
            } else {
                Type::Word
            }
        }
        Some(Expr::Literal { value: Literal::Bool(_), .. }) => Type::Boolean,
        Some(Expr::Literal { value: Literal::Str(_), .. }) => Type::String,
        _ => {
            let _ = ctx;
            Type::Unknown
        }
    }
}

fn resolve_type_alias(ctx: &mut ModuleAnalysis, root: ScopeId, t: &TypeAliasDecl, stats: &mut ResolutionStats) {
    let resolved = resolve_or_report(ctx, &t.aliased_type, t.span, stats);
    if let Some(symbol) = ctx.symtab.lookup_mut(root, &t.name) {
        symbol.resolved_type = Some(resolved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ModuleDecl, Param, Stmt};
    use crate::config::AnalysisConfig;
    use blend65_common::SourceSpan;

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    #[test]
    fn resolves_nested_array_type() {
        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        let resolved = resolve_type_name(&ctx, "byte[4][2]");
        assert_eq!(resolved, Some(ctx.types.array_of(ctx.types.array_of(Type::Byte, Some(4)), Some(2))));

        let unresolved = resolve_type_name(&ctx, "frobnicator");
        assert_eq!(unresolved, None);
        let _ = &mut ctx;
    }

    #[test]
    fn unknown_type_name_emits_diagnostic_and_sets_unknown() {
        let program = Program {
            module: ModuleDecl { name: vec!["demo".into()], explicit: true, span: span() },
            declarations: vec![Decl::Function(FunctionDecl {
                name: "f".into(),
                params: vec![Param { name: "x".into(), type_annotation: "nope".into(), span: span() }],
                return_type: None,
                body: None,
                exported: false,
                callback: false,
                stub: true,
                span: span(),
            })],
            span: span(),
        };

        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        crate::passes::builder::run(&mut ctx, &program);
        let stats = run(&mut ctx, &program);

        assert_eq!(stats.failed, 1);
        assert!(ctx.diagnostics.all().iter().any(|d| d.code == DiagnosticCode::UNKNOWN_TYPE));
    }

    #[test]
    fn void_return_type_resolves_when_annotation_absent() {
        let program = Program {
            module: ModuleDecl { name: vec!["demo".into()], explicit: true, span: span() },
            declarations: vec![Decl::Function(FunctionDecl {
                name: "proc".into(),
                params: vec![],
                return_type: None,
                body: Some(vec![Stmt::Return { value: None, span: span() }]),
                exported: false,
                callback: false,
                stub: false,
                span: span(),
            })],
            span: span(),
        };

        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        crate::passes::builder::run(&mut ctx, &program);
        run(&mut ctx, &program);

        let root = ctx.symtab.root();
        let symbol = ctx.symtab.lookup(root, "proc").unwrap();
        assert_eq!(symbol.resolved_type, Some(Type::Function { params: vec![], ret: Box::new(Type::Void) }));
    }
}
