//! Zero-page allocation analysis (spec 4.11): validates `@zp` placements
//! against the platform's reserved regions, then scores every zero-page
//! variable for placement priority, classifies its access pattern, and
//! picks a register preference.
//!
//! Address allocation and reserved-region validation only consider
//! module-level (root-scope) `@zp` declarations - the platform's
//! zero-page window is a single static resource shared by the whole
//! program, and a function-local `@zp let` would need the same static
//! slot reused across every call, which the language gives no syntax to
//! express. Scoring and classification still run over every zero-page
//! symbol regardless of scope.

use std::collections::{HashMap, HashSet};

use blend65_common::{DiagnosticCode, SourceSpan};

use crate::analyzer::ModuleAnalysis;
use crate::ast::{BinaryOp, Decl, Expr, Literal, Program, Stmt, StorageClass, UnaryOp};
use crate::symtab::{AccessPattern, Metadata, Register, RegisterPreference, SymbolKind};
use crate::types::Type;

/// One variable's resolved zero-page slot, handed to the global
/// memory-layout builder (spec 4.14) by the orchestrator.
#[derive(Debug, Clone)]
pub struct ZeroPageAllocation {
    pub name: String,
    pub address: u16,
    pub size: u16,
    pub span: SourceSpan,
}

pub fn run(ctx: &mut ModuleAnalysis, program: &Program) {
    allocate_and_validate(ctx, program);
    score_and_classify(ctx, program);
}

fn allocate_and_validate(ctx: &mut ModuleAnalysis, program: &Program) {
    let safe_start = *ctx.config.zero_page.safe.start();
    let safe_end = *ctx.config.zero_page.safe.end();
    let mut cursor = safe_start;

    for decl in &program.declarations {
        let (inner, _) = decl.unwrap_export();
        let Decl::Variable(v) = inner else { continue };
        if v.storage != StorageClass::ZeroPage {
            continue;
        }

        let size = ctx
            .symtab
            .lookup_in_scope(ctx.symtab.root(), &v.name)
            .and_then(|s| s.resolved_type.as_ref())
            .map(|t| t.size_bytes().max(1) as u16)
            .unwrap_or(1);

        let explicit = v.explicit_address.as_ref().and_then(eval_const_address);
        let start = explicit.unwrap_or(cursor);

        if start < safe_start || start > safe_end {
            ctx.diagnostics.emit(
                DiagnosticCode::RESERVED_ZERO_PAGE,
                format!("'{}' starts at ${:02X}, which is outside the safe zero-page range ${:02X}-${:02X}", v.name, start, safe_start, safe_end),
                v.span,
            );
        } else if start.saturating_add(size.saturating_sub(1)) > safe_end {
            ctx.diagnostics.emit(
                DiagnosticCode::ZERO_PAGE_ALLOCATION_INTO_RESERVED,
                format!("'{}' at ${:02X} is {} byte(s) wide and spills past the safe range (ends at ${:02X}-${:02X})", v.name, start, size, safe_end + 1, ctx.config.zero_page.reserved_high.end()),
                v.span,
            );
        }

        ctx.zero_page_allocations.push(ZeroPageAllocation { name: v.name.clone(), address: start, size, span: v.span });

        cursor = if explicit.is_some() { cursor.max(start.saturating_add(size)) } else { start.saturating_add(size) };
    }
}

/// Best-effort constant folding for address expressions (spec 4.11
/// allocations are always small literal arithmetic, e.g. `$02` or
/// `base + 1`, never something that needs full evaluation).
fn eval_const_address(expr: &Expr) -> Option<u16> {
    eval_const(expr).and_then(|v| u16::try_from(v).ok())
}

pub(crate) fn eval_const(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Literal { value: Literal::Integer { value, .. }, .. } => Some(*value),
        Expr::Unary { op: UnaryOp::NEGATE, operand, .. } => eval_const(operand).map(|v| -v),
        Expr::Binary { op, lhs, rhs, .. } => {
            let l = eval_const(lhs)?;
            let r = eval_const(rhs)?;
            match op {
                BinaryOp::ADD => Some(l + r),
                BinaryOp::SUB => Some(l - r),
                BinaryOp::MUL => Some(l * r),
                BinaryOp::BIT_OR => Some(l | r),
                BinaryOp::BIT_AND => Some(l & r),
                BinaryOp::SHL => Some(l << r),
                _ => None,
            }
        }
        _ => None,
    }
}

#[derive(Default)]
struct VarStats {
    references: u32,
    max_loop_depth: usize,
    hot_path: bool,
    arithmetic_refs: u32,
    index_or_counter: bool,
    pointer_target: bool,
    outer_counter: bool,
    inner_counter: bool,
    stride: Option<i64>,
}

fn score_and_classify(ctx: &mut ModuleAnalysis, program: &Program) {
    let zp_names: HashSet<String> = ctx
        .symtab
        .all_symbols()
        .filter(|s| s.storage == StorageClass::ZeroPage && matches!(s.kind, SymbolKind::Variable | SymbolKind::Constant))
        .map(|s| s.name.clone())
        .collect();
    if zp_names.is_empty() {
        return;
    }

    let mut stats: HashMap<String, VarStats> = HashMap::new();
    for decl in &program.declarations {
        let (inner, _) = decl.unwrap_export();
        match inner {
            Decl::Function(f) => {
                if let Some(body) = &f.body {
                    walk_stmts(body, 0, &zp_names, &mut stats);
                }
            }
            Decl::Variable(v) => {
                if let Some(init) = &v.initializer {
                    walk_expr(init, 0, false, false, &zp_names, &mut stats);
                }
            }
            _ => {}
        }
    }

    for (name, s) in &stats {
        let resolved_type = ctx.symtab.lookup_in_scope(ctx.symtab.root(), name).and_then(|sym| sym.resolved_type.clone());

        let access_frequency = (s.references * 3).min(30);
        let loop_depth_bonus = ((s.max_loop_depth as u32) * 8).min(25);
        let hot_path_bonus = if s.hot_path { 20 } else { 0 };
        let size_bonus = match resolved_type {
            Some(Type::Byte) => 10,
            Some(Type::Word) => 5,
            _ => 0,
        };
        let arithmetic_fraction = if s.references > 0 { s.arithmetic_refs as f32 / s.references as f32 } else { 0.0 };
        let arithmetic_intensity = (arithmetic_fraction * 10.0).round() as u32;
        let index_bonus = if s.index_or_counter { 5 } else { 0 };

        let priority = (access_frequency + loop_depth_bonus + hot_path_bonus + size_bonus + arithmetic_intensity + index_bonus).min(100) as u8;

        let pattern = if let Some(stride) = s.stride {
            if stride == 1 { AccessPattern::Sequential } else { AccessPattern::Strided }
        } else if s.hot_path {
            AccessPattern::HotPath
        } else if s.references <= 1 {
            AccessPattern::Single
        } else {
            AccessPattern::Random
        };

        let preference = if s.pointer_target {
            RegisterPreference { register: Some(Register::Y), rationale: "used as an indirect pointer target, required for (zp),Y addressing".into() }
        } else if s.index_or_counter && !s.outer_counter && !s.inner_counter {
            RegisterPreference { register: Some(Register::X), rationale: "used as an array index".into() }
        } else if s.outer_counter {
            RegisterPreference { register: Some(Register::X), rationale: "outer-loop counter".into() }
        } else if s.inner_counter {
            RegisterPreference { register: Some(Register::Y), rationale: "inner-loop counter, nests with an X-held outer counter".into() }
        } else if arithmetic_fraction > 0.5 {
            RegisterPreference { register: Some(Register::A), rationale: "high arithmetic intensity favors the accumulator".into() }
        } else {
            RegisterPreference { register: None, rationale: "no dominant access pattern".into() }
        };

        if let Some(sym) = ctx.symtab.all_symbols_mut().find(|sym| &sym.name == name) {
            sym.metadata.set(Metadata::ZeroPagePriority(priority));
            sym.metadata.set(Metadata::AccessPattern(pattern));
            sym.metadata.set(Metadata::ArithmeticIntensity(arithmetic_fraction));
            sym.metadata.set(Metadata::RegisterPreference(preference));
            if let Some(stride) = s.stride {
                sym.metadata.set(Metadata::LoopInductionStride(stride));
            }
        }
    }
}

fn body_has_loop(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|s| match s {
        Stmt::While { .. } | Stmt::For { .. } | Stmt::DoWhile { .. } => true,
        Stmt::Block(b) => body_has_loop(b),
        Stmt::If { then_branch, else_branch, .. } => body_has_loop(then_branch) || else_branch.as_deref().is_some_and(body_has_loop),
        Stmt::Switch { cases, default, .. } => cases.iter().any(|c| body_has_loop(&c.body)) || default.as_deref().is_some_and(body_has_loop),
        _ => false,
    })
}

fn walk_stmts(stmts: &[Stmt], loop_depth: usize, zp: &HashSet<String>, stats: &mut HashMap<String, VarStats>) {
    for stmt in stmts {
        walk_stmt(stmt, loop_depth, zp, stats);
    }
}

fn walk_stmt(stmt: &Stmt, loop_depth: usize, zp: &HashSet<String>, stats: &mut HashMap<String, VarStats>) {
    match stmt {
        Stmt::Block(body) => walk_stmts(body, loop_depth, zp, stats),
        Stmt::ExprStmt(e) => walk_expr(e, loop_depth, false, false, zp, stats),
        Stmt::Let(v) => {
            if let Some(init) = &v.initializer {
                walk_expr(init, loop_depth, false, false, zp, stats);
            }
        }
        Stmt::Return { value, .. } => {
            if let Some(v) = value {
                walk_expr(v, loop_depth, false, false, zp, stats);
            }
        }
        Stmt::If { condition, then_branch, else_branch, .. } => {
            walk_expr(condition, loop_depth, false, false, zp, stats);
            walk_stmts(then_branch, loop_depth, zp, stats);
            if let Some(else_body) = else_branch {
                walk_stmts(else_body, loop_depth, zp, stats);
            }
        }
        Stmt::While { condition, body, .. } => {
            walk_expr(condition, loop_depth, false, false, zp, stats);
            let innermost = !body_has_loop(body);
            walk_stmts(body, loop_depth + 1, zp, stats);
            if innermost {
                mark_hot_path(body, zp, stats);
            }
        }
        Stmt::DoWhile { body, condition, .. } => {
            walk_expr(condition, loop_depth, false, false, zp, stats);
            let innermost = !body_has_loop(body);
            walk_stmts(body, loop_depth + 1, zp, stats);
            if innermost {
                mark_hot_path(body, zp, stats);
            }
        }
        Stmt::For { loop_var, start, end, step, body, .. } => {
            walk_expr(start, loop_depth, false, false, zp, stats);
            walk_expr(end, loop_depth, false, false, zp, stats);
            if let Some(step) = step {
                walk_expr(step, loop_depth, false, false, zp, stats);
            }
            if zp.contains(loop_var) {
                let entry = stats.entry(loop_var.clone()).or_default();
                entry.references += 1;
                entry.index_or_counter = true;
                entry.stride = Some(step.as_ref().and_then(eval_const).unwrap_or(1));
                if loop_depth == 0 {
                    entry.outer_counter = true;
                } else {
                    entry.inner_counter = true;
                }
            }
            let innermost = !body_has_loop(body);
            walk_stmts(body, loop_depth + 1, zp, stats);
            if innermost {
                mark_hot_path(body, zp, stats);
            }
        }
        Stmt::Switch { value, cases, default, .. } => {
            walk_expr(value, loop_depth, false, false, zp, stats);
            for case in cases {
                walk_stmts(&case.body, loop_depth, zp, stats);
            }
            if let Some(default_body) = default {
                walk_stmts(default_body, loop_depth, zp, stats);
            }
        }
        Stmt::Break(_) | Stmt::Continue(_) => {}
    }
}

/// Flags every zero-page identifier referenced directly in `body` as a
/// hot-path reference. Called only for a loop whose body contains no
/// nested loop, so every reference here is genuinely in the innermost
/// loop that reaches it.
fn mark_hot_path(body: &[Stmt], zp: &HashSet<String>, stats: &mut HashMap<String, VarStats>) {
    fn walk(e: &Expr, zp: &HashSet<String>, stats: &mut HashMap<String, VarStats>) {
        if let Expr::Identifier { name, .. } = e {
            if zp.contains(name) {
                stats.entry(name.clone()).or_default().hot_path = true;
            }
        }
        for child in direct_children(e) {
            walk(child, zp, stats);
        }
    }
    for stmt in body {
        for e in stmt_exprs(stmt) {
            walk(e, zp, stats);
        }
    }
}

fn stmt_exprs(stmt: &Stmt) -> Vec<&Expr> {
    match stmt {
        Stmt::ExprStmt(e) => vec![e],
        Stmt::Let(v) => v.initializer.iter().collect(),
        Stmt::Return { value, .. } => value.iter().collect(),
        Stmt::If { condition, .. } => vec![condition],
        Stmt::While { condition, .. } => vec![condition],
        Stmt::DoWhile { condition, .. } => vec![condition],
        Stmt::For { start, end, step, .. } => {
            let mut v = vec![start, end];
            v.extend(step.iter());
            v
        }
        Stmt::Switch { value, .. } => vec![value],
        Stmt::Block(_) | Stmt::Break(_) | Stmt::Continue(_) => vec![],
    }
}

fn direct_children(e: &Expr) -> Vec<&Expr> {
    match e {
        Expr::Literal { .. } | Expr::Identifier { .. } => vec![],
        Expr::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
        Expr::Unary { operand, .. } => vec![operand.as_ref()],
        Expr::Ternary { condition, then_expr, else_expr, .. } => vec![condition.as_ref(), then_expr.as_ref(), else_expr.as_ref()],
        Expr::Assignment { target, value, .. } => vec![target.as_ref(), value.as_ref()],
        Expr::Call { callee, args, .. } => {
            let mut v = vec![callee.as_ref()];
            v.extend(args.iter());
            v
        }
        Expr::Index { object, index, .. } => vec![object.as_ref(), index.as_ref()],
        Expr::Member { object, .. } => vec![object.as_ref()],
        Expr::ArrayLiteral { elements, .. } => elements.iter().collect(),
    }
}

fn walk_expr(expr: &Expr, loop_depth: usize, arithmetic_ctx: bool, index_ctx: bool, zp: &HashSet<String>, stats: &mut HashMap<String, VarStats>) {
    match expr {
        Expr::Identifier { name, .. } => {
            if zp.contains(name) {
                let entry = stats.entry(name.clone()).or_default();
                entry.references += 1;
                entry.max_loop_depth = entry.max_loop_depth.max(loop_depth);
                if arithmetic_ctx {
                    entry.arithmetic_refs += 1;
                }
                if index_ctx {
                    entry.index_or_counter = true;
                }
            }
        }
        Expr::Literal { .. } => {}
        Expr::Binary { op, lhs, rhs, .. } => {
            let arith = op.is_arithmetic_or_bitwise();
            walk_expr(lhs, loop_depth, arith, false, zp, stats);
            walk_expr(rhs, loop_depth, arith, false, zp, stats);
        }
        Expr::Unary { operand, .. } => walk_expr(operand, loop_depth, arithmetic_ctx, false, zp, stats),
        Expr::Ternary { condition, then_expr, else_expr, .. } => {
            walk_expr(condition, loop_depth, false, false, zp, stats);
            walk_expr(then_expr, loop_depth, false, false, zp, stats);
            walk_expr(else_expr, loop_depth, false, false, zp, stats);
        }
        Expr::Assignment { target, value, .. } => {
            walk_expr(target, loop_depth, false, false, zp, stats);
            walk_expr(value, loop_depth, false, false, zp, stats);
        }
        Expr::Call { callee, args, .. } => {
            walk_expr(callee, loop_depth, false, false, zp, stats);
            for a in args {
                walk_expr(a, loop_depth, false, false, zp, stats);
            }
        }
        Expr::Index { object, index, .. } => {
            if let Expr::Identifier { name, .. } = object.as_ref() {
                if zp.contains(name) {
                    stats.entry(name.clone()).or_default().pointer_target = true;
                }
            }
            walk_expr(object, loop_depth, false, false, zp, stats);
            walk_expr(index, loop_depth, false, true, zp, stats);
        }
        Expr::Member { object, .. } => walk_expr(object, loop_depth, false, false, zp, stats),
        Expr::ArrayLiteral { elements, .. } => {
            for e in elements {
                walk_expr(e, loop_depth, false, false, zp, stats);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ModuleDecl, VariableDecl};
    use crate::config::AnalysisConfig;
    use blend65_common::SourceSpan;

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    fn module(name: &str) -> ModuleDecl {
        ModuleDecl { name: vec![name.to_string()], explicit: true, span: span() }
    }

    #[test]
    fn explicit_address_inside_reserved_low_is_flagged() {
        let program = Program {
            module: module("demo"),
            declarations: vec![Decl::Variable(VariableDecl {
                name: "x".into(),
                type_annotation: Some("byte".into()),
                initializer: None,
                storage: StorageClass::ZeroPage,
                explicit_address: Some(Expr::Literal { value: Literal::Integer { value: 0x00, radix: crate::ast::Radix::Hex }, span: span() }),
                constant: false,
                exported: false,
                span: span(),
            })],
            span: span(),
        };

        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        crate::passes::builder::run(&mut ctx, &program);
        crate::passes::resolver::run(&mut ctx, &program);
        run(&mut ctx, &program);

        assert!(ctx.diagnostics.all().iter().any(|d| d.code == DiagnosticCode::RESERVED_ZERO_PAGE));
    }

    #[test]
    fn auto_allocated_variable_gets_a_priority_score() {
        let program = Program {
            module: module("demo"),
            declarations: vec![Decl::Variable(VariableDecl {
                name: "counter".into(),
                type_annotation: Some("byte".into()),
                initializer: None,
                storage: StorageClass::ZeroPage,
                explicit_address: None,
                constant: false,
                exported: false,
                span: span(),
            })],
            span: span(),
        };

        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        crate::passes::builder::run(&mut ctx, &program);
        crate::passes::resolver::run(&mut ctx, &program);
        run(&mut ctx, &program);

        assert!(!ctx.diagnostics.has_errors());
        assert_eq!(ctx.zero_page_allocations.len(), 1);
        assert_eq!(ctx.zero_page_allocations[0].address, 0x02);
        let sym = ctx.symtab.lookup_in_scope(ctx.symtab.root(), "counter").unwrap();
        assert!(sym.metadata.zero_page_priority().is_some());
    }
}
