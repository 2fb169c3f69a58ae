//! VIC-II raster-timing analysis (spec 4.13): estimates each function's
//! CPU cycle cost from a per-statement cost table and flags callback
//! functions - the language's only declaration-level marker for a
//! function meant to be installed as a raster interrupt handler - whose
//! estimated cost does not fit inside a raster line's cycle budget.
//!
//! There is no codegen in this front end, so a cycle count here is a
//! static worst-case heuristic over the AST rather than a count of
//! emitted 6502 instructions: every statement and expression kind carries
//! an approximate cycle cost (spec 4.13's "table of per-instruction cycle
//! estimates"), a `for` loop's cost is multiplied by its trip count when
//! that folds to a constant, and an unresolved or self-recursive call
//! falls back to a flat estimate rather than diverging.

use std::collections::{HashMap, HashSet};

use blend65_common::DiagnosticCode;

use crate::analyzer::ModuleAnalysis;
use crate::ast::{Decl, Expr, FunctionDecl, Program, Stmt};

use super::zero_page::eval_const;

const RASTER_LINE_CYCLES: u32 = 63;
const SPRITE_DMA_CYCLES_PER_SPRITE: u32 = 2;

const COST_LITERAL: u32 = 2;
const COST_IDENTIFIER: u32 = 3;
const COST_BINARY_OP: u32 = 2;
const COST_UNARY_OP: u32 = 2;
const COST_INDEX: u32 = 2;
const COST_ASSIGN_STORE: u32 = 3;
const COST_CALL_OVERHEAD: u32 = 6;
const COST_BRANCH: u32 = 3;
const COST_RETURN: u32 = 6;
const COST_LOOP_OVERHEAD: u32 = 5;
const COST_BREAK_CONTINUE: u32 = 3;
/// Charged for a call this pass can't statically bound: an unresolved
/// callee, a stub with no body, or a callee already on the stack (a
/// recursive cycle this pass refuses to unwind).
const COST_UNBOUNDED_CALL: u32 = 20;

pub fn run(ctx: &mut ModuleAnalysis, program: &Program) {
    let mut functions = HashMap::new();
    for decl in &program.declarations {
        let (inner, _) = decl.unwrap_export();
        if let Decl::Function(f) = inner {
            functions.insert(f.name.as_str(), f);
        }
    }
    if functions.is_empty() {
        return;
    }

    let mut model = CostModel { functions, memo: HashMap::new(), in_progress: HashSet::new() };

    let sprite_penalty = ctx.config.vic2.sprite_count.saturating_mul(SPRITE_DMA_CYCLES_PER_SPRITE);
    let budget = RASTER_LINE_CYCLES.saturating_sub(ctx.config.vic2.bad_line_penalty).saturating_sub(sprite_penalty);

    for decl in &program.declarations {
        let (inner, _) = decl.unwrap_export();
        let Decl::Function(f) = inner else { continue };
        if !f.callback {
            continue;
        }
        let Some(body) = &f.body else { continue };

        let (total, loop_cycles) = model.cost_stmts(body);
        model.memo.insert(f.name.clone(), total);

        tracing::debug!(function = %f.name, cycles = total, loop_cycles, budget, "estimated raster-handler cost");

        if total > budget {
            ctx.diagnostics.emit(
                DiagnosticCode::RASTER_LINE_OVERRUN,
                format!(
                    "callback '{}' is estimated at {} cycles, which exceeds the raster-line budget of {} ({} cycles minus a {}-cycle bad-line penalty minus {} cycles for {} sprites)",
                    f.name, total, RASTER_LINE_CYCLES, budget, ctx.config.vic2.bad_line_penalty, sprite_penalty, ctx.config.vic2.sprite_count
                ),
                f.span,
            );
        }
    }
}

struct CostModel<'a> {
    functions: HashMap<&'a str, &'a FunctionDecl>,
    memo: HashMap<String, u32>,
    in_progress: HashSet<String>,
}

impl<'a> CostModel<'a> {
    /// Resolves a call target's own cost, memoized across every caller
    /// that reaches it. `in_progress` breaks infinite recursion on a call
    /// cycle; `functions` missing the name (cross-module calls, builtins)
    /// or a stub with no body both fall back to the flat estimate.
    fn cost_of(&mut self, name: &str) -> u32 {
        if let Some(cached) = self.memo.get(name) {
            return *cached;
        }
        if self.in_progress.contains(name) {
            return COST_UNBOUNDED_CALL;
        }
        let Some(body) = self.functions.get(name).and_then(|f| f.body.as_ref()) else {
            return COST_UNBOUNDED_CALL;
        };

        self.in_progress.insert(name.to_string());
        let (total, _) = self.cost_stmts(body);
        self.in_progress.remove(name);

        self.memo.insert(name.to_string(), total);
        total
    }

    /// Returns `(total cycles, cycles attributable to loop bodies)` for a
    /// statement sequence. The second figure is spec 4.13's separate
    /// "loop cycle estimate" - useful on its own when a handler's
    /// straight-line cost is small but its loop dominates the budget.
    fn cost_stmts(&mut self, stmts: &[Stmt]) -> (u32, u32) {
        let mut total = 0;
        let mut loop_cycles = 0;
        for stmt in stmts {
            let (t, l) = self.cost_stmt(stmt);
            total += t;
            loop_cycles += l;
        }
        (total, loop_cycles)
    }

    fn cost_stmt(&mut self, stmt: &Stmt) -> (u32, u32) {
        match stmt {
            Stmt::Block(body) => self.cost_stmts(body),
            Stmt::ExprStmt(e) => (self.cost_expr(e), 0),
            Stmt::Let(v) => {
                let init = v.initializer.as_ref().map(|e| COST_ASSIGN_STORE + self.cost_expr(e)).unwrap_or(0);
                (init, 0)
            }
            Stmt::Return { value, .. } => {
                let v = value.as_ref().map(|e| self.cost_expr(e)).unwrap_or(0);
                (COST_RETURN + v, 0)
            }
            Stmt::If { condition, then_branch, else_branch, .. } => {
                let cond = self.cost_expr(condition);
                let (then_total, then_loop) = self.cost_stmts(then_branch);
                let (else_total, else_loop) = match else_branch {
                    Some(e) => self.cost_stmts(e),
                    None => (0, 0),
                };
                // Worst-case path: whichever branch costs more.
                if then_total >= else_total {
                    (COST_BRANCH + cond + then_total, then_loop)
                } else {
                    (COST_BRANCH + cond + else_total, else_loop)
                }
            }
            Stmt::While { condition, body, .. } | Stmt::DoWhile { body, condition, .. } => {
                let cond = self.cost_expr(condition);
                let (body_total, body_loop) = self.cost_stmts(body);
                // Trip count isn't statically known for a general while
                // condition; a single iteration is reported as a floor.
                let per_iter = COST_LOOP_OVERHEAD + cond + body_total;
                (per_iter, per_iter + body_loop)
            }
            Stmt::For { start, end, step, body, .. } => {
                let (body_total, body_loop) = self.cost_stmts(body);
                let per_iter = COST_LOOP_OVERHEAD + body_total;
                match trip_count(start, end, step.as_ref()) {
                    Some(trips) => {
                        let total = per_iter.saturating_mul(trips).saturating_add(body_loop.saturating_mul(trips.saturating_sub(1)));
                        (total, total)
                    }
                    None => (per_iter, per_iter + body_loop),
                }
            }
            Stmt::Switch { value, cases, default, .. } => {
                let vc = self.cost_expr(value);
                let mut worst_total = 0;
                let mut worst_loop = 0;
                for case in cases {
                    let (t, l) = self.cost_stmts(&case.body);
                    if t >= worst_total {
                        worst_total = t;
                        worst_loop = l;
                    }
                }
                if let Some(d) = default {
                    let (t, l) = self.cost_stmts(d);
                    if t >= worst_total {
                        worst_total = t;
                        worst_loop = l;
                    }
                }
                (COST_BRANCH + vc + worst_total, worst_loop)
            }
            Stmt::Break(_) | Stmt::Continue(_) => (COST_BREAK_CONTINUE, 0),
        }
    }

    fn cost_expr(&mut self, expr: &Expr) -> u32 {
        match expr {
            Expr::Literal { .. } => COST_LITERAL,
            Expr::Identifier { .. } => COST_IDENTIFIER,
            Expr::Binary { lhs, rhs, .. } => COST_BINARY_OP + self.cost_expr(lhs) + self.cost_expr(rhs),
            Expr::Unary { operand, .. } => COST_UNARY_OP + self.cost_expr(operand),
            Expr::Ternary { condition, then_expr, else_expr, .. } => {
                COST_BRANCH + self.cost_expr(condition) + self.cost_expr(then_expr).max(self.cost_expr(else_expr))
            }
            Expr::Assignment { target, value, .. } => COST_ASSIGN_STORE + self.cost_expr(target) + self.cost_expr(value),
            Expr::Call { callee, args, .. } => {
                let mut cost = COST_CALL_OVERHEAD + self.cost_expr(callee);
                for arg in args {
                    cost += self.cost_expr(arg);
                }
                cost += match callee.as_ref() {
                    Expr::Identifier { name, .. } => self.cost_of(name),
                    _ => COST_UNBOUNDED_CALL,
                };
                cost
            }
            Expr::Index { object, index, .. } => COST_INDEX + self.cost_expr(object) + self.cost_expr(index),
            Expr::Member { object, .. } => self.cost_expr(object),
            Expr::ArrayLiteral { elements, .. } => elements.iter().map(|e| self.cost_expr(e)).sum(),
        }
    }
}

/// Folds a `for` loop's bounds to a trip count when `start`, `end`, and
/// any explicit `step` are all compile-time constants. Mirrors the
/// inclusive, `step`-defaults-to-1 semantics spec 4.8 gives `for` loops
/// for control-flow purposes.
fn trip_count(start: &Expr, end: &Expr, step: Option<&Expr>) -> Option<u32> {
    let start = eval_const(start)?;
    let end = eval_const(end)?;
    let step = match step {
        Some(s) => eval_const(s)?,
        None => 1,
    };
    if step == 0 {
        return None;
    }
    let span = end - start;
    if (step > 0 && span < 0) || (step < 0 && span > 0) {
        return Some(0);
    }
    u32::try_from(span / step + 1).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, CompoundOp, Literal, ModuleDecl, Param, Radix};
    use crate::config::{AnalysisConfig, Vic2Config};
    use blend65_common::SourceSpan;

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    fn lit(v: i64) -> Expr {
        Expr::Literal { value: Literal::Integer { value: v, radix: Radix::Decimal }, span: span() }
    }

    fn ident(name: &str) -> Expr {
        Expr::Identifier { name: name.into(), span: span() }
    }

    fn program_with(functions: Vec<FunctionDecl>) -> Program {
        Program {
            module: ModuleDecl { name: vec!["demo".into()], explicit: true, span: span() },
            declarations: functions.into_iter().map(Decl::Function).collect(),
            span: span(),
        }
    }

    #[test]
    fn tight_callback_does_not_overrun() {
        let handler = FunctionDecl {
            name: "irq".into(),
            params: vec![],
            return_type: None,
            body: Some(vec![Stmt::Return { value: None, span: span() }]),
            exported: false,
            callback: true,
            stub: false,
            span: span(),
        };
        let program = program_with(vec![handler]);

        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        run(&mut ctx, &program);

        assert!(!ctx.diagnostics.all().iter().any(|d| d.code == DiagnosticCode::RASTER_LINE_OVERRUN));
    }

    #[test]
    fn callback_with_a_large_unrolled_loop_overruns_the_raster_budget() {
        let mut config = AnalysisConfig::default();
        config.vic2 = Vic2Config { bad_line_penalty: 40, sprite_count: 8 };

        let body = vec![Stmt::ExprStmt(Expr::Assignment {
            target: Box::new(ident("acc")),
            op: CompoundOp::ASSIGN,
            value: Box::new(Expr::Binary { op: BinaryOp::ADD, lhs: Box::new(ident("acc")), rhs: Box::new(lit(1)), span: span() }),
            span: span(),
        })];
        let handler = FunctionDecl {
            name: "irq".into(),
            params: vec![],
            return_type: None,
            body: Some(vec![Stmt::For {
                loop_var: "i".into(),
                start: lit(0),
                end: lit(50),
                step: None,
                body,
                span: span(),
            }]),
            exported: false,
            callback: true,
            stub: false,
            span: span(),
        };
        let program = program_with(vec![handler]);

        let mut ctx = ModuleAnalysis::new("demo", config);
        run(&mut ctx, &program);

        assert!(ctx.diagnostics.all().iter().any(|d| d.code == DiagnosticCode::RASTER_LINE_OVERRUN));
    }

    #[test]
    fn non_callback_functions_are_never_checked_against_the_budget() {
        let body = vec![Stmt::For { loop_var: "i".into(), start: lit(0), end: lit(255), step: None, body: vec![], span: span() }];
        let plain = FunctionDecl { name: "busy".into(), params: vec![] as Vec<Param>, return_type: None, body: Some(body), exported: false, callback: false, stub: false, span: span() };
        let program = program_with(vec![plain]);

        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        run(&mut ctx, &program);

        assert!(!ctx.diagnostics.all().iter().any(|d| d.code == DiagnosticCode::RASTER_LINE_OVERRUN));
    }

    #[test]
    fn recursive_callback_falls_back_to_a_flat_estimate_instead_of_diverging() {
        let handler = FunctionDecl {
            name: "irq".into(),
            params: vec![],
            return_type: None,
            body: Some(vec![Stmt::ExprStmt(Expr::Call { callee: Box::new(ident("irq")), args: vec![], span: span() })]),
            exported: false,
            callback: true,
            stub: false,
            span: span(),
        };
        let program = program_with(vec![handler]);

        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        run(&mut ctx, &program);
    }
}
