//! Pass 5: control-flow analyzer (spec 4.8). Builds one basic-block graph
//! per function, determines reachability from the entry block, and flags
//! unreachable blocks as dead code plus functions that can fall off the
//! end without returning a value. Gated only on pass 1 (spec 5, item 5) -
//! it reads declared return-type syntax straight from the AST rather than
//! the resolver's `Type`, so it produces the same diagnostics whether or
//! not pass 2 ran.

use blend65_common::DiagnosticCode;

use crate::analyzer::ModuleAnalysis;
use crate::ast::{Decl, FunctionDecl, Program, Stmt};
use crate::cfg::{BlockId, ControlFlowGraph, EdgeKind};

struct LoopTargets {
    break_target: BlockId,
    continue_target: BlockId,
}

pub fn run(ctx: &mut ModuleAnalysis, program: &Program) {
    for decl in &program.declarations {
        let (inner, _) = decl.unwrap_export();
        if let Decl::Function(f) = inner {
            analyze_function(ctx, f);
        }
    }
}

fn analyze_function(ctx: &mut ModuleAnalysis, f: &FunctionDecl) {
    let Some(body) = &f.body else { return };

    let mut cfg = ControlFlowGraph::new();
    let entry = cfg.entry;
    let mut loop_stack = Vec::new();
    let tail = build_stmts(&mut cfg, entry, body, &mut loop_stack);

    let falls_off_end = tail.is_some();
    if let Some(tail_block) = tail {
        cfg.mark_terminal(tail_block);
    }

    let reachable = cfg.reachable_from_entry();

    for block in cfg.blocks() {
        if reachable.contains(&block.id) || block.statements.is_empty() {
            continue;
        }
        let first = &block.statements[0];
        ctx.diagnostics.emit(DiagnosticCode::DEAD_CODE, "unreachable code".to_string(), first.span());
    }

    if falls_off_end && f.return_type.is_some() {
        if let Some(tail_block) = tail {
            if reachable.contains(&tail_block) {
                ctx.diagnostics.emit(
                    DiagnosticCode::MISSING_RETURN,
                    format!("function '{}' can fall off the end without returning a value", f.name),
                    f.span,
                );
            }
        }
    }

    ctx.cfgs.insert(f.name.clone(), cfg);
}

/// Builds blocks for `stmts` starting at `current`. Returns the block
/// subsequent statements (in the enclosing list) should continue into, or
/// `None` if this sequence has no possible fallthrough - its last
/// statement was a `return`, `break`, or `continue` (spec 4.8,
/// block-partition rule: "a new block starts ... at the statement
/// immediately following a terminal statement").
fn build_stmts(
    cfg: &mut ControlFlowGraph,
    mut current: BlockId,
    stmts: &[Stmt],
    loop_stack: &mut Vec<LoopTargets>,
) -> Option<BlockId> {
    let mut idx = 0;
    while idx < stmts.len() {
        let stmt = &stmts[idx];
        let is_last = idx + 1 == stmts.len();

        match stmt {
            Stmt::Return { .. } => {
                cfg.block_mut(current).statements.push(stmt.clone());
                cfg.mark_terminal(current);
                if is_last {
                    return None;
                }
                current = cfg.new_block();
            }
            Stmt::Break(_) => {
                cfg.block_mut(current).statements.push(stmt.clone());
                if let Some(target) = loop_stack.last() {
                    cfg.add_edge(current, target.break_target, EdgeKind::BreakTarget);
                }
                if is_last {
                    return None;
                }
                current = cfg.new_block();
            }
            Stmt::Continue(_) => {
                cfg.block_mut(current).statements.push(stmt.clone());
                if let Some(target) = loop_stack.last() {
                    cfg.add_edge(current, target.continue_target, EdgeKind::ContinueTarget);
                }
                if is_last {
                    return None;
                }
                current = cfg.new_block();
            }
            Stmt::If { then_branch, else_branch, .. } => {
                cfg.block_mut(current).statements.push(stmt.clone());
                let follow = cfg.new_block();

                let then_entry = cfg.new_block();
                cfg.add_edge(current, then_entry, EdgeKind::BranchTaken);
                if let Some(then_tail) = build_stmts(cfg, then_entry, then_branch, loop_stack) {
                    cfg.add_edge(then_tail, follow, EdgeKind::FallThrough);
                }

                if let Some(else_branch) = else_branch {
                    let else_entry = cfg.new_block();
                    cfg.add_edge(current, else_entry, EdgeKind::BranchNotTaken);
                    if let Some(else_tail) = build_stmts(cfg, else_entry, else_branch, loop_stack) {
                        cfg.add_edge(else_tail, follow, EdgeKind::FallThrough);
                    }
                } else {
                    cfg.add_edge(current, follow, EdgeKind::BranchNotTaken);
                }

                current = follow;
            }
            Stmt::While { body, .. } => {
                let condition = cfg.new_block();
                cfg.add_edge(current, condition, EdgeKind::FallThrough);
                cfg.block_mut(condition).statements.push(stmt.clone());

                let follow = cfg.new_block();
                let body_entry = cfg.new_block();
                cfg.add_edge(condition, body_entry, EdgeKind::BranchTaken);
                cfg.add_edge(condition, follow, EdgeKind::BranchNotTaken);

                loop_stack.push(LoopTargets { break_target: follow, continue_target: condition });
                if let Some(body_tail) = build_stmts(cfg, body_entry, body, loop_stack) {
                    cfg.add_edge(body_tail, condition, EdgeKind::LoopBack);
                }
                loop_stack.pop();

                current = follow;
            }
            Stmt::DoWhile { body, .. } => {
                let body_entry = cfg.new_block();
                cfg.add_edge(current, body_entry, EdgeKind::FallThrough);

                let condition = cfg.new_block();
                let follow = cfg.new_block();
                cfg.block_mut(condition).statements.push(stmt.clone());
                cfg.add_edge(condition, body_entry, EdgeKind::LoopBack);
                cfg.add_edge(condition, follow, EdgeKind::BranchNotTaken);

                loop_stack.push(LoopTargets { break_target: follow, continue_target: condition });
                if let Some(body_tail) = build_stmts(cfg, body_entry, body, loop_stack) {
                    cfg.add_edge(body_tail, condition, EdgeKind::FallThrough);
                }
                loop_stack.pop();

                current = follow;
            }
            Stmt::For { body, .. } => {
                let header = cfg.new_block();
                cfg.add_edge(current, header, EdgeKind::FallThrough);
                cfg.block_mut(header).statements.push(stmt.clone());

                let follow = cfg.new_block();
                let body_entry = cfg.new_block();
                cfg.add_edge(header, body_entry, EdgeKind::BranchTaken);
                cfg.add_edge(header, follow, EdgeKind::BranchNotTaken);

                loop_stack.push(LoopTargets { break_target: follow, continue_target: header });
                if let Some(body_tail) = build_stmts(cfg, body_entry, body, loop_stack) {
                    cfg.add_edge(body_tail, header, EdgeKind::LoopBack);
                }
                loop_stack.pop();

                current = follow;
            }
            Stmt::Switch { cases, default, .. } => {
                cfg.block_mut(current).statements.push(stmt.clone());
                let follow = cfg.new_block();

                for case in cases {
                    let case_entry = cfg.new_block();
                    cfg.add_edge(current, case_entry, EdgeKind::BranchTaken);
                    // Cases are non-fall-through by default (spec 9, open
                    // question resolution): each case's exit goes straight
                    // to `follow`, never into the next case.
                    if let Some(case_tail) = build_stmts(cfg, case_entry, &case.body, loop_stack) {
                        cfg.add_edge(case_tail, follow, EdgeKind::FallThrough);
                    }
                }
                if let Some(default_body) = default {
                    let default_entry = cfg.new_block();
                    cfg.add_edge(current, default_entry, EdgeKind::BranchNotTaken);
                    if let Some(default_tail) = build_stmts(cfg, default_entry, default_body, loop_stack) {
                        cfg.add_edge(default_tail, follow, EdgeKind::FallThrough);
                    }
                } else {
                    cfg.add_edge(current, follow, EdgeKind::BranchNotTaken);
                }

                current = follow;
            }
            Stmt::Block(body) => {
                if let Some(tail) = build_stmts(cfg, current, body, loop_stack) {
                    current = tail;
                } else if is_last {
                    return None;
                } else {
                    current = cfg.new_block();
                }
            }
            Stmt::ExprStmt(_) | Stmt::Let(_) => {
                cfg.block_mut(current).statements.push(stmt.clone());
            }
        }

        idx += 1;
    }

    Some(current)
}
