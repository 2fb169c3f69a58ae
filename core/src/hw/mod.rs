//! Hardware-specific analyses (spec 4.11-4.13): zero-page allocation, SID
//! voice/filter conflicts, and VIC-II raster timing. Each runs per module,
//! after a module has passed the builder and resolver passes with no
//! errors (spec 5, item 6). `layout` (spec 4.14) is the one exception -
//! it aggregates across every module and is driven by the orchestrator
//! instead, once every module has finished.

pub mod layout;
pub mod sid;
pub mod vic2;
pub mod zero_page;

use std::collections::HashMap;

use crate::analyzer::ModuleAnalysis;
use crate::ast::{Decl, Expr, MemoryMapDecl, Program};

pub fn run_all(ctx: &mut ModuleAnalysis, program: &Program) {
    zero_page::run(ctx, program);
    sid::run(ctx, program);
    vic2::run(ctx, program);
}

/// A memory-map declaration's resolved address span, shared by the SID,
/// VIC-II, and global-layout analyses so each doesn't re-derive it from
/// the AST its own way.
#[derive(Debug, Clone)]
pub(crate) struct MapLayout {
    pub base: u16,
    pub size: u16,
    /// Field name -> absolute byte address, populated for struct maps only.
    pub fields: HashMap<String, u16>,
}

/// Resolves every memory-map declaration in `program` to its address span,
/// keyed by map name. Declarations whose address expressions don't fold to
/// a constant are skipped - every example in spec 8 uses literal addresses.
pub(crate) fn collect_map_layouts(program: &Program) -> HashMap<String, MapLayout> {
    let mut out = HashMap::new();
    for decl in &program.declarations {
        let (inner, _) = decl.unwrap_export();
        let Decl::MemoryMap(m) = inner else { continue };
        match m {
            MemoryMapDecl::Simple { name, address, .. } => {
                if let Some(base) = eval_u16(address) {
                    out.insert(name.clone(), MapLayout { base, size: 1, fields: HashMap::new() });
                }
            }
            MemoryMapDecl::Range { name, start, end, .. } => {
                if let (Some(base), Some(end)) = (eval_u16(start), eval_u16(end)) {
                    let size = end.saturating_sub(base).saturating_add(1);
                    out.insert(name.clone(), MapLayout { base, size, fields: HashMap::new() });
                }
            }
            MemoryMapDecl::SequentialStruct { name, base, fields, .. } => {
                if let Some(base) = eval_u16(base) {
                    let mut offset = base;
                    let mut field_addrs = HashMap::new();
                    for field in fields {
                        field_addrs.insert(field.name.clone(), offset);
                        offset = offset.saturating_add(type_size_hint(&field.type_annotation));
                    }
                    out.insert(name.clone(), MapLayout { base, size: offset.saturating_sub(base).max(1), fields: field_addrs });
                }
            }
            MemoryMapDecl::ExplicitStruct { name, base, fields, .. } => {
                if let Some(base) = eval_u16(base) {
                    let mut field_addrs = HashMap::new();
                    let mut end = base;
                    for field in fields {
                        let Some(addr) = field.address.as_ref().and_then(eval_u16) else { continue };
                        field_addrs.insert(field.name.clone(), addr);
                        end = end.max(addr.saturating_add(type_size_hint(&field.type_annotation)));
                    }
                    out.insert(name.clone(), MapLayout { base, size: end.saturating_sub(base).max(1), fields: field_addrs });
                }
            }
        }
    }
    out
}

fn type_size_hint(annotation: &str) -> u16 {
    match annotation {
        "word" => 2,
        _ => 1,
    }
}

fn eval_u16(expr: &Expr) -> Option<u16> {
    zero_page::eval_const(expr).and_then(|v| u16::try_from(v).ok())
}

/// Resolves an assignment target to the absolute byte address it writes,
/// if `target` names a symbol backed by one of `layouts`'s memory maps.
pub(crate) fn resolve_target_address(target: &Expr, layouts: &HashMap<String, MapLayout>) -> Option<u16> {
    match target {
        Expr::Identifier { name, .. } => layouts.get(name).map(|l| l.base),
        Expr::Member { object, property, .. } => {
            let Expr::Identifier { name, .. } = object.as_ref() else { return None };
            layouts.get(name).and_then(|l| l.fields.get(property).copied())
        }
        Expr::Index { object, index, .. } => {
            let Expr::Identifier { name, .. } = object.as_ref() else { return None };
            let layout = layouts.get(name)?;
            let offset = eval_u16(index)?;
            Some(layout.base.saturating_add(offset))
        }
        _ => None,
    }
}

/// Walks every assignment in `program`'s function bodies, calling `visit`
/// with the resolved target address and the enclosing function's name.
pub(crate) fn for_each_write(program: &Program, layouts: &HashMap<String, MapLayout>, mut visit: impl FnMut(&str, u16)) {
    for decl in &program.declarations {
        let (inner, _) = decl.unwrap_export();
        if let Decl::Function(f) = inner {
            if let Some(body) = &f.body {
                walk_stmts_for_writes(body, &f.name, layouts, &mut visit);
            }
        }
    }
}

fn walk_stmts_for_writes(stmts: &[crate::ast::Stmt], func: &str, layouts: &HashMap<String, MapLayout>, visit: &mut impl FnMut(&str, u16)) {
    use crate::ast::Stmt;
    for stmt in stmts {
        match stmt {
            Stmt::Block(b) => walk_stmts_for_writes(b, func, layouts, visit),
            Stmt::ExprStmt(e) => walk_expr_for_writes(e, func, layouts, visit),
            Stmt::Let(v) => {
                if let Some(init) = &v.initializer {
                    walk_expr_for_writes(init, func, layouts, visit);
                }
            }
            Stmt::Return { value, .. } => {
                if let Some(v) = value {
                    walk_expr_for_writes(v, func, layouts, visit);
                }
            }
            Stmt::If { condition, then_branch, else_branch, .. } => {
                walk_expr_for_writes(condition, func, layouts, visit);
                walk_stmts_for_writes(then_branch, func, layouts, visit);
                if let Some(e) = else_branch {
                    walk_stmts_for_writes(e, func, layouts, visit);
                }
            }
            Stmt::While { condition, body, .. } | Stmt::DoWhile { body, condition, .. } => {
                walk_expr_for_writes(condition, func, layouts, visit);
                walk_stmts_for_writes(body, func, layouts, visit);
            }
            Stmt::For { start, end, step, body, .. } => {
                walk_expr_for_writes(start, func, layouts, visit);
                walk_expr_for_writes(end, func, layouts, visit);
                if let Some(s) = step {
                    walk_expr_for_writes(s, func, layouts, visit);
                }
                walk_stmts_for_writes(body, func, layouts, visit);
            }
            Stmt::Switch { value, cases, default, .. } => {
                walk_expr_for_writes(value, func, layouts, visit);
                for case in cases {
                    walk_stmts_for_writes(&case.body, func, layouts, visit);
                }
                if let Some(d) = default {
                    walk_stmts_for_writes(d, func, layouts, visit);
                }
            }
            Stmt::Break(_) | Stmt::Continue(_) => {}
        }
    }
}

fn walk_expr_for_writes(expr: &Expr, func: &str, layouts: &HashMap<String, MapLayout>, visit: &mut impl FnMut(&str, u16)) {
    match expr {
        Expr::Assignment { target, value, .. } => {
            if let Some(addr) = resolve_target_address(target, layouts) {
                visit(func, addr);
            }
            walk_expr_for_writes(value, func, layouts, visit);
        }
        Expr::Binary { lhs, rhs, .. } => {
            walk_expr_for_writes(lhs, func, layouts, visit);
            walk_expr_for_writes(rhs, func, layouts, visit);
        }
        Expr::Unary { operand, .. } => walk_expr_for_writes(operand, func, layouts, visit),
        Expr::Ternary { condition, then_expr, else_expr, .. } => {
            walk_expr_for_writes(condition, func, layouts, visit);
            walk_expr_for_writes(then_expr, func, layouts, visit);
            walk_expr_for_writes(else_expr, func, layouts, visit);
        }
        Expr::Call { callee, args, .. } => {
            walk_expr_for_writes(callee, func, layouts, visit);
            for a in args {
                walk_expr_for_writes(a, func, layouts, visit);
            }
        }
        Expr::Index { object, index, .. } => {
            walk_expr_for_writes(object, func, layouts, visit);
            walk_expr_for_writes(index, func, layouts, visit);
        }
        Expr::Member { object, .. } => walk_expr_for_writes(object, func, layouts, visit),
        Expr::ArrayLiteral { elements, .. } => {
            for e in elements {
                walk_expr_for_writes(e, func, layouts, visit);
            }
        }
        Expr::Literal { .. } | Expr::Identifier { .. } => {}
    }
}
