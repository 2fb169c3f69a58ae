//! Pass 4: type checker (spec 4.6). Traverses every function body and
//! module-level initializer, infers the type of every expression, and
//! validates assignability, operand types, return-value types,
//! control-flow-condition types, call arity/argument types, and index
//! operand types. Runs only when pass 2 left no errors (spec 5).
//!
//! Navigating back into the scopes pass 1 already built (rather than
//! creating new ones) requires walking the scope tree's `children` in the
//! same order pass 1 created them - `ScopeCursor` does that bookkeeping so
//! the rest of this module can talk about "the scope for this block" the
//! same way pass 1 does.

use blend65_common::{DiagnosticCode, SourceSpan};

use crate::analyzer::ModuleAnalysis;
use crate::ast::{BinaryOp, Decl, Expr, FunctionDecl, Literal, Program, Stmt, SwitchCase, VariableDecl};
use crate::call_graph::UNRESOLVED_CALLEE;
use crate::symtab::{ScopeId, ScopeKind};
use crate::types::Type;

use super::resolver::{resolve_or_report, ResolutionStats};

/// Tracks, for each scope on the current path, which child scope comes
/// next - mirrors the order pass 1's `enter_scope` calls created them in.
struct ScopeCursor {
    frames: Vec<(ScopeId, usize)>,
}

impl ScopeCursor {
    fn new(root: ScopeId) -> Self {
        Self { frames: vec![(root, 0)] }
    }

    fn current(&self) -> ScopeId {
        self.frames.last().expect("cursor always has a frame").0
    }

    /// Descend into the next not-yet-visited child of the current scope.
    fn enter_next_child(&mut self, ctx: &ModuleAnalysis) -> ScopeId {
        let (parent, index) = *self.frames.last().expect("cursor always has a frame");
        let child = ctx.symtab.scope(parent).and_then(|s| s.children.get(index)).copied().unwrap_or(parent);
        self.frames.last_mut().unwrap().1 += 1;
        self.frames.push((child, 0));
        child
    }

    fn exit(&mut self) {
        self.frames.pop();
    }
}

/// The return type of the function body currently being checked, or
/// `None` while checking a module-level initializer outside any function.
struct FnCtx {
    name: String,
    return_type: Type,
}

pub fn run(ctx: &mut ModuleAnalysis, program: &Program) {
    let root = ctx.symtab.root();
    let mut cursor = ScopeCursor::new(root);

    for decl in &program.declarations {
        check_top_level(ctx, &mut cursor, decl);
    }
}

fn check_top_level(ctx: &mut ModuleAnalysis, cursor: &mut ScopeCursor, decl: &Decl) {
    let (inner, _) = decl.unwrap_export();
    match inner {
        Decl::Function(f) => check_function(ctx, cursor, f),
        Decl::Variable(v) => check_module_variable(ctx, cursor, v),
        Decl::Enum(e) => {
            for member in &e.members {
                if let Some(value) = &member.value {
                    expr_type(ctx, cursor, None, value);
                }
            }
        }
        Decl::TypeAlias(_) | Decl::MemoryMap(_) | Decl::Import(_) => {}
        Decl::Export { .. } => unreachable!("export wrapper already unwrapped"),
    }
}

fn check_module_variable(ctx: &mut ModuleAnalysis, cursor: &mut ScopeCursor, v: &VariableDecl) {
    let Some(initializer) = &v.initializer else { return };
    let value_ty = expr_type(ctx, cursor, None, initializer);
    let root = ctx.symtab.root();
    let declared_ty = ctx.symtab.lookup(root, &v.name).and_then(|s| s.resolved_type.clone()).unwrap_or(Type::Unknown);
    if declared_ty != Type::Unknown && !ctx.types.can_assign(&value_ty, &declared_ty) {
        ctx.diagnostics.emit(
            DiagnosticCode::TYPE_MISMATCH,
            format!("cannot initialize '{}' of type {} with value of type {}", v.name, declared_ty, value_ty),
            v.span,
        );
    }
}

fn check_function(ctx: &mut ModuleAnalysis, cursor: &mut ScopeCursor, f: &FunctionDecl) {
    cursor.enter_next_child(ctx);

    let return_type = ctx
        .symtab
        .lookup(ctx.symtab.root(), &f.name)
        .and_then(|s| s.resolved_type.clone())
        .and_then(|ty| match ty {
            Type::Function { ret, .. } => Some(*ret),
            _ => None,
        })
        .unwrap_or(Type::Unknown);

    if let Some(body) = &f.body {
        let fn_ctx = FnCtx { name: f.name.clone(), return_type };
        check_block(ctx, cursor, Some(&fn_ctx), body);
    }

    cursor.exit();
}

fn check_block(ctx: &mut ModuleAnalysis, cursor: &mut ScopeCursor, fn_ctx: Option<&FnCtx>, stmts: &[Stmt]) {
    for stmt in stmts {
        check_stmt(ctx, cursor, fn_ctx, stmt);
    }
}

fn check_stmt(ctx: &mut ModuleAnalysis, cursor: &mut ScopeCursor, fn_ctx: Option<&FnCtx>, stmt: &Stmt) {
    match stmt {
        Stmt::Block(body) => {
            let _ = cursor.enter_next_child(ctx);
            check_block(ctx, cursor, fn_ctx, body);
            cursor.exit();
        }
        Stmt::ExprStmt(e) => {
            expr_type(ctx, cursor, fn_ctx, e);
        }
        Stmt::Let(v) => check_let(ctx, cursor, fn_ctx, v),
        Stmt::Return { value, span } => check_return(ctx, cursor, fn_ctx, value.as_ref(), *span),
        Stmt::If { condition, then_branch, else_branch, .. } => {
            let cond_ty = expr_type(ctx, cursor, fn_ctx, condition);
            check_condition_type(ctx, &cond_ty, condition.span());

            let _ = cursor.enter_next_child(ctx);
            check_block(ctx, cursor, fn_ctx, then_branch);
            cursor.exit();

            if let Some(else_body) = else_branch {
                let _ = cursor.enter_next_child(ctx);
                check_block(ctx, cursor, fn_ctx, else_body);
                cursor.exit();
            }
        }
        Stmt::While { condition, body, .. } => {
            let cond_ty = expr_type(ctx, cursor, fn_ctx, condition);
            check_condition_type(ctx, &cond_ty, condition.span());

            let _ = cursor.enter_next_child(ctx);
            check_block(ctx, cursor, fn_ctx, body);
            cursor.exit();
        }
        Stmt::DoWhile { body, condition, .. } => {
            let _ = cursor.enter_next_child(ctx);
            check_block(ctx, cursor, fn_ctx, body);
            cursor.exit();

            let cond_ty = expr_type(ctx, cursor, fn_ctx, condition);
            check_condition_type(ctx, &cond_ty, condition.span());
        }
        Stmt::For { loop_var, start, end, step, body, span } => {
            let start_ty = expr_type(ctx, cursor, fn_ctx, start);
            let end_ty = expr_type(ctx, cursor, fn_ctx, end);
            let step_ty = step.as_ref().map(|s| expr_type(ctx, cursor, fn_ctx, s));

            for (label, ty) in [("start", &start_ty), ("end", &end_ty)] {
                if !matches!(ty, Type::Byte | Type::Word | Type::Unknown) {
                    ctx.diagnostics.emit(
                        DiagnosticCode::TYPE_MISMATCH,
                        format!("for-loop {} bound must be numeric, found {}", label, ty),
                        *span,
                    );
                }
            }
            if let Some(step_ty) = &step_ty {
                if !matches!(step_ty, Type::Byte | Type::Word | Type::Unknown) {
                    ctx.diagnostics.emit(
                        DiagnosticCode::TYPE_MISMATCH,
                        format!("for-loop step must be numeric, found {}", step_ty),
                        *span,
                    );
                }
            }

            let loop_ty =
                if start_ty == Type::Word || end_ty == Type::Word { Type::Word } else { Type::Byte };

            let scope = cursor.enter_next_child(ctx);
            if let Some(symbol) = ctx.symtab.lookup_mut(scope, loop_var) {
                symbol.resolved_type = Some(loop_ty);
            }
            check_block(ctx, cursor, fn_ctx, body);
            cursor.exit();
        }
        Stmt::Switch { value, cases, default, .. } => {
            let switch_ty = expr_type(ctx, cursor, fn_ctx, value);
            for case in cases {
                check_switch_case(ctx, cursor, fn_ctx, case, &switch_ty);
            }
            if let Some(default_body) = default {
                let _ = cursor.enter_next_child(ctx);
                check_block(ctx, cursor, fn_ctx, default_body);
                cursor.exit();
            }
        }
        Stmt::Break(span) => check_loop_keyword(ctx, cursor, DiagnosticCode::BREAK_OUTSIDE_LOOP, *span),
        Stmt::Continue(span) => check_loop_keyword(ctx, cursor, DiagnosticCode::CONTINUE_OUTSIDE_LOOP, *span),
    }
}

fn check_switch_case(
    ctx: &mut ModuleAnalysis,
    cursor: &mut ScopeCursor,
    fn_ctx: Option<&FnCtx>,
    case: &SwitchCase,
    switch_ty: &Type,
) {
    let case_ty = expr_type(ctx, cursor, fn_ctx, &case.value);
    if *switch_ty != Type::Unknown
        && case_ty != Type::Unknown
        && !ctx.types.can_assign(switch_ty, &case_ty)
        && !ctx.types.can_assign(&case_ty, switch_ty)
    {
        ctx.diagnostics.emit(
            DiagnosticCode::TYPE_MISMATCH,
            format!("case value of type {} is incompatible with switch value of type {}", case_ty, switch_ty),
            case.span,
        );
    }
    let _ = cursor.enter_next_child(ctx);
    check_block(ctx, cursor, fn_ctx, &case.body);
    cursor.exit();
}

fn check_loop_keyword(ctx: &mut ModuleAnalysis, cursor: &ScopeCursor, code: DiagnosticCode, span: SourceSpan) {
    if ctx.symtab.nearest_enclosing_loop(cursor.current()).is_none() {
        let what = if code == DiagnosticCode::BREAK_OUTSIDE_LOOP { "break" } else { "continue" };
        ctx.diagnostics.emit(code, format!("'{}' outside of a loop", what), span);
    }
}

fn check_let(ctx: &mut ModuleAnalysis, cursor: &mut ScopeCursor, fn_ctx: Option<&FnCtx>, v: &VariableDecl) {
    let mut stats = ResolutionStats::default();
    let annotated = v.type_annotation.as_ref().map(|name| resolve_or_report(ctx, name, v.span, &mut stats));

    let value_ty = v.initializer.as_ref().map(|init| expr_type(ctx, cursor, fn_ctx, init));

    let resolved = match (annotated, &value_ty) {
        (Some(declared), Some(actual)) => {
            if declared != Type::Unknown && *actual != Type::Unknown && !ctx.types.can_assign(actual, &declared) {
                ctx.diagnostics.emit(
                    DiagnosticCode::TYPE_MISMATCH,
                    format!("cannot initialize '{}' of type {} with value of type {}", v.name, declared, actual),
                    v.span,
                );
            }
            declared
        }
        (Some(declared), None) => declared,
        (None, Some(actual)) => actual.clone(),
        (None, None) => Type::Unknown,
    };

    if let Some(symbol) = ctx.symtab.lookup_mut(cursor.current(), &v.name) {
        symbol.resolved_type = Some(resolved);
    }
}

fn check_return(
    ctx: &mut ModuleAnalysis,
    cursor: &mut ScopeCursor,
    fn_ctx: Option<&FnCtx>,
    value: Option<&Expr>,
    span: SourceSpan,
) {
    let Some(fn_ctx) = fn_ctx else { return };
    match (&fn_ctx.return_type, value) {
        (Type::Void, Some(_)) => {
            ctx.diagnostics.emit(
                DiagnosticCode::INVALID_RETURN,
                format!("function '{}' is void and cannot return a value", fn_ctx.name),
                span,
            );
            if let Some(v) = value {
                expr_type(ctx, cursor, Some(fn_ctx), v);
            }
        }
        (Type::Void, None) => {}
        (declared, None) => {
            ctx.diagnostics.emit(
                DiagnosticCode::MISSING_RETURN_VALUE,
                format!("function '{}' must return a value of type {}", fn_ctx.name, declared),
                span,
            );
        }
        (declared, Some(v)) => {
            let value_ty = expr_type(ctx, cursor, Some(fn_ctx), v);
            if *declared != Type::Unknown && value_ty != Type::Unknown && !ctx.types.can_assign(&value_ty, declared) {
                ctx.diagnostics.emit(
                    DiagnosticCode::TYPE_MISMATCH,
                    format!("cannot return {} from function '{}' declared to return {}", value_ty, fn_ctx.name, declared),
                    span,
                );
            }
        }
    }
}

fn check_condition_type(ctx: &mut ModuleAnalysis, ty: &Type, span: SourceSpan) {
    // byte is accepted as truthy/falsy with no diagnostic (spec 4.6 and
    // spec 9's open-question resolution on implicit byte->boolean).
    if !matches!(ty, Type::Boolean | Type::Byte | Type::Unknown) {
        ctx.diagnostics.emit(
            DiagnosticCode::TYPE_MISMATCH,
            format!("condition must be boolean or byte, found {}", ty),
            span,
        );
    }
}

fn expr_type(ctx: &mut ModuleAnalysis, cursor: &mut ScopeCursor, fn_ctx: Option<&FnCtx>, expr: &Expr) -> Type {
    match expr {
        Expr::Literal { value, .. } => literal_type(value),
        Expr::Identifier { name, span } => {
            let scope = cursor.current();
            if let Some(symbol) = ctx.symtab.lookup_mut(scope, name) {
                symbol.used = true;
                symbol.resolved_type.clone().unwrap_or(Type::Unknown)
            } else {
                ctx.diagnostics.emit(
                    DiagnosticCode::UNDEFINED_IDENTIFIER,
                    format!("undefined identifier '{}'", name),
                    *span,
                );
                Type::Unknown
            }
        }
        Expr::Binary { op, lhs, rhs, span } => {
            let lhs_ty = expr_type(ctx, cursor, fn_ctx, lhs);
            let rhs_ty = expr_type(ctx, cursor, fn_ctx, rhs);
            let result = ctx.types.binary_op_type(&lhs_ty, &rhs_ty, *op);
            if result == Type::Unknown && lhs_ty != Type::Unknown && rhs_ty != Type::Unknown {
                ctx.diagnostics.emit(
                    DiagnosticCode::TYPE_MISMATCH,
                    format!("operator {:?} not defined for {} and {}", op, lhs_ty, rhs_ty),
                    *span,
                );
            }
            result
        }
        Expr::Unary { op, operand, span } => {
            let operand_ty = expr_type(ctx, cursor, fn_ctx, operand);
            let result = ctx.types.unary_op_type(&operand_ty, *op);
            if result == Type::Unknown && operand_ty != Type::Unknown {
                ctx.diagnostics.emit(
                    DiagnosticCode::TYPE_MISMATCH,
                    format!("operator {:?} not defined for {}", op, operand_ty),
                    *span,
                );
            }
            result
        }
        Expr::Ternary { condition, then_expr, else_expr, span } => {
            let cond_ty = expr_type(ctx, cursor, fn_ctx, condition);
            check_condition_type(ctx, &cond_ty, condition.span());
            let then_ty = expr_type(ctx, cursor, fn_ctx, then_expr);
            let else_ty = expr_type(ctx, cursor, fn_ctx, else_expr);
            let common = ctx.types.common_type(&[then_ty.clone(), else_ty.clone()]);
            if common == Type::Unknown && then_ty != Type::Unknown && else_ty != Type::Unknown {
                ctx.diagnostics.emit(
                    DiagnosticCode::TYPE_MISMATCH,
                    format!("ternary branches have incompatible types {} and {}", then_ty, else_ty),
                    *span,
                );
            }
            common
        }
        Expr::Assignment { target, op, value, span } => {
            if !target.is_lvalue() {
                ctx.diagnostics.emit(
                    DiagnosticCode::NON_LVALUE_ASSIGNMENT,
                    "assignment target is not an lvalue".to_string(),
                    *span,
                );
            }
            let target_ty = expr_type(ctx, cursor, fn_ctx, target);
            let value_ty = expr_type(ctx, cursor, fn_ctx, value);
            let rhs_ty = match op.compound_binary_op() {
                Some(bin_op) => ctx.types.binary_op_type(&target_ty, &value_ty, bin_op),
                None => value_ty,
            };
            if target_ty != Type::Unknown && rhs_ty != Type::Unknown && !ctx.types.can_assign(&rhs_ty, &target_ty) {
                ctx.diagnostics.emit(
                    DiagnosticCode::TYPE_MISMATCH,
                    format!("cannot assign {} to {}", rhs_ty, target_ty),
                    *span,
                );
            }
            target_ty
        }
        Expr::Call { callee, args, span } => check_call(ctx, cursor, fn_ctx, callee, args, *span),
        Expr::Index { object, index, span } => {
            let object_ty = expr_type(ctx, cursor, fn_ctx, object);
            let index_ty = expr_type(ctx, cursor, fn_ctx, index);
            if !matches!(index_ty, Type::Byte | Type::Word | Type::Unknown) {
                ctx.diagnostics.emit(
                    DiagnosticCode::TYPE_MISMATCH,
                    format!("array index must be numeric, found {}", index_ty),
                    *span,
                );
            }
            match object_ty {
                Type::Array { element, .. } => *element,
                Type::Word => Type::Byte,
                Type::Unknown => Type::Unknown,
                other => {
                    ctx.diagnostics.emit(
                        DiagnosticCode::TYPE_MISMATCH,
                        format!("cannot index into value of type {}", other),
                        *span,
                    );
                    Type::Unknown
                }
            }
        }
        Expr::Member { object, .. } => {
            // Struct-member semantics beyond the memory-map case are out of
            // scope (spec 4.6); the reference is still recorded.
            expr_type(ctx, cursor, fn_ctx, object);
            Type::Unknown
        }
        Expr::ArrayLiteral { elements, span } => {
            let element_types: Vec<Type> = elements.iter().map(|e| expr_type(ctx, cursor, fn_ctx, e)).collect();
            let common = ctx.types.common_type(&element_types);
            if common == Type::Unknown && !element_types.is_empty() && element_types.iter().all(|t| *t != Type::Unknown)
            {
                ctx.diagnostics.emit(
                    DiagnosticCode::TYPE_MISMATCH,
                    "array literal elements have no common type".to_string(),
                    *span,
                );
            }
            ctx.types.array_of(common, Some(elements.len()))
        }
    }
}

fn literal_type(value: &Literal) -> Type {
    match value {
        Literal::Integer { value, .. } => {
            if (0..=255).contains(value) {
                Type::Byte
            } else {
                Type::Word
            }
        }
        Literal::Str(_) => Type::String,
        Literal::Bool(_) => Type::Boolean,
    }
}

fn check_call(
    ctx: &mut ModuleAnalysis,
    cursor: &mut ScopeCursor,
    fn_ctx: Option<&FnCtx>,
    callee: &Expr,
    args: &[Expr],
    span: SourceSpan,
) -> Type {
    let (callee_ty, callee_name) = match callee {
        Expr::Identifier { name, span: id_span } => {
            let scope = cursor.current();
            if let Some(symbol) = ctx.symtab.lookup_mut(scope, name) {
                symbol.used = true;
                (symbol.resolved_type.clone().unwrap_or(Type::Unknown), Some(name.clone()))
            } else {
                ctx.diagnostics.emit(
                    DiagnosticCode::UNDEFINED_IDENTIFIER,
                    format!("undefined identifier '{}'", name),
                    *id_span,
                );
                (Type::Unknown, None)
            }
        }
        other => (expr_type(ctx, cursor, fn_ctx, other), None),
    };

    let arg_types: Vec<Type> = args.iter().map(|a| expr_type(ctx, cursor, fn_ctx, a)).collect();

    if let Some(caller) = fn_ctx.map(|f| f.name.as_str()) {
        let callee_label = callee_name.as_deref().unwrap_or(UNRESOLVED_CALLEE);
        ctx.call_graph.add_call(caller, callee_label);
    }

    match callee_ty {
        Type::Function { params, ret } | Type::Callback { params, ret } => {
            if params.len() != arg_types.len() {
                ctx.diagnostics.emit(
                    DiagnosticCode::ARITY_MISMATCH,
                    format!(
                        "'{}' expects {} argument(s), found {}",
                        callee_name.as_deref().unwrap_or("<callback>"),
                        params.len(),
                        arg_types.len()
                    ),
                    span,
                );
                return Type::Unknown;
            }
            for (param_ty, arg_ty) in params.iter().zip(arg_types.iter()) {
                if *param_ty != Type::Unknown && *arg_ty != Type::Unknown && !ctx.types.can_assign(arg_ty, param_ty) {
                    ctx.diagnostics.emit(
                        DiagnosticCode::TYPE_MISMATCH,
                        format!("argument of type {} is not assignable to parameter of type {}", arg_ty, param_ty),
                        span,
                    );
                }
            }
            *ret
        }
        Type::Unknown => Type::Unknown,
        other => {
            ctx.diagnostics.emit(
                DiagnosticCode::TYPE_MISMATCH,
                format!("'{}' is not callable (has type {})", callee_name.as_deref().unwrap_or("<expr>"), other),
                span,
            );
            Type::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ModuleDecl, Param};
    use crate::config::AnalysisConfig;

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    fn module(name: &str) -> ModuleDecl {
        ModuleDecl { name: vec![name.to_string()], explicit: true, span: span() }
    }

    fn analyze(program: &Program) -> ModuleAnalysis {
        let mut ctx = ModuleAnalysis::new("demo", AnalysisConfig::default());
        crate::passes::builder::run(&mut ctx, program);
        crate::passes::resolver::run(&mut ctx, program);
        run(&mut ctx, program);
        ctx
    }

    #[test]
    fn flags_argument_type_mismatch() {
        let program = Program {
            module: module("demo"),
            declarations: vec![
                Decl::Function(FunctionDecl {
                    name: "takes_byte".into(),
                    params: vec![Param { name: "x".into(), type_annotation: "byte".into(), span: span() }],
                    return_type: None,
                    body: Some(vec![]),
                    exported: false,
                    callback: false,
                    stub: false,
                    span: span(),
                }),
                Decl::Function(FunctionDecl {
                    name: "caller".into(),
                    params: vec![],
                    return_type: None,
                    body: Some(vec![Stmt::ExprStmt(Expr::Call {
                        callee: Box::new(Expr::Identifier { name: "takes_byte".into(), span: span() }),
                        args: vec![Expr::Literal { value: Literal::Str("nope".into()), span: span() }],
                        span: span(),
                    })]),
                    exported: false,
                    callback: false,
                    stub: false,
                    span: span(),
                }),
            ],
            span: span(),
        };

        let ctx = analyze(&program);
        assert!(ctx.diagnostics.all().iter().any(|d| d.code == DiagnosticCode::TYPE_MISMATCH));
        assert!(ctx.call_graph.callees("caller").contains("takes_byte"));
    }

    #[test]
    fn call_in_let_initializer_is_recorded_in_call_graph() {
        use crate::ast::{StorageClass, VariableDecl};

        let program = Program {
            module: module("demo"),
            declarations: vec![
                Decl::Function(FunctionDecl {
                    name: "callee".into(),
                    params: vec![],
                    return_type: Some("byte".into()),
                    body: Some(vec![Stmt::Return { value: Some(Expr::Literal { value: Literal::Integer { value: 1, radix: crate::ast::Radix::Decimal }, span: span() }), span: span() }]),
                    exported: false,
                    callback: false,
                    stub: false,
                    span: span(),
                }),
                Decl::Function(FunctionDecl {
                    name: "caller".into(),
                    params: vec![],
                    return_type: None,
                    body: Some(vec![Stmt::Let(VariableDecl {
                        name: "x".into(),
                        type_annotation: Some("byte".into()),
                        initializer: Some(Expr::Call {
                            callee: Box::new(Expr::Identifier { name: "callee".into(), span: span() }),
                            args: vec![],
                            span: span(),
                        }),
                        storage: StorageClass::None,
                        explicit_address: None,
                        constant: false,
                        exported: false,
                        span: span(),
                    })]),
                    exported: false,
                    callback: false,
                    stub: false,
                    span: span(),
                }),
            ],
            span: span(),
        };

        let ctx = analyze(&program);
        assert!(ctx.call_graph.callees("caller").contains("callee"));
    }

    #[test]
    fn break_outside_loop_is_flagged() {
        let program = Program {
            module: module("demo"),
            declarations: vec![Decl::Function(FunctionDecl {
                name: "f".into(),
                params: vec![],
                return_type: None,
                body: Some(vec![Stmt::Break(span())]),
                exported: false,
                callback: false,
                stub: false,
                span: span(),
            })],
            span: span(),
        };

        let ctx = analyze(&program);
        assert!(ctx.diagnostics.all().iter().any(|d| d.code == DiagnosticCode::BREAK_OUTSIDE_LOOP));
    }

    #[test]
    fn break_inside_while_is_accepted() {
        let program = Program {
            module: module("demo"),
            declarations: vec![Decl::Function(FunctionDecl {
                name: "f".into(),
                params: vec![],
                return_type: None,
                body: Some(vec![Stmt::While {
                    condition: Expr::Literal { value: Literal::Bool(true), span: span() },
                    body: vec![Stmt::Break(span())],
                    span: span(),
                }]),
                exported: false,
                callback: false,
                stub: false,
                span: span(),
            })],
            span: span(),
        };

        let ctx = analyze(&program);
        assert!(!ctx.diagnostics.all().iter().any(|d| d.code == DiagnosticCode::BREAK_OUTSIDE_LOOP));
    }

    #[test]
    fn missing_return_value_is_flagged() {
        let program = Program {
            module: module("demo"),
            declarations: vec![Decl::Function(FunctionDecl {
                name: "f".into(),
                params: vec![],
                return_type: Some("byte".into()),
                body: Some(vec![Stmt::Return { value: None, span: span() }]),
                exported: false,
                callback: false,
                stub: false,
                span: span(),
            })],
            span: span(),
        };

        let ctx = analyze(&program);
        assert!(ctx.diagnostics.all().iter().any(|d| d.code == DiagnosticCode::MISSING_RETURN_VALUE));
    }
}
