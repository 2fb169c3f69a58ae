//! The AST walker (spec 3, "Traversal contract"). A `Visitor` is notified
//! for every node; the walker recurses into children automatically unless
//! told otherwise, and keeps the live root-to-current path so a visitor
//! can inspect ancestors without threading its own stack.

use super::node::{Decl, Expr, Program, Stmt};

/// Control returned from every visit method. `Continue` is the default -
/// recurse into this node's children and keep walking siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    SkipChildren,
    Abort,
}

/// A borrowed reference to whichever node kind is currently being visited,
/// used to populate the walker's ancestor path.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Decl(&'a Decl),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

pub trait Visitor {
    fn visit_decl(&mut self, _decl: &Decl) -> WalkControl {
        WalkControl::Continue
    }
    fn visit_stmt(&mut self, _stmt: &Stmt) -> WalkControl {
        WalkControl::Continue
    }
    fn visit_expr(&mut self, _expr: &Expr) -> WalkControl {
        WalkControl::Continue
    }
}

/// Drives a `Visitor` over a `Program`. Owns the live path from the root
/// to the node currently being visited: `parent()` is O(1), `ancestor(k)`
/// is O(k).
pub struct Walker<'a> {
    path: Vec<NodeRef<'a>>,
    aborted: bool,
}

impl<'a> Walker<'a> {
    pub fn new() -> Self {
        Self { path: Vec::new(), aborted: false }
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.path.get(self.path.len().wrapping_sub(2)).copied()
    }

    /// 0 = the node currently being visited, 1 = its parent, etc.
    pub fn ancestor(&self, k: usize) -> Option<NodeRef<'a>> {
        let len = self.path.len();
        if k >= len {
            return None;
        }
        self.path.get(len - 1 - k).copied()
    }

    pub fn walk_program(&mut self, program: &'a Program, visitor: &mut dyn Visitor) {
        for decl in &program.declarations {
            self.walk_decl(decl, visitor);
            if self.aborted {
                return;
            }
        }
    }

    pub fn walk_decl(&mut self, decl: &'a Decl, visitor: &mut dyn Visitor) {
        if self.aborted {
            return;
        }
        self.path.push(NodeRef::Decl(decl));
        let control = visitor.visit_decl(decl);
        match control {
            WalkControl::Abort => {
                self.aborted = true;
            }
            WalkControl::SkipChildren => {}
            WalkControl::Continue => {
                self.walk_decl_children(decl, visitor);
            }
        }
        self.path.pop();
    }

    fn walk_decl_children(&mut self, decl: &'a Decl, visitor: &mut dyn Visitor) {
        match decl {
            Decl::Function(f) => {
                if let Some(body) = &f.body {
                    for stmt in body {
                        self.walk_stmt(stmt, visitor);
                        if self.aborted {
                            return;
                        }
                    }
                }
            }
            Decl::Variable(v) => {
                if let Some(init) = &v.initializer {
                    self.walk_expr(init, visitor);
                }
            }
            Decl::TypeAlias(_) => {}
            Decl::Enum(e) => {
                for member in &e.members {
                    if let Some(value) = &member.value {
                        self.walk_expr(value, visitor);
                        if self.aborted {
                            return;
                        }
                    }
                }
            }
            Decl::MemoryMap(_) => {}
            Decl::Import(_) => {}
            Decl::Export { inner, .. } => {
                self.walk_decl(inner, visitor);
            }
        }
    }

    pub fn walk_stmt(&mut self, stmt: &'a Stmt, visitor: &mut dyn Visitor) {
        if self.aborted {
            return;
        }
        self.path.push(NodeRef::Stmt(stmt));
        let control = visitor.visit_stmt(stmt);
        match control {
            WalkControl::Abort => {
                self.aborted = true;
            }
            WalkControl::SkipChildren => {}
            WalkControl::Continue => {
                self.walk_stmt_children(stmt, visitor);
            }
        }
        self.path.pop();
    }

    fn walk_stmt_children(&mut self, stmt: &'a Stmt, visitor: &mut dyn Visitor) {
        macro_rules! walk_body {
            ($body:expr) => {
                for s in $body {
                    self.walk_stmt(s, visitor);
                    if self.aborted {
                        return;
                    }
                }
            };
        }

        match stmt {
            Stmt::Block(stmts) => walk_body!(stmts),
            Stmt::ExprStmt(e) => self.walk_expr(e, visitor),
            Stmt::Let(v) => {
                if let Some(init) = &v.initializer {
                    self.walk_expr(init, visitor);
                }
            }
            Stmt::Return { value, .. } => {
                if let Some(v) = value {
                    self.walk_expr(v, visitor);
                }
            }
            Stmt::If { condition, then_branch, else_branch, .. } => {
                self.walk_expr(condition, visitor);
                if self.aborted {
                    return;
                }
                walk_body!(then_branch);
                if let Some(else_branch) = else_branch {
                    walk_body!(else_branch);
                }
            }
            Stmt::While { condition, body, .. } => {
                self.walk_expr(condition, visitor);
                if self.aborted {
                    return;
                }
                walk_body!(body);
            }
            Stmt::For { start, end, step, body, .. } => {
                self.walk_expr(start, visitor);
                self.walk_expr(end, visitor);
                if let Some(step) = step {
                    self.walk_expr(step, visitor);
                }
                if self.aborted {
                    return;
                }
                walk_body!(body);
            }
            Stmt::DoWhile { body, condition, .. } => {
                walk_body!(body);
                self.walk_expr(condition, visitor);
            }
            Stmt::Switch { value, cases, default, .. } => {
                self.walk_expr(value, visitor);
                if self.aborted {
                    return;
                }
                for case in cases {
                    self.walk_expr(&case.value, visitor);
                    if self.aborted {
                        return;
                    }
                    walk_body!(case.body);
                }
                if let Some(default) = default {
                    walk_body!(default);
                }
            }
            Stmt::Break(_) | Stmt::Continue(_) => {}
        }
    }

    pub fn walk_expr(&mut self, expr: &'a Expr, visitor: &mut dyn Visitor) {
        if self.aborted {
            return;
        }
        self.path.push(NodeRef::Expr(expr));
        let control = visitor.visit_expr(expr);
        match control {
            WalkControl::Abort => {
                self.aborted = true;
            }
            WalkControl::SkipChildren => {}
            WalkControl::Continue => {
                self.walk_expr_children(expr, visitor);
            }
        }
        self.path.pop();
    }

    fn walk_expr_children(&mut self, expr: &'a Expr, visitor: &mut dyn Visitor) {
        match expr {
            Expr::Literal { .. } | Expr::Identifier { .. } => {}
            Expr::Binary { lhs, rhs, .. } => {
                self.walk_expr(lhs, visitor);
                if self.aborted {
                    return;
                }
                self.walk_expr(rhs, visitor);
            }
            Expr::Unary { operand, .. } => self.walk_expr(operand, visitor),
            Expr::Ternary { condition, then_expr, else_expr, .. } => {
                self.walk_expr(condition, visitor);
                if self.aborted {
                    return;
                }
                self.walk_expr(then_expr, visitor);
                if self.aborted {
                    return;
                }
                self.walk_expr(else_expr, visitor);
            }
            Expr::Assignment { target, value, .. } => {
                self.walk_expr(target, visitor);
                if self.aborted {
                    return;
                }
                self.walk_expr(value, visitor);
            }
            Expr::Call { callee, args, .. } => {
                self.walk_expr(callee, visitor);
                for arg in args {
                    if self.aborted {
                        return;
                    }
                    self.walk_expr(arg, visitor);
                }
            }
            Expr::Index { object, index, .. } => {
                self.walk_expr(object, visitor);
                if self.aborted {
                    return;
                }
                self.walk_expr(index, visitor);
            }
            Expr::Member { object, .. } => self.walk_expr(object, visitor),
            Expr::ArrayLiteral { elements, .. } => {
                for e in elements {
                    self.walk_expr(e, visitor);
                    if self.aborted {
                        return;
                    }
                }
            }
        }
    }
}

impl<'a> Default for Walker<'a> {
    fn default() -> Self {
        Self::new()
    }
}
