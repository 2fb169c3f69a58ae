use blend65_common::SourceSpan;

use super::literal::Literal;
use super::operator::{BinaryOp, CompoundOp, UnaryOp};

/// Where a variable's storage lives (spec 3, Declarations/variable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    ZeroPage,
    Ram,
    Data,
    Map,
    None,
}

/// Root of a parsed translation unit: one module declaration plus an
/// ordered, top-level declaration list.
#[derive(Debug, Clone)]
pub struct Program {
    pub module: ModuleDecl,
    pub declarations: Vec<Decl>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct ModuleDecl {
    /// Dotted name segments, e.g. `["game", "sprites"]` for `module game.sprites;`.
    pub name: Vec<String>,
    pub explicit: bool,
    pub span: SourceSpan,
}

impl ModuleDecl {
    pub fn dotted(&self) -> String {
        self.name.join(".")
    }
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub identifiers: Vec<String>,
    pub module_path: Vec<String>,
    pub wildcard: bool,
    pub span: SourceSpan,
}

impl ImportDecl {
    pub fn dotted_module(&self) -> String {
        self.module_path.join(".")
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub type_annotation: String,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    /// `None` for a stub function (no body supplied, still a valid decl -
    /// spec 4.4: "Stub functions ... still produce a symbol").
    pub body: Option<Vec<Stmt>>,
    pub exported: bool,
    pub callback: bool,
    pub stub: bool,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub name: String,
    pub type_annotation: Option<String>,
    pub initializer: Option<Expr>,
    pub storage: StorageClass,
    /// Explicit address given to an `@zp`/`@ram` modifier (e.g. `@zp($02)`),
    /// if the declaration supplied one. `None` lets the zero-page analyzer
    /// pick an address itself (spec 4.11).
    pub explicit_address: Option<Expr>,
    pub constant: bool,
    pub exported: bool,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: String,
    pub aliased_type: String,
    pub exported: bool,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: String,
    pub value: Option<Expr>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<EnumMember>,
    pub exported: bool,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct MapField {
    pub name: String,
    pub type_annotation: String,
    /// `Some` only for explicit-struct maps; sequential-struct maps lay
    /// fields out contiguously from `base` instead.
    pub address: Option<Expr>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub enum MemoryMapDecl {
    Simple { name: String, address: Expr, span: SourceSpan },
    Range { name: String, start: Expr, end: Expr, span: SourceSpan },
    SequentialStruct { name: String, base: Expr, fields: Vec<MapField>, span: SourceSpan },
    ExplicitStruct { name: String, base: Expr, fields: Vec<MapField>, span: SourceSpan },
}

impl MemoryMapDecl {
    pub fn name(&self) -> &str {
        match self {
            MemoryMapDecl::Simple { name, .. }
            | MemoryMapDecl::Range { name, .. }
            | MemoryMapDecl::SequentialStruct { name, .. }
            | MemoryMapDecl::ExplicitStruct { name, .. } => name,
        }
    }

    pub fn span(&self) -> SourceSpan {
        match self {
            MemoryMapDecl::Simple { span, .. }
            | MemoryMapDecl::Range { span, .. }
            | MemoryMapDecl::SequentialStruct { span, .. }
            | MemoryMapDecl::ExplicitStruct { span, .. } => *span,
        }
    }
}

/// Closed family of top-level declarations (spec 3, "Declarations").
/// `Export` wraps another declaration to mark it exported, matching the
/// AST's explicit "export wrapper" node rather than a bare flag, so import
/// resolution can report a span pointing at the `export` keyword itself.
#[derive(Debug, Clone)]
pub enum Decl {
    Function(FunctionDecl),
    Variable(VariableDecl),
    TypeAlias(TypeAliasDecl),
    Enum(EnumDecl),
    MemoryMap(MemoryMapDecl),
    Import(ImportDecl),
    Export { inner: Box<Decl>, span: SourceSpan },
}

impl Decl {
    pub fn span(&self) -> SourceSpan {
        match self {
            Decl::Function(f) => f.span,
            Decl::Variable(v) => v.span,
            Decl::TypeAlias(t) => t.span,
            Decl::Enum(e) => e.span,
            Decl::MemoryMap(m) => m.span(),
            Decl::Import(i) => i.span,
            Decl::Export { span, .. } => *span,
        }
    }

    /// Unwraps any number of `Export` wrappers, returning the wrapped
    /// declaration and whether an export wrapper was present.
    pub fn unwrap_export(&self) -> (&Decl, bool) {
        match self {
            Decl::Export { inner, .. } => {
                let (innermost, _) = inner.unwrap_export();
                (innermost, true)
            }
            other => (other, false),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub value: Expr,
    pub body: Vec<Stmt>,
    pub span: SourceSpan,
}

/// Closed family of statements (spec 3, "Statements"). `For` models
/// Blend65's range-based loop (`start`/`end`/optional `step`), not a
/// C-style three-clause loop.
#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Vec<Stmt>),
    ExprStmt(Expr),
    Let(VariableDecl),
    Return { value: Option<Expr>, span: SourceSpan },
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
        span: SourceSpan,
    },
    While { condition: Expr, body: Vec<Stmt>, span: SourceSpan },
    For {
        loop_var: String,
        start: Expr,
        end: Expr,
        step: Option<Expr>,
        body: Vec<Stmt>,
        span: SourceSpan,
    },
    DoWhile { body: Vec<Stmt>, condition: Expr, span: SourceSpan },
    Switch {
        value: Expr,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Stmt>>,
        span: SourceSpan,
    },
    Break(SourceSpan),
    Continue(SourceSpan),
}

impl Stmt {
    pub fn span(&self) -> SourceSpan {
        match self {
            Stmt::Block(stmts) => stmts.first().map(|s| s.span()).unwrap_or_default(),
            Stmt::ExprStmt(e) => e.span(),
            Stmt::Let(v) => v.span,
            Stmt::Return { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::For { span, .. }
            | Stmt::DoWhile { span, .. }
            | Stmt::Switch { span, .. } => *span,
            Stmt::Break(span) | Stmt::Continue(span) => *span,
        }
    }

    /// True for statements that unconditionally leave the enclosing block
    /// (used by the CFG builder's block-partition rule, spec 4.8).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stmt::Return { .. } | Stmt::Break(_) | Stmt::Continue(_))
    }
}

/// Closed family of expressions (spec 3, "Expressions").
#[derive(Debug, Clone)]
pub enum Expr {
    Literal { value: Literal, span: SourceSpan },
    Identifier { name: String, span: SourceSpan },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr>, span: SourceSpan },
    Unary { op: UnaryOp, operand: Box<Expr>, span: SourceSpan },
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
        span: SourceSpan,
    },
    Assignment {
        target: Box<Expr>,
        op: CompoundOp,
        value: Box<Expr>,
        span: SourceSpan,
    },
    Call { callee: Box<Expr>, args: Vec<Expr>, span: SourceSpan },
    Index { object: Box<Expr>, index: Box<Expr>, span: SourceSpan },
    Member { object: Box<Expr>, property: String, span: SourceSpan },
    ArrayLiteral { elements: Vec<Expr>, span: SourceSpan },
}

impl Expr {
    pub fn span(&self) -> SourceSpan {
        match self {
            Expr::Literal { span, .. }
            | Expr::Identifier { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Ternary { span, .. }
            | Expr::Assignment { span, .. }
            | Expr::Call { span, .. }
            | Expr::Index { span, .. }
            | Expr::Member { span, .. }
            | Expr::ArrayLiteral { span, .. } => *span,
        }
    }

    /// An expression is an lvalue iff it is an identifier, index, or
    /// member access (spec 4.6, Assignment rule).
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Expr::Identifier { .. } | Expr::Index { .. } | Expr::Member { .. })
    }
}
