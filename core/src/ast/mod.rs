//! AST definitions and the generic walker (spec 3 "AST", spec 9
//! "Polymorphic AST node families"). Unlike the teacher's single tagged
//! `ASTNode` enum, declarations/statements/expressions are three closed
//! families rather than one, since the spec itself separates them into
//! "Program structure" / "Declarations" / "Statements" / "Expressions" -
//! each still gets the same tagged-enum-plus-visitor treatment.

mod literal;
mod node;
mod operator;
mod walk;

pub use literal::{Literal, Radix};
pub use node::{
    Decl, EnumDecl, EnumMember, Expr, FunctionDecl, ImportDecl, MapField, MemoryMapDecl,
    ModuleDecl, Param, Program, StorageClass, Stmt, SwitchCase, TypeAliasDecl, VariableDecl,
};
pub use operator::{BinaryOp, CompoundOp, UnaryOp};
pub use walk::{NodeRef, Visitor, WalkControl, Walker};
