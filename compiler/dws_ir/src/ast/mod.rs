//! AST node types.
//!
//! Expressions and statements are boxed trees; declarations that the
//! evaluator retains after loading (functions, classes, interfaces, records,
//! enums) sit behind `Rc`.

mod expr;
mod items;
mod operators;
mod stmt;
mod types;

pub use expr::{Expr, ExprKind, SetElement};
pub use items::{
    ClassConstDecl, ClassDecl, Decl, EnumDecl, EnumMember, FieldDecl, FunctionDecl, FunctionKind,
    InterfaceDecl, MethodFlags, OperatorDecl, OperatorKind, Param, ParamMode, Program,
    PropertyAccess, PropertyDecl, RecordDecl, TypeAlias,
};
pub use operators::{AssignOp, BinaryOp, UnaryOp};
pub use stmt::{
    CaseBranch, CaseLabel, ExceptClause, ExceptHandler, ForDirection, Stmt, StmtKind, TryStmt,
    VarDecl,
};
pub use types::{FunctionTypeExpr, TypeExpr};
