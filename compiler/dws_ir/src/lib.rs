//! DWS IR - syntax tree types for the DWScript evaluator.
//!
//! This crate contains the data structures an external parser and semantic
//! analyzer hand to the evaluator:
//! - Spans for source locations
//! - Names with case-insensitive identity
//! - AST nodes (expressions, statements, declarations)
//! - Resolved type annotations (`TypeExpr`)
//!
//! The tree is read-only once built. Nodes that the evaluator keeps alive
//! beyond a single walk (function bodies, class declarations) are shared
//! through `Rc` so closures and class metadata can point back into the tree
//! without copying it.

pub mod ast;
mod name;
mod span;

pub use ast::{
    AssignOp, BinaryOp, CaseBranch, CaseLabel, ClassConstDecl, ClassDecl, Decl, EnumDecl,
    EnumMember, ExceptClause, ExceptHandler, Expr, ExprKind, FieldDecl, ForDirection,
    FunctionDecl, FunctionKind, FunctionTypeExpr, InterfaceDecl, MethodFlags, OperatorDecl,
    OperatorKind, Param, ParamMode, Program, PropertyAccess, PropertyDecl, RecordDecl,
    SetElement, Stmt, StmtKind, TryStmt, TypeAlias, TypeExpr, UnaryOp, VarDecl,
};
pub use name::Name;
pub use span::Span;
