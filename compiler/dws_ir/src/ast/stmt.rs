//! Statement nodes.

use super::{AssignOp, Expr, TypeExpr};
use crate::{Name, Span};

/// A statement with its source position.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Statement kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// An expression evaluated for its side effects (usually a call).
    Expr(Expr),
    /// `var a, b: T := init;`
    Var(VarDecl),
    /// `const N: T = value;`
    Const {
        name: Name,
        ty: Option<TypeExpr>,
        value: Expr,
    },
    /// `target := value`, `target += value`, ...
    Assign {
        target: Expr,
        op: AssignOp,
        value: Expr,
    },
    /// `begin ... end`.
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    /// `repeat ... until cond`.
    Repeat {
        body: Vec<Stmt>,
        cond: Expr,
    },
    /// `for [var] i := start to|downto end [step n] do body`.
    For {
        variable: Name,
        inline: bool,
        start: Expr,
        end: Expr,
        direction: ForDirection,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    /// `for [var] x in collection do body`.
    ForIn {
        variable: Name,
        inline: bool,
        collection: Expr,
        body: Box<Stmt>,
    },
    Case {
        scrutinee: Expr,
        branches: Vec<CaseBranch>,
        else_branch: Option<Vec<Stmt>>,
    },
    Break,
    Continue,
    /// `exit` / `exit(value)`.
    Exit(Option<Expr>),
    /// `return` / `return value`; same semantics as `exit`.
    Return(Option<Expr>),
    Try(TryStmt),
    /// `raise` (re-raise) or `raise expr`.
    Raise(Option<Expr>),
}

/// A `var` declaration of one or more names sharing a type and initializer.
#[derive(Clone, Debug, PartialEq)]
pub struct VarDecl {
    pub names: Vec<Name>,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
}

/// Loop direction of a `for` statement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ForDirection {
    To,
    Downto,
}

/// One branch of a `case` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct CaseBranch {
    pub labels: Vec<CaseLabel>,
    pub body: Box<Stmt>,
}

/// A case label: a single value or an inclusive `low..high` range.
#[derive(Clone, Debug, PartialEq)]
pub enum CaseLabel {
    Value(Expr),
    Range(Expr, Expr),
}

/// `try ... except ... finally ... end`.
#[derive(Clone, Debug, PartialEq)]
pub struct TryStmt {
    pub body: Vec<Stmt>,
    pub except: Option<ExceptClause>,
    pub finally: Option<Vec<Stmt>>,
}

/// The `except` part of a `try` statement.
///
/// A bare `except <statements> end` has no handlers and puts its statements
/// in `else_branch`; it catches every exception.
#[derive(Clone, Debug, PartialEq)]
pub struct ExceptClause {
    pub handlers: Vec<ExceptHandler>,
    pub else_branch: Option<Vec<Stmt>>,
}

/// `on E: EClass do body`.
#[derive(Clone, Debug, PartialEq)]
pub struct ExceptHandler {
    pub variable: Option<Name>,
    pub class: Name,
    pub body: Box<Stmt>,
}

impl Stmt {
    /// Create a statement at a dummy position.
    pub fn new(kind: StmtKind) -> Self {
        Stmt {
            kind,
            span: Span::DUMMY,
        }
    }

    /// Attach a source position.
    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn expr(expr: Expr) -> Self {
        Self::new(StmtKind::Expr(expr))
    }

    /// `var name: ty := init;`
    pub fn var(name: &str, ty: Option<TypeExpr>, init: Option<Expr>) -> Self {
        Self::new(StmtKind::Var(VarDecl {
            names: vec![Name::new(name)],
            ty,
            init,
        }))
    }

    /// `var a, b, c: ty;`
    pub fn vars(names: &[&str], ty: TypeExpr) -> Self {
        Self::new(StmtKind::Var(VarDecl {
            names: names.iter().map(|name| Name::new(name)).collect(),
            ty: Some(ty),
            init: None,
        }))
    }

    pub fn const_decl(name: &str, ty: Option<TypeExpr>, value: Expr) -> Self {
        Self::new(StmtKind::Const {
            name: Name::new(name),
            ty,
            value,
        })
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::compound(target, AssignOp::Assign, value)
    }

    pub fn compound(target: Expr, op: AssignOp, value: Expr) -> Self {
        Self::new(StmtKind::Assign { target, op, value })
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Block(stmts))
    }

    pub fn if_then(cond: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Self {
        Self::new(StmtKind::If {
            cond,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }

    pub fn while_do(cond: Expr, body: Stmt) -> Self {
        Self::new(StmtKind::While {
            cond,
            body: Box::new(body),
        })
    }

    pub fn repeat_until(body: Vec<Stmt>, cond: Expr) -> Self {
        Self::new(StmtKind::Repeat { body, cond })
    }

    /// `for var variable := start to|downto end [step] do body`.
    pub fn for_loop(
        variable: &str,
        start: Expr,
        end: Expr,
        direction: ForDirection,
        step: Option<Expr>,
        body: Stmt,
    ) -> Self {
        Self::new(StmtKind::For {
            variable: Name::new(variable),
            inline: true,
            start,
            end,
            direction,
            step,
            body: Box::new(body),
        })
    }

    pub fn for_in(variable: &str, collection: Expr, body: Stmt) -> Self {
        Self::new(StmtKind::ForIn {
            variable: Name::new(variable),
            inline: true,
            collection,
            body: Box::new(body),
        })
    }

    pub fn case(scrutinee: Expr, branches: Vec<CaseBranch>, else_branch: Option<Vec<Stmt>>) -> Self {
        Self::new(StmtKind::Case {
            scrutinee,
            branches,
            else_branch,
        })
    }

    pub fn break_loop() -> Self {
        Self::new(StmtKind::Break)
    }

    pub fn continue_loop() -> Self {
        Self::new(StmtKind::Continue)
    }

    pub fn exit(value: Option<Expr>) -> Self {
        Self::new(StmtKind::Exit(value))
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Self::new(StmtKind::Return(value))
    }

    pub fn try_except(body: Vec<Stmt>, except: ExceptClause) -> Self {
        Self::new(StmtKind::Try(TryStmt {
            body,
            except: Some(except),
            finally: None,
        }))
    }

    pub fn try_finally(body: Vec<Stmt>, finally: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Try(TryStmt {
            body,
            except: None,
            finally: Some(finally),
        }))
    }

    pub fn try_stmt(body: Vec<Stmt>, except: Option<ExceptClause>, finally: Option<Vec<Stmt>>) -> Self {
        Self::new(StmtKind::Try(TryStmt {
            body,
            except,
            finally,
        }))
    }

    pub fn raise(value: Option<Expr>) -> Self {
        Self::new(StmtKind::Raise(value))
    }
}

impl CaseBranch {
    pub fn new(labels: Vec<CaseLabel>, body: Stmt) -> Self {
        CaseBranch {
            labels,
            body: Box::new(body),
        }
    }
}

impl ExceptHandler {
    /// `on variable: class do body`.
    pub fn on(variable: Option<&str>, class: &str, body: Stmt) -> Self {
        ExceptHandler {
            variable: variable.map(Name::new),
            class: Name::new(class),
            body: Box::new(body),
        }
    }
}

impl ExceptClause {
    /// `except on ... do ...; [else ...] end`.
    pub fn handlers(handlers: Vec<ExceptHandler>, else_branch: Option<Vec<Stmt>>) -> Self {
        ExceptClause {
            handlers,
            else_branch,
        }
    }

    /// `except <statements> end`, catching everything.
    pub fn catch_all(body: Vec<Stmt>) -> Self {
        ExceptClause {
            handlers: Vec::new(),
            else_branch: Some(body),
        }
    }
}
