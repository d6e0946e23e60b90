//! Expression nodes.

use std::rc::Rc;

use super::{BinaryOp, FunctionDecl, UnaryOp};
use crate::{Name, Span};

/// An expression with its source position.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Expression kinds.
///
/// Type casts (`Integer(x)`, `TFoo(obj)`) are ordinary calls whose callee is
/// an identifier naming a type; the evaluator tells them apart at run time.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,

    /// A bare identifier: variable, constant, field, function, type, enum member.
    Ident(Name),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `callee(args)`; the callee may be an identifier, a member access, or
    /// any expression producing a function pointer.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `object.member`.
    Member {
        object: Box<Expr>,
        member: Name,
    },
    /// `base[i, j, ...]`.
    Index {
        base: Box<Expr>,
        indices: Vec<Expr>,
    },
    /// `new TClass(args)`.
    New {
        class: Name,
        args: Vec<Expr>,
    },
    /// `Self`.
    SelfRef,
    /// `inherited`, `inherited Method`, `inherited Method(args)`.
    ///
    /// `args: None` means no argument list was written, which for a bare
    /// `inherited` forwards the current method's arguments.
    Inherited {
        method: Option<Name>,
        args: Option<Vec<Expr>>,
    },
    /// `@F`, `@obj.Method`.
    AddressOf(Box<Expr>),
    /// Anonymous function or procedure.
    Lambda(Rc<FunctionDecl>),
    /// `[a, b, c]` used as an array.
    ArrayLiteral(Vec<Expr>),
    /// `[a, b..c]` used as a set.
    SetLiteral(Vec<SetElement>),
    /// `TPoint(X: 1; Y: 2)` or an anonymous `(X: 1; Y: 2)`.
    RecordLiteral {
        type_name: Option<Name>,
        fields: Vec<(Name, Expr)>,
    },
    /// `value is TClass`.
    Is {
        value: Box<Expr>,
        class: Name,
    },
    /// `value as TClass` / `value as IIntf`.
    As {
        value: Box<Expr>,
        target: Name,
    },
    /// `value implements IIntf`.
    Implements {
        value: Box<Expr>,
        interface: Name,
    },
    /// `if cond then a else b` in expression position.
    IfExpr {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
}

/// One element of a set literal.
#[derive(Clone, Debug, PartialEq)]
pub enum SetElement {
    Single(Expr),
    Range(Expr, Expr),
}

impl Expr {
    /// Create an expression at a dummy position.
    pub fn new(kind: ExprKind) -> Self {
        Expr {
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

    pub fn int(value: i64) -> Self {
        Self::new(ExprKind::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Self::new(ExprKind::Float(value))
    }

    pub fn string(value: &str) -> Self {
        Self::new(ExprKind::Str(value.to_string()))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::Bool(value))
    }

    pub fn nil() -> Self {
        Self::new(ExprKind::Nil)
    }

    pub fn ident(name: &str) -> Self {
        Self::new(ExprKind::Ident(Name::new(name)))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::new(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// Call an arbitrary callee expression.
    pub fn call_expr(callee: Expr, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call {
            callee: Box::new(callee),
            args,
        })
    }

    /// Call a function, built-in or type cast by name.
    pub fn call(name: &str, args: Vec<Expr>) -> Self {
        Self::call_expr(Self::ident(name), args)
    }

    pub fn member(object: Expr, member: &str) -> Self {
        Self::new(ExprKind::Member {
            object: Box::new(object),
            member: Name::new(member),
        })
    }

    /// `object.method(args)`.
    pub fn method_call(object: Expr, method: &str, args: Vec<Expr>) -> Self {
        Self::call_expr(Self::member(object, method), args)
    }

    pub fn index(base: Expr, indices: Vec<Expr>) -> Self {
        Self::new(ExprKind::Index {
            base: Box::new(base),
            indices,
        })
    }

    pub fn new_object(class: &str, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::New {
            class: Name::new(class),
            args,
        })
    }

    pub fn self_ref() -> Self {
        Self::new(ExprKind::SelfRef)
    }

    /// `inherited Method(args)`; `None` for either part leaves it unwritten.
    pub fn inherited(method: Option<&str>, args: Option<Vec<Expr>>) -> Self {
        Self::new(ExprKind::Inherited {
            method: method.map(Name::new),
            args,
        })
    }

    pub fn address_of(target: Expr) -> Self {
        Self::new(ExprKind::AddressOf(Box::new(target)))
    }

    pub fn lambda(decl: FunctionDecl) -> Self {
        Self::new(ExprKind::Lambda(Rc::new(decl)))
    }

    pub fn array(elements: Vec<Expr>) -> Self {
        Self::new(ExprKind::ArrayLiteral(elements))
    }

    pub fn set(elements: Vec<SetElement>) -> Self {
        Self::new(ExprKind::SetLiteral(elements))
    }

    pub fn record(type_name: Option<&str>, fields: Vec<(&str, Expr)>) -> Self {
        Self::new(ExprKind::RecordLiteral {
            type_name: type_name.map(Name::new),
            fields: fields
                .into_iter()
                .map(|(name, value)| (Name::new(name), value))
                .collect(),
        })
    }

    pub fn is(value: Expr, class: &str) -> Self {
        Self::new(ExprKind::Is {
            value: Box::new(value),
            class: Name::new(class),
        })
    }

    pub fn as_cast(value: Expr, target: &str) -> Self {
        Self::new(ExprKind::As {
            value: Box::new(value),
            target: Name::new(target),
        })
    }

    pub fn implements(value: Expr, interface: &str) -> Self {
        Self::new(ExprKind::Implements {
            value: Box::new(value),
            interface: Name::new(interface),
        })
    }

    pub fn if_expr(cond: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Self::new(ExprKind::IfExpr {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    /// The identifier this expression names, if it is a bare identifier.
    pub fn as_ident(&self) -> Option<&Name> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}

impl SetElement {
    pub fn single(value: Expr) -> Self {
        SetElement::Single(value)
    }

    pub fn range(low: Expr, high: Expr) -> Self {
        SetElement::Range(low, high)
    }
}
