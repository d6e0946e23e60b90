//! Declarations: functions, classes, interfaces, records, enums, aliases.

use std::rc::Rc;

use bitflags::bitflags;

use super::{AssignOp, BinaryOp, Expr, Stmt, TypeExpr, UnaryOp};
use crate::{Name, Span};

/// How an argument is passed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamMode {
    /// Copied in; records are deep-copied.
    Value,
    /// `var`: the callee aliases the caller's slot.
    Var,
    /// `const`: passed by value, read-only in the body.
    Const,
    /// `lazy`: evaluated on first use inside the callee, at most once.
    Lazy,
}

/// A declared parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Name,
    pub ty: TypeExpr,
    pub mode: ParamMode,
    pub default: Option<Expr>,
}

impl Param {
    pub fn new(name: &str, ty: TypeExpr, mode: ParamMode) -> Self {
        Param {
            name: Name::new(name),
            ty,
            mode,
            default: None,
        }
    }

    /// A by-value parameter.
    pub fn value(name: &str, ty: TypeExpr) -> Self {
        Self::new(name, ty, ParamMode::Value)
    }

    /// A `var` parameter.
    pub fn var(name: &str, ty: TypeExpr) -> Self {
        Self::new(name, ty, ParamMode::Var)
    }

    /// A `const` parameter.
    pub fn constant(name: &str, ty: TypeExpr) -> Self {
        Self::new(name, ty, ParamMode::Const)
    }

    /// A `lazy` parameter.
    pub fn lazy(name: &str, ty: TypeExpr) -> Self {
        Self::new(name, ty, ParamMode::Lazy)
    }

    /// Attach a default value.
    #[must_use]
    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }
}

/// What kind of routine a `FunctionDecl` declares.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Function,
    Procedure,
    Constructor,
    Destructor,
}

bitflags! {
    /// Method directives.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct MethodFlags: u8 {
        const VIRTUAL = 1 << 0;
        const OVERRIDE = 1 << 1;
        const ABSTRACT = 1 << 2;
        const OVERLOAD = 1 << 3;
        /// `class function` / `class procedure`: no `Self`, class context only.
        const CLASS = 1 << 4;
    }
}

/// A function, procedure, method, constructor, destructor or lambda.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Name,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    /// `None` for abstract methods, interface signatures and external routines.
    pub body: Option<Vec<Stmt>>,
    pub kind: FunctionKind,
    pub flags: MethodFlags,
    pub span: Span,
}

impl FunctionDecl {
    pub fn new(name: &str, kind: FunctionKind) -> Self {
        FunctionDecl {
            name: Name::new(name),
            params: Vec::new(),
            return_type: None,
            body: None,
            kind,
            flags: MethodFlags::empty(),
            span: Span::DUMMY,
        }
    }

    /// `function name(...): return_type`.
    pub fn function(name: &str, return_type: TypeExpr) -> Self {
        Self::new(name, FunctionKind::Function).returns(return_type)
    }

    /// `procedure name(...)`.
    pub fn procedure(name: &str) -> Self {
        Self::new(name, FunctionKind::Procedure)
    }

    /// `constructor name(...)`.
    pub fn constructor(name: &str) -> Self {
        Self::new(name, FunctionKind::Constructor)
    }

    /// `destructor name`.
    pub fn destructor(name: &str) -> Self {
        Self::new(name, FunctionKind::Destructor)
    }

    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn returns(mut self, ty: TypeExpr) -> Self {
        self.return_type = Some(ty);
        self
    }

    #[must_use]
    pub fn body(mut self, body: Vec<Stmt>) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Check if this is a class (static) method.
    #[inline]
    pub fn is_class_method(&self) -> bool {
        self.flags.contains(MethodFlags::CLASS)
    }

    /// Check if this is declared abstract or has no body.
    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MethodFlags::ABSTRACT) || self.body.is_none()
    }

    /// Check if this is a constructor.
    #[inline]
    pub fn is_constructor(&self) -> bool {
        self.kind == FunctionKind::Constructor
    }

    /// Number of parameters without a default value.
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| p.default.is_none()).count()
    }

    /// Check if two declarations have the same parameter signature.
    ///
    /// Used for overload hiding: a subclass overload with an identical
    /// signature replaces the parent's.
    pub fn same_signature(&self, other: &FunctionDecl) -> bool {
        self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a.mode == b.mode && a.ty == b.ty)
    }
}

/// A field or class variable.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub name: Name,
    pub ty: TypeExpr,
    pub init: Option<Expr>,
}

impl FieldDecl {
    pub fn new(name: &str, ty: TypeExpr) -> Self {
        FieldDecl {
            name: Name::new(name),
            ty,
            init: None,
        }
    }

    #[must_use]
    pub fn with_init(mut self, init: Expr) -> Self {
        self.init = Some(init);
        self
    }
}

/// A class constant.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassConstDecl {
    pub name: Name,
    pub ty: Option<TypeExpr>,
    pub value: Expr,
}

/// How a property reads or writes its value.
///
/// `Member` names either a field, a class variable, a class constant or a
/// method; the parser cannot tell which, so the evaluator decides at run time.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyAccess {
    Member(Name),
    /// A read-only expression evaluated with `Self` and all fields in scope.
    Expression(Expr),
}

impl PropertyAccess {
    pub fn member(name: &str) -> Self {
        PropertyAccess::Member(Name::new(name))
    }
}

/// A property declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDecl {
    pub name: Name,
    pub ty: TypeExpr,
    pub index_params: Vec<Param>,
    pub read: Option<PropertyAccess>,
    pub write: Option<PropertyAccess>,
    pub is_default: bool,
    pub is_class: bool,
}

impl PropertyDecl {
    pub fn new(name: &str, ty: TypeExpr) -> Self {
        PropertyDecl {
            name: Name::new(name),
            ty,
            index_params: Vec::new(),
            read: None,
            write: None,
            is_default: false,
            is_class: false,
        }
    }

    #[must_use]
    pub fn read(mut self, access: PropertyAccess) -> Self {
        self.read = Some(access);
        self
    }

    #[must_use]
    pub fn write(mut self, access: PropertyAccess) -> Self {
        self.write = Some(access);
        self
    }

    #[must_use]
    pub fn index_param(mut self, param: Param) -> Self {
        self.index_params.push(param);
        self
    }

    /// Mark as the class's default property (`obj[i]`).
    #[must_use]
    pub fn default_property(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Mark as a class property backed by class variables or class methods.
    #[must_use]
    pub fn class_property(mut self) -> Self {
        self.is_class = true;
        self
    }

    /// Check if the property takes index arguments.
    #[inline]
    pub fn is_indexed(&self) -> bool {
        !self.index_params.is_empty()
    }
}

/// Which operator an overload binds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Binary(BinaryOp),
    Unary(UnaryOp),
    /// `+=`, `-=`, ... bound directly.
    Compound(AssignOp),
}

impl OperatorKind {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            OperatorKind::Binary(op) => op.as_symbol(),
            OperatorKind::Unary(op) => op.as_symbol(),
            OperatorKind::Compound(op) => op.as_symbol(),
        }
    }
}

/// `[class] operator + (TLeft, TRight): TResult uses Implementation;`
#[derive(Clone, Debug, PartialEq)]
pub struct OperatorDecl {
    pub kind: OperatorKind,
    pub operand_types: Vec<TypeExpr>,
    pub return_type: Option<TypeExpr>,
    /// The function (global) or class method (class operator) implementing it.
    pub uses: Name,
}

impl OperatorDecl {
    pub fn new(kind: OperatorKind, operand_types: Vec<TypeExpr>, uses: &str) -> Self {
        OperatorDecl {
            kind,
            operand_types,
            return_type: None,
            uses: Name::new(uses),
        }
    }

    #[must_use]
    pub fn returns(mut self, ty: TypeExpr) -> Self {
        self.return_type = Some(ty);
        self
    }
}

/// A class declaration with its method bodies.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassDecl {
    pub name: Name,
    pub parent: Option<Name>,
    pub interfaces: Vec<Name>,
    pub is_abstract: bool,
    pub is_external: bool,
    pub fields: Vec<FieldDecl>,
    pub class_vars: Vec<FieldDecl>,
    pub constants: Vec<ClassConstDecl>,
    pub methods: Vec<Rc<FunctionDecl>>,
    pub properties: Vec<PropertyDecl>,
    pub operators: Vec<OperatorDecl>,
    pub span: Span,
}

impl ClassDecl {
    pub fn new(name: &str) -> Self {
        ClassDecl {
            name: Name::new(name),
            parent: None,
            interfaces: Vec::new(),
            is_abstract: false,
            is_external: false,
            fields: Vec::new(),
            class_vars: Vec::new(),
            constants: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            operators: Vec::new(),
            span: Span::DUMMY,
        }
    }

    #[must_use]
    pub fn parent(mut self, parent: &str) -> Self {
        self.parent = Some(Name::new(parent));
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(Name::new(interface));
        self
    }

    #[must_use]
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub fn external(mut self) -> Self {
        self.is_external = true;
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn class_var(mut self, var: FieldDecl) -> Self {
        self.class_vars.push(var);
        self
    }

    #[must_use]
    pub fn constant(mut self, name: &str, value: Expr) -> Self {
        self.constants.push(ClassConstDecl {
            name: Name::new(name),
            ty: None,
            value,
        });
        self
    }

    #[must_use]
    pub fn method(mut self, method: FunctionDecl) -> Self {
        self.methods.push(Rc::new(method));
        self
    }

    #[must_use]
    pub fn property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn operator(mut self, operator: OperatorDecl) -> Self {
        self.operators.push(operator);
        self
    }
}

/// An interface: method signatures plus an optional parent interface.
#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceDecl {
    pub name: Name,
    pub parent: Option<Name>,
    pub methods: Vec<Rc<FunctionDecl>>,
}

impl InterfaceDecl {
    pub fn new(name: &str) -> Self {
        InterfaceDecl {
            name: Name::new(name),
            parent: None,
            methods: Vec::new(),
        }
    }

    #[must_use]
    pub fn parent(mut self, parent: &str) -> Self {
        self.parent = Some(Name::new(parent));
        self
    }

    #[must_use]
    pub fn method(mut self, method: FunctionDecl) -> Self {
        self.methods.push(Rc::new(method));
        self
    }
}

/// A record type.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordDecl {
    pub name: Name,
    pub fields: Vec<FieldDecl>,
}

impl RecordDecl {
    pub fn new(name: &str) -> Self {
        RecordDecl {
            name: Name::new(name),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }
}

/// An enum member with an optional explicit ordinal.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumMember {
    pub name: Name,
    pub value: Option<i64>,
}

/// An enumerated type.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumDecl {
    pub name: Name,
    pub members: Vec<EnumMember>,
}

impl EnumDecl {
    /// An enum whose members take consecutive ordinals from zero.
    pub fn new(name: &str, members: &[&str]) -> Self {
        EnumDecl {
            name: Name::new(name),
            members: members
                .iter()
                .map(|member| EnumMember {
                    name: Name::new(member),
                    value: None,
                })
                .collect(),
        }
    }
}

/// `type Name = T;`
#[derive(Clone, Debug, PartialEq)]
pub struct TypeAlias {
    pub name: Name,
    pub ty: TypeExpr,
}

/// A top-level declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum Decl {
    Function(Rc<FunctionDecl>),
    Class(Rc<ClassDecl>),
    Interface(Rc<InterfaceDecl>),
    Record(Rc<RecordDecl>),
    Enum(Rc<EnumDecl>),
    TypeAlias(TypeAlias),
    Operator(OperatorDecl),
}

impl Decl {
    pub fn function(decl: FunctionDecl) -> Self {
        Decl::Function(Rc::new(decl))
    }

    pub fn class(decl: ClassDecl) -> Self {
        Decl::Class(Rc::new(decl))
    }

    pub fn interface(decl: InterfaceDecl) -> Self {
        Decl::Interface(Rc::new(decl))
    }

    pub fn record(decl: RecordDecl) -> Self {
        Decl::Record(Rc::new(decl))
    }

    pub fn enumeration(decl: EnumDecl) -> Self {
        Decl::Enum(Rc::new(decl))
    }

    pub fn alias(name: &str, ty: TypeExpr) -> Self {
        Decl::TypeAlias(TypeAlias {
            name: Name::new(name),
            ty,
        })
    }
}

/// A checked program: declarations followed by the main body.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Program {
    pub declarations: Vec<Decl>,
    pub body: Vec<Stmt>,
}

impl Program {
    pub fn new(declarations: Vec<Decl>, body: Vec<Stmt>) -> Self {
        Program { declarations, body }
    }
}
