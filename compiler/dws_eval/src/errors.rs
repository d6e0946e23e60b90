//! Error types and the evaluator's control channel.
//!
//! `EvalErrorKind` gives every runtime failure a typed category; factory
//! functions (e.g. `division_by_zero(..)`) are the public way to build an
//! `EvalError` and keep `kind` and `message` in sync.
//!
//! Evaluation returns `Result<Value, ControlAction>`. The `Err` side carries
//! either a real error or one of the cooperative signals (break, continue,
//! exit, raise). Script exceptions are not errors: the raised object lives in
//! the interpreter's active-exception slot and `ControlAction::Raise` only
//! unwinds to the nearest `try`.

use std::fmt;

use dws_ir::Span;

use crate::value::Value;

/// Result of evaluating an expression.
pub type EvalResult = Result<Value, ControlAction>;

/// Result of executing a statement.
pub type ExecResult = Result<(), ControlAction>;

/// Typed error category.
///
/// The `Display` impl is the canonical message text; factory functions copy
/// it into `EvalError::message`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    // Type/Operator
    #[error("type mismatch: {left} {op} {right}")]
    TypeMismatch {
        left: String,
        op: String,
        right: String,
    },
    #[error("expected {expected}, got {got}")]
    ExpectedType { expected: String, got: String },
    #[error("cannot convert '{value}' to {target}")]
    ConversionError { value: String, target: String },
    #[error("cannot cast {from} to {to}")]
    InvalidCast { from: String, to: String },
    #[error("value of type {type_name} is not callable")]
    NotCallable { type_name: String },

    // Arithmetic
    #[error("division by zero: {left} {op} {right}")]
    DivisionByZero {
        left: String,
        op: String,
        right: String,
    },

    // Access
    #[error("undefined variable: {name}")]
    UndefinedVariable { name: String },
    #[error("undefined function: {name}")]
    UndefinedFunction { name: String },
    #[error("undefined type: {name}")]
    UndefinedType { name: String },
    #[error("method '{method}' not found in {type_name}")]
    UndefinedMethod { method: String, type_name: String },
    #[error("field '{field}' not found in {type_name}")]
    UndefinedField { field: String, type_name: String },
    #[error("class '{name}' not found")]
    UndefinedClass { name: String },
    #[error("property '{property}' not found in {class}")]
    UndefinedProperty { property: String, class: String },
    #[error("object not instantiated (accessing '{member}')")]
    NilReference { member: String },
    #[error("cannot assign to constant '{name}'")]
    ConstantAssignment { name: String },
    #[error("invalid assignment target")]
    InvalidAssignmentTarget,

    // Calls
    #[error("{name} expects {expected} argument(s), got {got}")]
    WrongArgumentCount {
        name: String,
        expected: String,
        got: usize,
    },
    #[error("there is no overloaded version of \"{name}\" that can be called with these arguments")]
    NoMatchingOverload { name: String },
    #[error("maximal recursion depth of {depth} exceeded")]
    MaxRecursionExceeded { depth: usize },

    // Classes
    #[error("trying to create an instance of abstract class {class}")]
    AbstractInstantiation { class: String },
    #[error("trying to create an instance of external class {class}")]
    ExternalInstantiation { class: String },
    #[error("abstract method {class}.{method} called")]
    AbstractMethodCall { class: String, method: String },

    // Properties
    #[error("circular reference reading property '{property}'")]
    CircularPropertyReference { property: String },
    #[error("property '{property}' is read-only")]
    ReadOnlyProperty { property: String },
    #[error("property '{property}' is write-only")]
    WriteOnlyProperty { property: String },
    #[error("indexed property '{property}' requires index arguments")]
    IndexedPropertyWithoutIndex { property: String },

    // Ranges
    #[error("value {value} out of range for {type_name} ({low}..{high})")]
    OutOfRange {
        value: i64,
        type_name: String,
        low: i64,
        high: i64,
    },
    #[error("index {index} out of bounds ({low}..{high})")]
    IndexOutOfBounds { index: i64, low: i64, high: i64 },

    // Control flow
    #[error("FOR loop STEP should be strictly positive: {step}")]
    InvalidStep { step: i64 },
    #[error("{type_name} is not iterable")]
    NotIterable { type_name: String },
    #[error("re-raise outside of an exception handler")]
    ReraiseOutsideHandler,
    #[error("uncaught exception {class}: {message}")]
    UncaughtException { class: String, message: String },

    /// Catch-all for host-defined failures.
    #[error("{message}")]
    Custom { message: String },
}

/// Additional context note attached to an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalNote {
    pub message: String,
    pub span: Option<Span>,
}

impl EvalNote {
    /// Create a note with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }
}

/// A single frame in an evaluation backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    /// Qualified function or method name (`TFoo.Bar`).
    pub name: String,
    /// Source location of the call site.
    pub span: Option<Span>,
}

/// Immutable snapshot of the call stack, most recent call first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    /// Create a backtrace from a list of frames.
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    /// Get the backtrace frames.
    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    /// Check if the backtrace is empty.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of frames in the backtrace.
    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "  {i}: {}", frame.name)?;
            if let Some(span) = frame.span {
                write!(f, " at {span}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Human-readable error message (`kind.to_string()` for factory errors).
    pub message: String,
    /// Source location where the error occurred.
    pub span: Option<Span>,
    /// Call stack at the error site.
    pub backtrace: Option<EvalBacktrace>,
    /// Additional context notes.
    pub notes: Vec<EvalNote>,
}

impl EvalError {
    /// Create an error with just a message.
    ///
    /// Uses `Custom` kind. Prefer the factory functions below when a
    /// structured kind exists.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_kind(EvalErrorKind::Custom { message })
    }

    /// Create an error from a structured kind.
    pub fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            span: None,
            backtrace: None,
            notes: Vec::new(),
        }
    }

    /// Attach a source span, keeping the innermost one if already set.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() && !span.is_dummy() {
            self.span = Some(span);
        }
        self
    }

    /// Attach a backtrace to this error.
    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        self.backtrace = Some(backtrace);
        self
    }

    /// Add a context note to this error.
    #[must_use]
    pub fn with_note(mut self, note: EvalNote) -> Self {
        self.notes.push(note);
        self
    }
}

/// The `Err` channel of evaluation.
///
/// Each construct clears only the signals it owns: loops consume `Break` and
/// `Continue`, the call boundary consumes `Exit`, a `try` consumes `Raise`
/// when a handler matches, and the program root consumes a stray `Exit`.
#[derive(Clone, Debug)]
pub enum ControlAction {
    Error(Box<EvalError>),
    Break,
    Continue,
    Exit,
    /// An exception is unwinding; see `Interpreter::active_exception`.
    Raise,
}

impl ControlAction {
    /// Check if this is a real error rather than a signal.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, ControlAction::Error(_))
    }

    /// Attach a span to a carried error; signals pass through untouched.
    #[must_use]
    pub fn with_span(self, span: Span) -> Self {
        match self {
            ControlAction::Error(err) => ControlAction::Error(Box::new(err.with_span(span))),
            other => other,
        }
    }
}

impl From<EvalError> for ControlAction {
    fn from(err: EvalError) -> Self {
        ControlAction::Error(Box::new(err))
    }
}

// Factory functions

#[cold]
pub fn type_mismatch(left: &str, op: &str, right: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        left: left.to_string(),
        op: op.to_string(),
        right: right.to_string(),
    })
}

#[cold]
pub fn expected_type(expected: &str, got: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ExpectedType {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

#[cold]
pub fn conversion_error(value: &str, target: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ConversionError {
        value: value.to_string(),
        target: target.to_string(),
    })
}

#[cold]
pub fn invalid_cast(from: &str, to: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidCast {
        from: from.to_string(),
        to: to.to_string(),
    })
}

#[cold]
pub fn not_callable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn division_by_zero(left: &str, op: &str, right: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero {
        left: left.to_string(),
        op: op.to_string(),
        right: right.to_string(),
    })
}

#[cold]
pub fn undefined_variable(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedVariable {
        name: name.to_string(),
    })
}

#[cold]
pub fn undefined_function(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedFunction {
        name: name.to_string(),
    })
}

#[cold]
pub fn undefined_type(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedType {
        name: name.to_string(),
    })
}

#[cold]
pub fn undefined_method(method: &str, type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedMethod {
        method: method.to_string(),
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn undefined_field(field: &str, type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedField {
        field: field.to_string(),
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn undefined_class(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedClass {
        name: name.to_string(),
    })
}

#[cold]
pub fn undefined_property(property: &str, class: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedProperty {
        property: property.to_string(),
        class: class.to_string(),
    })
}

#[cold]
pub fn nil_reference(member: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NilReference {
        member: member.to_string(),
    })
}

#[cold]
pub fn constant_assignment(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ConstantAssignment {
        name: name.to_string(),
    })
}

#[cold]
pub fn invalid_assignment_target() -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidAssignmentTarget)
}

#[cold]
pub fn wrong_argument_count(name: &str, min: usize, max: usize, got: usize) -> EvalError {
    let expected = if min == max {
        min.to_string()
    } else {
        format!("{min}..{max}")
    };
    EvalError::from_kind(EvalErrorKind::WrongArgumentCount {
        name: name.to_string(),
        expected,
        got,
    })
}

#[cold]
pub fn no_matching_overload(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NoMatchingOverload {
        name: name.to_string(),
    })
}

#[cold]
pub fn max_recursion_exceeded(depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::MaxRecursionExceeded { depth })
}

#[cold]
pub fn abstract_instantiation(class: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::AbstractInstantiation {
        class: class.to_string(),
    })
}

#[cold]
pub fn external_instantiation(class: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ExternalInstantiation {
        class: class.to_string(),
    })
}

#[cold]
pub fn abstract_method_call(class: &str, method: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::AbstractMethodCall {
        class: class.to_string(),
        method: method.to_string(),
    })
}

#[cold]
pub fn circular_property_reference(property: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::CircularPropertyReference {
        property: property.to_string(),
    })
}

#[cold]
pub fn read_only_property(property: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ReadOnlyProperty {
        property: property.to_string(),
    })
}

#[cold]
pub fn write_only_property(property: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::WriteOnlyProperty {
        property: property.to_string(),
    })
}

#[cold]
pub fn indexed_property_without_index(property: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexedPropertyWithoutIndex {
        property: property.to_string(),
    })
}

#[cold]
pub fn out_of_range(value: i64, type_name: &str, low: i64, high: i64) -> EvalError {
    EvalError::from_kind(EvalErrorKind::OutOfRange {
        value,
        type_name: type_name.to_string(),
        low,
        high,
    })
}

#[cold]
pub fn index_out_of_bounds(index: i64, low: i64, high: i64) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfBounds { index, low, high })
}

#[cold]
pub fn invalid_step(step: i64) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidStep { step })
}

#[cold]
pub fn not_iterable(type_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotIterable {
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn reraise_outside_handler() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ReraiseOutsideHandler)
}

#[cold]
pub fn uncaught_exception(class: &str, message: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UncaughtException {
        class: class.to_string(),
        message: message.to_string(),
    })
}
