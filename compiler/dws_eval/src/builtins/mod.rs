//! Built-in functions.
//!
//! A built-in is a plain function pointer over already-evaluated arguments.
//! Parameters listed in `by_ref` receive a `Value::Reference` to the
//! caller's slot instead of a value (`Inc`, `SetLength`, `Include`, ...).
//!
//! Only the core set lives here; hosts add their own through
//! `InterpreterBuilder::builtin`.

use std::rc::Rc;

use dws_ir::Name;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::{conversion_error, expected_type, out_of_range, EvalError};
use crate::print_handler::PrintHandler;
use crate::types::{TypeInfo, TypeRegistry};
use crate::value::{
    cast_to_boolean, cast_to_integer, cast_to_string, format_float, EnumValue, Reference,
    SubrangeValue, TypeMeta, Value,
};

/// What a built-in can reach besides its arguments.
pub struct BuiltinContext<'a> {
    pub print: &'a PrintHandler,
    pub types: &'a mut TypeRegistry,
}

/// Failure of a built-in.
#[derive(Debug)]
pub enum BuiltinError {
    /// An evaluation error; aborts the program.
    Error(EvalError),
    /// A script exception of class `class`, catchable by `try`.
    Raise { class: Name, message: String },
}

impl BuiltinError {
    pub fn raise(class: &str, message: impl Into<String>) -> Self {
        BuiltinError::Raise {
            class: Name::new(class),
            message: message.into(),
        }
    }
}

impl From<EvalError> for BuiltinError {
    fn from(err: EvalError) -> Self {
        BuiltinError::Error(err)
    }
}

/// Signature of every built-in.
pub type BuiltinFn = fn(&mut BuiltinContext<'_>, &[Value]) -> Result<Value, BuiltinError>;

/// A registered built-in.
#[derive(Clone, Debug)]
pub struct Builtin {
    pub name: Name,
    pub min_args: usize,
    /// `None` for variadic built-ins.
    pub max_args: Option<usize>,
    /// Argument positions passed by reference.
    pub by_ref: SmallVec<[usize; 2]>,
    pub func: BuiltinFn,
}

impl Builtin {
    pub fn new(name: &str, min_args: usize, max_args: Option<usize>, func: BuiltinFn) -> Self {
        Builtin {
            name: Name::new(name),
            min_args,
            max_args,
            by_ref: SmallVec::new(),
            func,
        }
    }

    /// Pass the argument at `index` by reference.
    #[must_use]
    pub fn by_reference(mut self, index: usize) -> Self {
        self.by_ref.push(index);
        self
    }

    #[inline]
    pub fn is_by_ref(&self, index: usize) -> bool {
        self.by_ref.contains(&index)
    }

    /// Check if `count` arguments are acceptable.
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }
}

/// Name-keyed table of built-ins.
#[derive(Clone, Debug, Default)]
pub struct BuiltinRegistry {
    entries: FxHashMap<Name, Rc<Builtin>>,
}

impl BuiltinRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the core built-ins.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        for builtin in core_builtins() {
            registry.register(builtin);
        }
        registry
    }

    /// Add or replace a built-in.
    pub fn register(&mut self, builtin: Builtin) {
        self.entries.insert(builtin.name.clone(), Rc::new(builtin));
    }

    pub fn get(&self, name: &Name) -> Option<Rc<Builtin>> {
        self.entries.get(name).cloned()
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn core_builtins() -> Vec<Builtin> {
    vec![
        Builtin::new("Print", 0, None, builtin_print),
        Builtin::new("PrintLn", 0, None, builtin_println),
        Builtin::new("Length", 1, Some(1), builtin_length),
        Builtin::new("SetLength", 2, Some(2), builtin_set_length).by_reference(0),
        Builtin::new("Low", 1, Some(1), builtin_low),
        Builtin::new("High", 1, Some(1), builtin_high),
        Builtin::new("Ord", 1, Some(1), builtin_ord),
        Builtin::new("Chr", 1, Some(1), builtin_chr),
        Builtin::new("Succ", 1, Some(1), builtin_succ),
        Builtin::new("Pred", 1, Some(1), builtin_pred),
        Builtin::new("Inc", 1, Some(2), builtin_inc).by_reference(0),
        Builtin::new("Dec", 1, Some(2), builtin_dec).by_reference(0),
        Builtin::new("Include", 2, Some(2), builtin_include).by_reference(0),
        Builtin::new("Exclude", 2, Some(2), builtin_exclude).by_reference(0),
        Builtin::new("IntToStr", 1, Some(1), builtin_int_to_str),
        Builtin::new("StrToInt", 1, Some(1), builtin_str_to_int),
        Builtin::new("FloatToStr", 1, Some(1), builtin_float_to_str),
        Builtin::new("Assigned", 1, Some(1), builtin_assigned),
        Builtin::new("TypeOf", 1, Some(1), builtin_type_of),
        Builtin::new("Assert", 1, Some(2), builtin_assert),
    ]
}

fn reference_arg<'v>(args: &'v [Value], index: usize, builtin: &str) -> Result<&'v Reference, EvalError> {
    match args.get(index) {
        Some(Value::Reference(reference)) => Ok(reference),
        Some(other) => Err(expected_type(&format!("variable as argument of {builtin}"), &other.type_name())),
        None => Err(expected_type(&format!("variable as argument of {builtin}"), "nothing")),
    }
}

fn integer_arg(args: &[Value], index: usize) -> Result<i64, EvalError> {
    match args.get(index) {
        Some(value) => value
            .as_integer()
            .ok_or_else(|| expected_type("Integer", &value.type_name())),
        None => Err(expected_type("Integer", "nothing")),
    }
}

fn concat(args: &[Value]) -> String {
    args.iter().map(ToString::to_string).collect()
}

fn builtin_print(ctx: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    ctx.print.print(&concat(args));
    Ok(Value::Nil)
}

fn builtin_println(ctx: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    ctx.print.println(&concat(args));
    Ok(Value::Nil)
}

fn length_of(value: &Value) -> Result<i64, EvalError> {
    let len = match value {
        Value::String(s) => s.chars().count(),
        Value::Array(array) => array.borrow().len(),
        Value::Set(set) => set.len(),
        Value::Variant(Some(inner)) => return length_of(inner),
        other => return Err(expected_type("array or string", &other.type_name())),
    };
    Ok(i64::try_from(len).unwrap_or(i64::MAX))
}

fn builtin_length(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    Ok(Value::Integer(length_of(&args[0])?))
}

/// Largest length `SetLength` accepts for a dynamic array or string.
pub const MAX_DYNAMIC_LENGTH: i64 = 1 << 24;

fn builtin_set_length(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    let target = reference_arg(args, 0, "SetLength")?;
    let len = integer_arg(args, 1)?;
    let len = usize::try_from(len)
        .ok()
        .filter(|_| len <= MAX_DYNAMIC_LENGTH)
        .ok_or_else(|| out_of_range(len, "length", 0, MAX_DYNAMIC_LENGTH))?;
    match target.read()? {
        Value::Array(array) => {
            if array.borrow().fixed {
                return Err(expected_type("dynamic array", &array.borrow().type_name()).into());
            }
            array.borrow_mut().resize(len);
        }
        Value::String(s) => {
            let mut chars: Vec<char> = s.chars().collect();
            chars.resize(len, ' ');
            target.write(Value::from(chars.into_iter().collect::<String>()))?;
        }
        other => return Err(expected_type("dynamic array or string", &other.type_name()).into()),
    }
    Ok(Value::Nil)
}

/// Bounds of the ordinal domain or the index range of `value`.
fn bounds_of(value: &Value) -> Result<(Value, Value), EvalError> {
    match value {
        Value::Array(array) => {
            let array = array.borrow();
            Ok((Value::Integer(array.low), Value::Integer(array.high())))
        }
        Value::String(s) => {
            let len = i64::try_from(s.chars().count()).unwrap_or(i64::MAX);
            Ok((Value::Integer(1), Value::Integer(len)))
        }
        Value::Enum(e) => type_bounds(&TypeInfo::Enum(Rc::clone(&e.ty))),
        Value::Subrange(s) => type_bounds(&TypeInfo::Subrange(Rc::clone(&s.ty))),
        Value::Integer(_) => type_bounds(&TypeInfo::Integer),
        Value::Boolean(_) => type_bounds(&TypeInfo::Boolean),
        Value::TypeMeta(meta) => type_bounds(&meta.info),
        Value::Variant(Some(inner)) => bounds_of(inner),
        other => Err(expected_type("ordinal type or array", &other.type_name())),
    }
}

fn type_bounds(ty: &TypeInfo) -> Result<(Value, Value), EvalError> {
    match ty {
        TypeInfo::Integer => Ok((Value::Integer(i64::MIN), Value::Integer(i64::MAX))),
        TypeInfo::Boolean => Ok((Value::Boolean(false), Value::Boolean(true))),
        TypeInfo::Enum(enum_ty) => {
            let member = |ordinal| {
                Value::Enum(EnumValue {
                    ty: Rc::clone(enum_ty),
                    ordinal,
                })
            };
            Ok((member(enum_ty.low()), member(enum_ty.high())))
        }
        TypeInfo::Subrange(sub) => Ok((Value::Integer(sub.low), Value::Integer(sub.high))),
        TypeInfo::Array(array) => match array.bounds {
            Some((low, high)) => Ok((Value::Integer(low), Value::Integer(high))),
            None => Err(expected_type("static array type", &ty.name())),
        },
        other => Err(expected_type("ordinal type or array", &other.name())),
    }
}

fn builtin_low(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    Ok(bounds_of(&args[0])?.0)
}

fn builtin_high(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    Ok(bounds_of(&args[0])?.1)
}

fn builtin_ord(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    let value = &args[0];
    value
        .ordinal()
        .map(Value::Integer)
        .ok_or_else(|| expected_type("ordinal", &value.type_name()).into())
}

fn builtin_chr(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    let code = integer_arg(args, 0)?;
    let c = u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| conversion_error(&code.to_string(), "Char"))?;
    Ok(Value::from(c.to_string()))
}

/// The ordinal `delta` steps away from `value`, within its type's domain.
pub(crate) fn step_ordinal(value: &Value, delta: i64) -> Result<Value, EvalError> {
    match value {
        Value::Integer(i) => Ok(Value::Integer(i.wrapping_add(delta))),
        Value::Subrange(s) => {
            let next = s.value.saturating_add(delta);
            if !s.ty.contains(next) {
                return Err(out_of_range(next, s.ty.name.as_str(), s.ty.low, s.ty.high));
            }
            Ok(Value::Subrange(SubrangeValue {
                value: next,
                ty: Rc::clone(&s.ty),
            }))
        }
        Value::Enum(e) => {
            let next = e
                .ty
                .position(e.ordinal)
                .and_then(|pos| i64::try_from(pos).ok())
                .map(|pos| pos.saturating_add(delta))
                .and_then(|pos| usize::try_from(pos).ok())
                .and_then(|pos| e.ty.members.get(pos));
            match next {
                Some((_, ordinal)) => Ok(Value::Enum(EnumValue {
                    ty: Rc::clone(&e.ty),
                    ordinal: *ordinal,
                })),
                None => Err(out_of_range(
                    e.ordinal.saturating_add(delta),
                    e.ty.name.as_str(),
                    e.ty.low(),
                    e.ty.high(),
                )),
            }
        }
        Value::Boolean(b) => match i64::from(*b).saturating_add(delta) {
            0 => Ok(Value::Boolean(false)),
            1 => Ok(Value::Boolean(true)),
            other => Err(out_of_range(other, "Boolean", 0, 1)),
        },
        Value::String(_) => {
            let code = value
                .ordinal()
                .ok_or_else(|| expected_type("ordinal", "String"))?
                .saturating_add(delta);
            let c = u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| conversion_error(&code.to_string(), "Char"))?;
            Ok(Value::from(c.to_string()))
        }
        Value::Variant(Some(inner)) => step_ordinal(inner, delta).map(Value::variant),
        other => Err(expected_type("ordinal", &other.type_name())),
    }
}

fn builtin_succ(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    Ok(step_ordinal(&args[0], 1)?)
}

fn builtin_pred(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    Ok(step_ordinal(&args[0], -1)?)
}

fn step_in_place(args: &[Value], sign: i64, builtin: &str) -> Result<Value, BuiltinError> {
    let target = reference_arg(args, 0, builtin)?;
    let amount = if args.len() > 1 { integer_arg(args, 1)? } else { 1 };
    let current = target.read()?;
    let next = match &current {
        Value::Float(x) => {
            #[expect(clippy::cast_precision_loss, reason = "Integer to Float widening")]
            let step = amount.wrapping_mul(sign) as f64;
            Value::Float(x + step)
        }
        _ => step_ordinal(&current, amount.wrapping_mul(sign))?,
    };
    target.write(next)?;
    Ok(Value::Nil)
}

fn builtin_inc(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    step_in_place(args, 1, "Inc")
}

fn builtin_dec(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    step_in_place(args, -1, "Dec")
}

fn update_set(args: &[Value], include: bool, builtin: &str) -> Result<Value, BuiltinError> {
    let target = reference_arg(args, 0, builtin)?;
    let mut set = match target.read()?.unbox() {
        Value::Set(set) => set,
        other => return Err(expected_type("set", &other.type_name()).into()),
    };
    let ordinal = args[1]
        .ordinal()
        .ok_or_else(|| expected_type("ordinal", &args[1].type_name()))?;
    if include {
        set.insert(ordinal)?;
    } else {
        set.remove(ordinal)?;
    }
    target.write(Value::Set(set))?;
    Ok(Value::Nil)
}

fn builtin_include(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    update_set(args, true, "Include")
}

fn builtin_exclude(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    update_set(args, false, "Exclude")
}

fn builtin_int_to_str(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    Ok(Value::from(integer_arg(args, 0)?.to_string()))
}

fn builtin_str_to_int(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    let text = cast_to_string(&args[0])?;
    match cast_to_integer(&Value::from(text.as_str())) {
        Ok(value) => Ok(Value::Integer(value)),
        Err(_) => Err(BuiltinError::raise(
            "EConvertError",
            format!("'{text}' is not a valid integer value"),
        )),
    }
}

fn builtin_float_to_str(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    match args[0].clone().unbox() {
        Value::Float(x) => Ok(Value::from(format_float(x))),
        Value::Integer(i) => Ok(Value::from(i.to_string())),
        other => Err(expected_type("Float", &other.type_name()).into()),
    }
}

fn builtin_assigned(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    Ok(Value::Boolean(
        !args[0].is_nil() && !matches!(args[0], Value::Variant(None)),
    ))
}

/// The RTTI token of a value's runtime type.
pub(crate) fn type_info_of(value: &Value) -> TypeInfo {
    match value {
        Value::Integer(_) => TypeInfo::Integer,
        Value::Float(_) => TypeInfo::Float,
        Value::String(_) => TypeInfo::String,
        Value::Boolean(_) => TypeInfo::Boolean,
        Value::Enum(e) => TypeInfo::Enum(Rc::clone(&e.ty)),
        Value::Subrange(s) => TypeInfo::Subrange(Rc::clone(&s.ty)),
        Value::Set(s) => TypeInfo::Set(Rc::new(crate::types::SetType {
            element: s.element().clone(),
        })),
        Value::Array(a) => {
            let array = a.borrow();
            TypeInfo::Array(Rc::new(crate::types::ArrayType {
                element: array.element.clone(),
                bounds: array.fixed.then(|| (array.low, array.high())),
            }))
        }
        Value::Record(r) => TypeInfo::Record(Rc::clone(&r.borrow().ty)),
        Value::Object(o) => TypeInfo::Class(o.class().name.clone()),
        Value::Interface(i) => TypeInfo::Interface(i.info.name.clone()),
        Value::TypeMeta(meta) => meta.info.clone(),
        Value::Variant(Some(inner)) => type_info_of(inner),
        Value::Nil
        | Value::Variant(None)
        | Value::Function(_)
        | Value::Reference(_)
        | Value::Lazy(_) => TypeInfo::Variant,
    }
}

fn builtin_type_of(ctx: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    let info = type_info_of(&args[0]);
    let id = ctx.types.id_of(&info);
    Ok(Value::TypeMeta(TypeMeta { id, info }))
}

fn builtin_assert(_: &mut BuiltinContext<'_>, args: &[Value]) -> Result<Value, BuiltinError> {
    if cast_to_boolean(&args[0])? {
        return Ok(Value::Nil);
    }
    let message = match args.get(1) {
        Some(msg) => format!("Assertion failed: {}", cast_to_string(msg)?),
        None => "Assertion failed".to_string(),
    };
    Err(BuiltinError::raise("EAssertionFailed", message))
}
