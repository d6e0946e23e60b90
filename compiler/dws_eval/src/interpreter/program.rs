//! Loading declarations into the interpreter's tables.
//!
//! Types are registered in dependency order: enums, records and aliases in
//! declaration order, then interfaces and classes parent-first, then free
//! functions and global operators. Class and interface names are known up
//! front so records and fields may refer to classes declared later.

use std::rc::Rc;

use dws_ir::{
    BinaryOp, ClassDecl, Decl, EnumDecl, InterfaceDecl, Name, OperatorDecl, OperatorKind,
    RecordDecl, TypeAlias, TypeExpr,
};

use super::Interpreter;
use crate::class::{
    ClassInfo, FieldInfo, InterfaceInfo, OperatorBinding, OperatorTarget, PropertyInfo,
};
use crate::environment::Mutability;
use crate::errors::{undefined_class, undefined_type, EvalError};
use crate::types::{
    ArrayType, EnumType, FunctionType, RecordField, RecordType, SetType, SubrangeType, TypeInfo,
};
use crate::value::EnumValue;

/// Name of the implicit root class.
pub(crate) const ROOT_CLASS: &str = "TObject";

impl Interpreter {
    /// Register `decls` so the main body and later calls can use them.
    pub(crate) fn load(&mut self, decls: &[Decl]) -> Result<(), EvalError> {
        for decl in decls {
            match decl {
                Decl::Class(class) => {
                    self.types
                        .insert(class.name.clone(), TypeInfo::Class(class.name.clone()));
                }
                Decl::Interface(intf) => {
                    self.types
                        .insert(intf.name.clone(), TypeInfo::Interface(intf.name.clone()));
                }
                _ => {}
            }
        }

        for decl in decls {
            match decl {
                Decl::Enum(decl) => self.load_enum(decl),
                Decl::Record(decl) => self.load_record(decl)?,
                Decl::TypeAlias(alias) => self.load_alias(alias)?,
                _ => {}
            }
        }

        let interfaces: Vec<Rc<InterfaceDecl>> = decls
            .iter()
            .filter_map(|decl| match decl {
                Decl::Interface(intf) => Some(Rc::clone(intf)),
                _ => None,
            })
            .collect();
        self.load_interfaces(interfaces)?;

        let classes: Vec<Rc<ClassDecl>> = decls
            .iter()
            .filter_map(|decl| match decl {
                Decl::Class(class) => Some(Rc::clone(class)),
                _ => None,
            })
            .collect();
        self.load_classes(classes)?;

        for decl in decls {
            match decl {
                Decl::Function(func) => {
                    self.functions
                        .entry(func.name.clone())
                        .or_default()
                        .push(Rc::clone(func));
                }
                Decl::Operator(op) => self.load_global_operator(op)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Resolve a type annotation against the loaded type table.
    pub(crate) fn resolve_type(&self, ty: &TypeExpr) -> Result<TypeInfo, EvalError> {
        Ok(match ty {
            TypeExpr::Named(name) => self
                .types
                .get(name)
                .cloned()
                .ok_or_else(|| undefined_type(name.as_str()))?,
            TypeExpr::StaticArray { low, high, element } => TypeInfo::Array(Rc::new(ArrayType {
                element: self.resolve_type(element)?,
                bounds: Some((*low, *high)),
            })),
            TypeExpr::DynamicArray(element) => TypeInfo::Array(Rc::new(ArrayType {
                element: self.resolve_type(element)?,
                bounds: None,
            })),
            TypeExpr::Set(element) => TypeInfo::Set(Rc::new(SetType {
                element: self.resolve_type(element)?,
            })),
            TypeExpr::Subrange { low, high } => TypeInfo::Subrange(Rc::new(SubrangeType {
                name: Name::new(&format!("{low}..{high}")),
                low: *low,
                high: *high,
            })),
            TypeExpr::Function(sig) => {
                let params = sig
                    .params
                    .iter()
                    .map(|(mode, ty)| Ok((*mode, self.resolve_type(ty)?)))
                    .collect::<Result<Vec<_>, EvalError>>()?;
                let result = sig
                    .return_type
                    .as_ref()
                    .map(|ty| self.resolve_type(ty))
                    .transpose()?;
                TypeInfo::Function(Rc::new(FunctionType {
                    params,
                    result,
                    of_object: sig.of_object,
                }))
            }
        })
    }

    fn load_enum(&mut self, decl: &EnumDecl) {
        let mut next = 0i64;
        let members: Vec<(Name, i64)> = decl
            .members
            .iter()
            .map(|member| {
                let ordinal = member.value.unwrap_or(next);
                next = ordinal.wrapping_add(1);
                (member.name.clone(), ordinal)
            })
            .collect();
        let ty = Rc::new(EnumType {
            name: decl.name.clone(),
            members,
        });
        for (name, ordinal) in &ty.members {
            self.enum_members.insert(
                name.clone(),
                EnumValue {
                    ty: Rc::clone(&ty),
                    ordinal: *ordinal,
                },
            );
        }
        tracing::debug!(name = %decl.name, members = ty.members.len(), "registered enum");
        self.types.insert(decl.name.clone(), TypeInfo::Enum(ty));
    }

    fn load_record(&mut self, decl: &RecordDecl) -> Result<(), EvalError> {
        let mut fields = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            let ty = self.resolve_type(&field.ty)?;
            let default = match &field.init {
                Some(init) => {
                    let value = self.eval_in(self.global.clone(), init)?;
                    Some(self.coerce_to(value, &ty)?)
                }
                None => None,
            };
            fields.push(RecordField {
                name: field.name.clone(),
                ty,
                default,
            });
        }
        tracing::debug!(name = %decl.name, fields = fields.len(), "registered record");
        self.types.insert(
            decl.name.clone(),
            TypeInfo::Record(Rc::new(RecordType {
                name: decl.name.clone(),
                fields,
            })),
        );
        Ok(())
    }

    fn load_alias(&mut self, alias: &TypeAlias) -> Result<(), EvalError> {
        // A named subrange reports its own name in range errors.
        let ty = match &alias.ty {
            TypeExpr::Subrange { low, high } => TypeInfo::Subrange(Rc::new(SubrangeType {
                name: alias.name.clone(),
                low: *low,
                high: *high,
            })),
            other => self.resolve_type(other)?,
        };
        self.types.insert(alias.name.clone(), ty);
        Ok(())
    }

    fn load_interfaces(&mut self, mut pending: Vec<Rc<InterfaceDecl>>) -> Result<(), EvalError> {
        while !pending.is_empty() {
            let before = pending.len();
            let mut waiting = Vec::new();
            for decl in pending {
                let parent = match &decl.parent {
                    Some(name) => match self.interfaces.get(name) {
                        Some(parent) => Some(Rc::clone(parent)),
                        None => {
                            waiting.push(decl);
                            continue;
                        }
                    },
                    None => None,
                };
                tracing::debug!(name = %decl.name, "registered interface");
                self.interfaces.insert(
                    decl.name.clone(),
                    Rc::new(InterfaceInfo {
                        name: decl.name.clone(),
                        parent,
                        methods: decl.methods.clone(),
                    }),
                );
            }
            if waiting.len() == before {
                let missing = waiting
                    .iter()
                    .find_map(|decl| decl.parent.clone())
                    .map_or_else(String::new, |name| name.to_string());
                return Err(undefined_type(&missing));
            }
            pending = waiting;
        }
        Ok(())
    }

    fn load_classes(&mut self, mut pending: Vec<Rc<ClassDecl>>) -> Result<(), EvalError> {
        let root = Name::new(ROOT_CLASS);
        while !pending.is_empty() {
            let before = pending.len();
            let mut waiting = Vec::new();
            for decl in pending {
                let parent_name = match &decl.parent {
                    Some(name) => Some(name.clone()),
                    None if decl.name != root => Some(root.clone()),
                    None => None,
                };
                let parent = match parent_name {
                    Some(name) => match self.classes.get(&name) {
                        Some(parent) => Some(Rc::clone(parent)),
                        None => {
                            waiting.push(decl);
                            continue;
                        }
                    },
                    None => None,
                };
                let info = self.build_class(&decl, parent)?;
                tracing::debug!(
                    name = %decl.name,
                    parent = ?info.parent.as_ref().map(|p| p.name.to_string()),
                    "registered class"
                );
                self.classes.insert(decl.name.clone(), Rc::new(info));
            }
            if waiting.len() == before {
                let missing = waiting
                    .iter()
                    .find_map(|decl| decl.parent.clone())
                    .unwrap_or_else(|| root.clone());
                return Err(undefined_class(missing.as_str()));
            }
            pending = waiting;
        }
        Ok(())
    }

    fn build_class(
        &mut self,
        decl: &Rc<ClassDecl>,
        parent: Option<Rc<ClassInfo>>,
    ) -> Result<ClassInfo, EvalError> {
        let mut info = ClassInfo::empty(Rc::clone(decl), parent);

        for name in &decl.interfaces {
            let intf = self
                .interfaces
                .get(name)
                .cloned()
                .ok_or_else(|| undefined_type(name.as_str()))?;
            info.interfaces.push(intf);
        }

        for field in &decl.fields {
            info.fields.push(FieldInfo {
                name: field.name.clone(),
                ty: self.resolve_type(&field.ty)?,
                init: field.init.clone(),
            });
        }

        // Constants see the ones declared before them, class variables see
        // every constant.
        let scope = self.global.child();
        for constant in &decl.constants {
            let mut value = self.eval_in(scope.clone(), &constant.value)?;
            if let Some(ty) = &constant.ty {
                let ty = self.resolve_type(ty)?;
                value = self.coerce_to(value, &ty)?;
            }
            scope.define(constant.name.clone(), value.clone(), None, Mutability::Immutable);
            info.constants.insert(constant.name.clone(), value);
        }

        for var in &decl.class_vars {
            let ty = self.resolve_type(&var.ty)?;
            let value = match &var.init {
                Some(init) => {
                    let value = self.eval_in(scope.clone(), init)?;
                    self.coerce_to(value, &ty)?
                }
                None => ty.default_value(),
            };
            info.class_vars.borrow_mut().insert(var.name.clone(), value);
            info.class_var_types.insert(var.name.clone(), ty);
        }

        for method in &decl.methods {
            info.methods
                .entry(method.name.clone())
                .or_default()
                .push(Rc::clone(method));
        }

        for property in &decl.properties {
            let ty = self.resolve_type(&property.ty)?;
            info.properties.insert(
                property.name.clone(),
                Rc::new(PropertyInfo {
                    decl: property.clone(),
                    ty,
                }),
            );
        }

        for op in &decl.operators {
            let binding = self.class_operator(&info, op)?;
            info.operators.push(binding);
        }
        Ok(info)
    }

    /// Bind a class operator. The class itself is an implicit operand when
    /// the declaration leaves it out: the left one, or the right one for
    /// `in`.
    fn class_operator(&self, class: &ClassInfo, op: &OperatorDecl) -> Result<OperatorBinding, EvalError> {
        let own = TypeInfo::Class(class.name.clone());
        let mut operand_types = op
            .operand_types
            .iter()
            .map(|ty| self.resolve_type(ty))
            .collect::<Result<Vec<_>, EvalError>>()?;
        if !operand_types.contains(&own) {
            if op.kind == OperatorKind::Binary(BinaryOp::In) {
                operand_types.push(own.clone());
            } else {
                operand_types.insert(0, own.clone());
            }
        }

        let is_class_method = class
            .methods
            .get(&op.uses)
            .and_then(|overloads| overloads.first())
            .map(|decl| decl.is_class_method())
            .or_else(|| {
                class
                    .parent
                    .as_ref()
                    .and_then(|parent| parent.find_method(&op.uses))
                    .map(|method| method.decl.is_class_method())
            })
            .unwrap_or(false);
        let target = if is_class_method {
            OperatorTarget::ClassMethod
        } else {
            let self_index = operand_types.iter().position(|ty| *ty == own).unwrap_or(0);
            OperatorTarget::Instance { self_index }
        };

        Ok(OperatorBinding {
            kind: op.kind,
            operand_types,
            result: op
                .return_type
                .as_ref()
                .map(|ty| self.resolve_type(ty))
                .transpose()?,
            uses: op.uses.clone(),
            target,
        })
    }

    fn load_global_operator(&mut self, op: &OperatorDecl) -> Result<(), EvalError> {
        let operand_types = op
            .operand_types
            .iter()
            .map(|ty| self.resolve_type(ty))
            .collect::<Result<Vec<_>, EvalError>>()?;
        let result = op
            .return_type
            .as_ref()
            .map(|ty| self.resolve_type(ty))
            .transpose()?;
        tracing::debug!(op = op.kind.as_symbol(), uses = %op.uses, "registered operator");
        self.operators.register(OperatorBinding {
            kind: op.kind,
            operand_types,
            result,
            uses: op.uses.clone(),
            target: OperatorTarget::Function,
        });
        Ok(())
    }
}
