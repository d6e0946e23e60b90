//! Record values.

use std::rc::Rc;

use dws_ir::Name;

use crate::errors::{undefined_field, EvalError};
use crate::shared::Shared;
use crate::types::RecordType;

use super::Value;

/// Record storage: one value per declared field, in declaration order.
#[derive(Clone, Debug)]
pub struct RecordValue {
    pub ty: Rc<RecordType>,
    pub values: Vec<Value>,
}

/// Shared handle. Reads share it; stores deep-copy it.
pub type RecordRef = Shared<RecordValue>;

impl RecordValue {
    /// A record with every field at its declared default.
    pub fn with_defaults(ty: &Rc<RecordType>) -> Self {
        let values = ty
            .fields
            .iter()
            .map(|field| match &field.default {
                Some(value) => value.copy_for_assign(),
                None => field.ty.default_value(),
            })
            .collect();
        RecordValue {
            ty: Rc::clone(ty),
            values,
        }
    }

    /// Value of the field called `name`.
    pub fn get(&self, name: &Name) -> Result<Value, EvalError> {
        let index = self
            .ty
            .field_index(name)
            .ok_or_else(|| undefined_field(name.as_str(), self.ty.name.as_str()))?;
        Ok(self.values[index].clone())
    }

    /// Replace the field called `name`.
    pub fn set(&mut self, name: &Name, value: Value) -> Result<(), EvalError> {
        let index = self
            .ty
            .field_index(name)
            .ok_or_else(|| undefined_field(name.as_str(), self.ty.name.as_str()))?;
        self.values[index] = value;
        Ok(())
    }

    /// Copy with nested records copied too; arrays and objects stay shared.
    pub fn deep_copy(&self) -> RecordValue {
        RecordValue {
            ty: Rc::clone(&self.ty),
            values: self.values.iter().map(Value::copy_for_assign).collect(),
        }
    }
}
