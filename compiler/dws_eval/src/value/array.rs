//! Static and dynamic arrays.

use crate::errors::{index_out_of_bounds, EvalError};
use crate::shared::Shared;
use crate::types::TypeInfo;

use super::Value;

/// Array storage.
///
/// Static arrays keep their declared `low` bound and fixed length; dynamic
/// arrays are zero-based and resizable with `SetLength`.
#[derive(Clone, Debug)]
pub struct ArrayValue {
    pub element: TypeInfo,
    pub low: i64,
    pub fixed: bool,
    pub items: Vec<Value>,
}

/// Shared handle: arrays have reference semantics.
pub type ArrayRef = Shared<ArrayValue>;

impl ArrayValue {
    /// A static array starting at `low`.
    pub fn fixed(element: TypeInfo, low: i64, items: Vec<Value>) -> Self {
        ArrayValue {
            element,
            low,
            fixed: true,
            items,
        }
    }

    /// A zero-based dynamic array.
    pub fn dynamic(element: TypeInfo, items: Vec<Value>) -> Self {
        ArrayValue {
            element,
            low: 0,
            fixed: false,
            items,
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Highest valid index (`low - 1` when empty).
    pub fn high(&self) -> i64 {
        let len = i64::try_from(self.items.len()).unwrap_or(i64::MAX);
        self.low.saturating_add(len).saturating_sub(1)
    }

    /// Type name in `TypeInfo` spelling.
    pub fn type_name(&self) -> String {
        if self.fixed {
            format!("array[{}..{}] of {}", self.low, self.high(), self.element.name())
        } else {
            format!("array of {}", self.element.name())
        }
    }

    fn offset(&self, index: i64) -> Result<usize, EvalError> {
        index
            .checked_sub(self.low)
            .and_then(|off| usize::try_from(off).ok())
            .filter(|off| *off < self.items.len())
            .ok_or_else(|| index_out_of_bounds(index, self.low, self.high()))
    }

    /// Element at `index`.
    pub fn get(&self, index: i64) -> Result<Value, EvalError> {
        let offset = self.offset(index)?;
        Ok(self.items[offset].clone())
    }

    /// Replace the element at `index`.
    pub fn set(&mut self, index: i64, value: Value) -> Result<(), EvalError> {
        let offset = self.offset(index)?;
        self.items[offset] = value;
        Ok(())
    }

    /// Resize a dynamic array, filling new slots with the element default.
    pub fn resize(&mut self, len: usize) {
        if len <= self.items.len() {
            self.items.truncate(len);
        } else {
            let extra = len - self.items.len();
            self.items
                .extend((0..extra).map(|_| self.element.default_value()));
        }
    }
}
