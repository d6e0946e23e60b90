//! Sets over ordinal domains.

use std::fmt;

use crate::errors::{out_of_range, EvalError};
use crate::types::TypeInfo;

use super::EnumValue;

/// Largest ordinal a set can hold.
pub const MAX_SET_ORDINAL: i64 = 65_535;

/// A bitset of ordinals.
///
/// The element type is `Variant` for an untyped `[]` literal until the set
/// is stored into a typed slot.
#[derive(Clone, Debug)]
pub struct SetValue {
    element: TypeInfo,
    bits: Vec<u64>,
}

impl SetValue {
    /// The empty set of `element`.
    pub fn empty(element: TypeInfo) -> Self {
        SetValue {
            element,
            bits: Vec::new(),
        }
    }

    /// Element type.
    pub fn element(&self) -> &TypeInfo {
        &self.element
    }

    /// Same members, retyped (used when a literal lands in a typed slot).
    #[must_use]
    pub fn with_element(mut self, element: TypeInfo) -> Self {
        self.element = element;
        self
    }

    fn slot(ordinal: i64) -> Result<(usize, u64), EvalError> {
        if !(0..=MAX_SET_ORDINAL).contains(&ordinal) {
            return Err(out_of_range(ordinal, "set element", 0, MAX_SET_ORDINAL));
        }
        let ordinal = usize::try_from(ordinal).unwrap_or(0);
        Ok((ordinal / 64, 1u64 << (ordinal % 64)))
    }

    /// Add `ordinal`.
    pub fn insert(&mut self, ordinal: i64) -> Result<(), EvalError> {
        let (word, mask) = Self::slot(ordinal)?;
        if self.bits.len() <= word {
            self.bits.resize(word + 1, 0);
        }
        self.bits[word] |= mask;
        Ok(())
    }

    /// Remove `ordinal`; absent members are ignored.
    pub fn remove(&mut self, ordinal: i64) -> Result<(), EvalError> {
        let (word, mask) = Self::slot(ordinal)?;
        if let Some(bits) = self.bits.get_mut(word) {
            *bits &= !mask;
        }
        Ok(())
    }

    /// Membership test; ordinals outside the representable range are never members.
    pub fn contains(&self, ordinal: i64) -> bool {
        match Self::slot(ordinal) {
            Ok((word, mask)) => self.bits.get(word).is_some_and(|bits| bits & mask != 0),
            Err(_) => false,
        }
    }

    /// Members in ascending ordinal order.
    pub fn members(&self) -> Vec<i64> {
        let mut out = Vec::new();
        for (word, bits) in self.bits.iter().enumerate() {
            let mut rest = *bits;
            while rest != 0 {
                let bit = rest.trailing_zeros();
                rest &= rest - 1;
                let ordinal = word * 64 + bit as usize;
                out.push(i64::try_from(ordinal).unwrap_or(i64::MAX));
            }
        }
        out
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.bits.iter().map(|bits| bits.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|bits| *bits == 0)
    }

    fn combined_element(&self, other: &SetValue) -> TypeInfo {
        if self.element == TypeInfo::Variant {
            other.element.clone()
        } else {
            self.element.clone()
        }
    }

    fn zip_with(&self, other: &SetValue, op: impl Fn(u64, u64) -> u64) -> SetValue {
        let len = self.bits.len().max(other.bits.len());
        let bits = (0..len)
            .map(|i| {
                op(
                    self.bits.get(i).copied().unwrap_or(0),
                    other.bits.get(i).copied().unwrap_or(0),
                )
            })
            .collect();
        SetValue {
            element: self.combined_element(other),
            bits,
        }
    }

    /// `a + b`.
    pub fn union(&self, other: &SetValue) -> SetValue {
        self.zip_with(other, |a, b| a | b)
    }

    /// `a - b`.
    pub fn difference(&self, other: &SetValue) -> SetValue {
        self.zip_with(other, |a, b| a & !b)
    }

    /// `a * b`.
    pub fn intersection(&self, other: &SetValue) -> SetValue {
        self.zip_with(other, |a, b| a & b)
    }

    /// `a <= b`.
    pub fn is_subset(&self, other: &SetValue) -> bool {
        self.bits
            .iter()
            .enumerate()
            .all(|(i, bits)| bits & !other.bits.get(i).copied().unwrap_or(0) == 0)
    }

    /// Same members, regardless of element typing.
    pub fn same_members(&self, other: &SetValue) -> bool {
        self.is_subset(other) && other.is_subset(self)
    }
}

impl fmt::Display for SetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, ordinal) in self.members().into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match &self.element {
                TypeInfo::Enum(ty) => {
                    let member = EnumValue {
                        ty: ty.clone(),
                        ordinal,
                    };
                    f.write_str(&member.member_name())?;
                }
                _ => write!(f, "{ordinal}")?,
            }
        }
        f.write_str("]")
    }
}
