//! Operator overload bindings.

use std::rc::Rc;

use dws_ir::{Name, OperatorKind};

use super::{conversion_cost, ClassInfo};
use crate::types::TypeInfo;
use crate::value::Value;

/// How an overload's implementation is invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperatorTarget {
    /// A global function receiving every operand.
    Function,
    /// A class method receiving every operand.
    ClassMethod,
    /// An instance method called on the operand at `self_index`, receiving
    /// the others.
    Instance { self_index: usize },
}

/// One registered overload.
#[derive(Clone, Debug)]
pub struct OperatorBinding {
    pub kind: OperatorKind,
    pub operand_types: Vec<TypeInfo>,
    pub result: Option<TypeInfo>,
    pub uses: Name,
    pub target: OperatorTarget,
}

impl OperatorBinding {
    /// Total conversion cost of `operands`, or `None` if they do not fit.
    fn cost(&self, kind: OperatorKind, operands: &[&Value]) -> Option<u32> {
        if self.kind != kind || self.operand_types.len() != operands.len() {
            return None;
        }
        self.operand_types
            .iter()
            .zip(operands)
            .map(|(ty, value)| conversion_cost(value, ty).map(u32::from))
            .sum()
    }
}

/// The global (`operator + (A, B): C uses F`) overloads.
#[derive(Clone, Debug, Default)]
pub struct OperatorRegistry {
    bindings: Vec<OperatorBinding>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, binding: OperatorBinding) {
        self.bindings.push(binding);
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Best-matching overload of `kind` for `operands`.
    pub fn lookup(&self, kind: OperatorKind, operands: &[&Value]) -> Option<&OperatorBinding> {
        best_match(&self.bindings, kind, operands)
    }
}

fn best_match<'a>(
    bindings: &'a [OperatorBinding],
    kind: OperatorKind,
    operands: &[&Value],
) -> Option<&'a OperatorBinding> {
    bindings
        .iter()
        .filter_map(|binding| binding.cost(kind, operands).map(|cost| (cost, binding)))
        .min_by_key(|(cost, _)| *cost)
        .map(|(_, binding)| binding)
}

impl ClassInfo {
    /// Class operator of `kind` accepting `operands`, searched from this
    /// class upward. Returns the declaring class with the binding.
    pub fn find_operator(
        self: &Rc<Self>,
        kind: OperatorKind,
        operands: &[&Value],
    ) -> Option<(Rc<ClassInfo>, OperatorBinding)> {
        self.ancestors().find_map(|class| {
            let binding = best_match(&class.operators, kind, operands)?.clone();
            Some((class, binding))
        })
    }
}
