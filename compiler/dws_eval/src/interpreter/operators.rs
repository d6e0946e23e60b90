//! Operator application: class and global overloads first, then the
//! built-in semantics in [`crate::operators`].

use std::rc::Rc;

use dws_ir::{AssignOp, BinaryOp, OperatorKind, Span, UnaryOp};

use super::Interpreter;
use crate::class::{ClassInfo, OperatorBinding, OperatorTarget, PreparedArg};
use crate::errors::{expected_type, undefined_function, EvalError, EvalResult};
use crate::operators::{evaluate_binary, evaluate_compound, evaluate_unary};
use crate::value::{Receiver, Value};

impl Interpreter {
    pub(super) fn apply_binary(&mut self, op: BinaryOp, left: Value, right: Value) -> EvalResult {
        let kind = OperatorKind::Binary(op);
        if let Some((owner, binding)) = self.find_overload(kind, &[&left, &right]) {
            return self.invoke_operator(owner, &binding, vec![left, right]);
        }
        Ok(evaluate_binary(left, right, op)?)
    }

    pub(super) fn apply_unary(&mut self, op: UnaryOp, operand: Value) -> EvalResult {
        let kind = OperatorKind::Unary(op);
        if let Some((owner, binding)) = self.find_overload(kind, &[&operand]) {
            return self.invoke_operator(owner, &binding, vec![operand]);
        }
        Ok(evaluate_unary(operand, op)?)
    }

    /// The value `current op= value` stores.
    ///
    /// A compound overload declared as a procedure mutates its operand in
    /// place; the operand itself is stored back.
    pub(super) fn apply_compound(&mut self, op: AssignOp, current: Value, value: Value) -> EvalResult {
        let kind = OperatorKind::Compound(op);
        if let Some((owner, binding)) = self.find_overload(kind, &[&current, &value]) {
            let result = self.invoke_operator(owner, &binding, vec![current.clone(), value])?;
            if binding.result.is_none() && result.is_nil() {
                return Ok(current);
            }
            return Ok(result);
        }
        if let Some(binary) = op.binary_op() {
            let kind = OperatorKind::Binary(binary);
            if let Some((owner, binding)) = self.find_overload(kind, &[&current, &value]) {
                return self.invoke_operator(owner, &binding, vec![current, value]);
            }
        }
        Ok(evaluate_compound(current, op, value)?)
    }

    /// The overload of `kind` for `operands`: the left operand's class,
    /// then the right one's, then the global operators.
    fn find_overload(
        &self,
        kind: OperatorKind,
        operands: &[&Value],
    ) -> Option<(Option<Rc<ClassInfo>>, OperatorBinding)> {
        for operand in operands {
            if let Some(object) = operand.as_object() {
                if let Some((owner, binding)) = object.class().find_operator(kind, operands) {
                    return Some((Some(owner), binding));
                }
            }
        }
        self.operators
            .lookup(kind, operands)
            .map(|binding| (None, binding.clone()))
    }

    fn invoke_operator(
        &mut self,
        owner: Option<Rc<ClassInfo>>,
        binding: &OperatorBinding,
        mut operands: Vec<Value>,
    ) -> EvalResult {
        tracing::trace!(operator = binding.kind.as_symbol(), uses = %binding.uses, "operator overload");
        let result = match (binding.target, owner) {
            (OperatorTarget::ClassMethod, Some(owner)) => {
                self.call_method_with(Receiver::Class(owner), &binding.uses, operands, Span::DUMMY)?
            }
            (OperatorTarget::Instance { self_index }, Some(_)) if self_index < operands.len() => {
                let target = operands.remove(self_index);
                let object = target
                    .as_object()
                    .cloned()
                    .ok_or_else(|| expected_type("object", &target.type_name()))?;
                self.call_method_with(Receiver::Object(object), &binding.uses, operands, Span::DUMMY)?
            }
            (OperatorTarget::Function, _) => {
                let overloads = self
                    .functions
                    .get(&binding.uses)
                    .cloned()
                    .ok_or_else(|| undefined_function(binding.uses.as_str()))?;
                let ranking: Vec<Option<Value>> = operands.iter().cloned().map(Some).collect();
                let decl = self.select_function(binding.uses.as_str(), &overloads, &ranking)?;
                let args = operands.into_iter().map(PreparedArg::Value).collect();
                self.invoke_function(&decl, None, args, Span::DUMMY)?
            }
            _ => {
                return Err(EvalError::new(format!(
                    "operator {} has no usable implementation",
                    binding.kind.as_symbol()
                ))
                .into())
            }
        };
        match &binding.result {
            Some(ty) => Ok(self.coerce_to(result, ty)?),
            None => Ok(result),
        }
    }
}
