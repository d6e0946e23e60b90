//! Loops and `case`.
//!
//! Loops own `Break` and `Continue`; any other signal leaves the loop
//! untouched and keeps propagating.

use std::cmp::Ordering;

use dws_ir::{CaseBranch, CaseLabel, Expr, ForDirection, Name, Stmt};

use super::Interpreter;
use crate::errors::{expected_type, invalid_step, not_iterable, ControlAction, ExecResult};
use crate::types::TypeInfo;
use crate::value::{compare_values, values_equal, EnumValue, SetValue, Value};

/// What the loop should do after one run of its body.
enum Flow {
    Next,
    Stop,
}

fn loop_flow(result: ExecResult) -> Result<Flow, ControlAction> {
    match result {
        Ok(()) | Err(ControlAction::Continue) => Ok(Flow::Next),
        Err(ControlAction::Break) => Ok(Flow::Stop),
        Err(other) => Err(other),
    }
}

impl Interpreter {
    pub(super) fn exec_while(&mut self, cond: &Expr, body: &Stmt) -> ExecResult {
        while self.eval_condition(cond)? {
            if let Flow::Stop = loop_flow(self.exec_stmt(body))? {
                break;
            }
        }
        Ok(())
    }

    pub(super) fn exec_repeat(&mut self, body: &[Stmt], cond: &Expr) -> ExecResult {
        loop {
            if let Flow::Stop = loop_flow(self.exec_scoped_block(body))? {
                break;
            }
            if self.eval_condition(cond)? {
                break;
            }
        }
        Ok(())
    }

    /// `for v := start to|downto end [step n] do body`.
    ///
    /// Bounds and step are evaluated once. The loop variable lives in a
    /// fresh scope; enum bounds yield enum values.
    pub(super) fn exec_for(
        &mut self,
        variable: &Name,
        start: &Expr,
        end: &Expr,
        direction: ForDirection,
        step: Option<&Expr>,
        body: &Stmt,
    ) -> ExecResult {
        let start = self.eval_expr(start)?.unbox();
        let end = self.eval_expr(end)?.unbox();
        let step = match step {
            Some(expr) => {
                let value = self.eval_expr(expr)?;
                let step = value
                    .as_integer()
                    .ok_or_else(|| expected_type("Integer", &value.type_name()))?;
                if step <= 0 {
                    return Err(invalid_step(step).into());
                }
                step
            }
            None => 1,
        };
        let from = start
            .ordinal()
            .ok_or_else(|| expected_type("ordinal", &start.type_name()))?;
        let to = end
            .ordinal()
            .ok_or_else(|| expected_type("ordinal", &end.type_name()))?;
        let make = |ordinal: i64| match &start {
            Value::Enum(e) => Value::Enum(EnumValue {
                ty: e.ty.clone(),
                ordinal,
            }),
            _ => Value::Integer(ordinal),
        };

        let (to, step) = (i128::from(to), i128::from(step));
        let mut current = i128::from(from);
        let env = self.env.child();
        let mut scoped = self.scoped(env);
        loop {
            let done = match direction {
                ForDirection::To => current > to,
                ForDirection::Downto => current < to,
            };
            if done {
                break;
            }
            let Ok(ordinal) = i64::try_from(current) else {
                break;
            };
            scoped.env.define_var(variable.clone(), make(ordinal));
            if let Flow::Stop = loop_flow(scoped.exec_stmt(body))? {
                break;
            }
            current = match direction {
                ForDirection::To => current + step,
                ForDirection::Downto => current - step,
            };
        }
        Ok(())
    }

    /// `for v in collection do body`.
    pub(super) fn exec_for_in(&mut self, variable: &Name, collection: &Expr, body: &Stmt) -> ExecResult {
        let collection = self.eval_expr(collection)?.unbox();
        let items: Vec<Value> = match &collection {
            Value::Array(array) => array.borrow().items.clone(),
            Value::Set(set) => set_items(set),
            Value::String(s) => s.chars().map(|c| Value::from(c.to_string())).collect(),
            Value::TypeMeta(meta) => match &meta.info {
                TypeInfo::Enum(ty) => ty
                    .members
                    .iter()
                    .map(|(_, ordinal)| {
                        Value::Enum(EnumValue {
                            ty: ty.clone(),
                            ordinal: *ordinal,
                        })
                    })
                    .collect(),
                other => return Err(not_iterable(&other.name()).into()),
            },
            other => return Err(not_iterable(&other.type_name()).into()),
        };

        let env = self.env.child();
        let mut scoped = self.scoped(env);
        for item in items {
            scoped.env.define_var(variable.clone(), item);
            if let Flow::Stop = loop_flow(scoped.exec_stmt(body))? {
                break;
            }
        }
        Ok(())
    }

    /// `case` with value and inclusive range labels; first match wins.
    pub(super) fn exec_case(
        &mut self,
        scrutinee: &Expr,
        branches: &[CaseBranch],
        else_branch: Option<&[Stmt]>,
    ) -> ExecResult {
        let scrutinee = self.eval_expr(scrutinee)?;
        for branch in branches {
            for label in &branch.labels {
                if self.case_label_matches(&scrutinee, label)? {
                    return self.exec_stmt(&branch.body);
                }
            }
        }
        match else_branch {
            Some(body) => self.exec_scoped_block(body),
            None => Ok(()),
        }
    }

    fn case_label_matches(&mut self, scrutinee: &Value, label: &CaseLabel) -> Result<bool, ControlAction> {
        match label {
            CaseLabel::Value(expr) => {
                let value = self.eval_expr(expr)?;
                Ok(values_equal(scrutinee, &value)?)
            }
            CaseLabel::Range(low, high) => {
                let low = self.eval_expr(low)?;
                let high = self.eval_expr(high)?;
                let above = matches!(
                    compare_values(scrutinee, &low)?,
                    Some(Ordering::Greater | Ordering::Equal)
                );
                let below = matches!(
                    compare_values(scrutinee, &high)?,
                    Some(Ordering::Less | Ordering::Equal)
                );
                Ok(above && below)
            }
        }
    }
}

/// Set members as values: enum sets in declaration order, others ascending.
fn set_items(set: &SetValue) -> Vec<Value> {
    match set.element() {
        TypeInfo::Enum(ty) => ty
            .members
            .iter()
            .filter(|(_, ordinal)| set.contains(*ordinal))
            .map(|(_, ordinal)| {
                Value::Enum(EnumValue {
                    ty: ty.clone(),
                    ordinal: *ordinal,
                })
            })
            .collect(),
        TypeInfo::Boolean => set.members().into_iter().map(|o| Value::Boolean(o != 0)).collect(),
        TypeInfo::String => set
            .members()
            .into_iter()
            .filter_map(|o| u32::try_from(o).ok().and_then(char::from_u32))
            .map(|c| Value::from(c.to_string()))
            .collect(),
        _ => set.members().into_iter().map(Value::Integer).collect(),
    }
}
