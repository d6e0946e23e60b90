//! Statement execution.

use dws_ir::{Expr, Name, Stmt, StmtKind, TypeExpr, VarDecl};

use super::Interpreter;
use crate::environment::Mutability;
use crate::errors::{expected_type, ControlAction, ExecResult};
use crate::value::Value;

impl Interpreter {
    /// Run `stmts` in the current scope, stopping at the first signal.
    pub(crate) fn exec_block(&mut self, stmts: &[Stmt]) -> ExecResult {
        for stmt in stmts {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    /// Run `stmts` in a fresh child scope.
    pub(crate) fn exec_scoped_block(&mut self, stmts: &[Stmt]) -> ExecResult {
        self.with_child_scope(|scoped| scoped.exec_block(stmts))
    }

    pub(crate) fn exec_stmt(&mut self, stmt: &Stmt) -> ExecResult {
        tracing::trace!(span = %stmt.span, kind = stmt_kind_name(&stmt.kind), "exec");
        self.exec_stmt_inner(stmt)
            .map_err(|action| action.with_span(stmt.span))
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt) -> ExecResult {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval_expr(expr)?;
                Ok(())
            }
            StmtKind::Var(decl) => self.exec_var(decl),
            StmtKind::Const { name, ty, value } => self.exec_const(name, ty.as_ref(), value),
            StmtKind::Assign { target, op, value } => self.exec_assign(target, *op, value),
            StmtKind::Block(stmts) => self.exec_scoped_block(stmts),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval_condition(cond)? {
                    self.exec_stmt(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec_stmt(else_branch)
                } else {
                    Ok(())
                }
            }
            StmtKind::While { cond, body } => self.exec_while(cond, body),
            StmtKind::Repeat { body, cond } => self.exec_repeat(body, cond),
            StmtKind::For {
                variable,
                start,
                end,
                direction,
                step,
                body,
                ..
            } => self.exec_for(variable, start, end, *direction, step.as_ref(), body),
            StmtKind::ForIn {
                variable,
                collection,
                body,
                ..
            } => self.exec_for_in(variable, collection, body),
            StmtKind::Case {
                scrutinee,
                branches,
                else_branch,
            } => self.exec_case(scrutinee, branches, else_branch.as_deref()),
            StmtKind::Break => Err(ControlAction::Break),
            StmtKind::Continue => Err(ControlAction::Continue),
            StmtKind::Exit(value) | StmtKind::Return(value) => self.exec_exit(value.as_ref()),
            StmtKind::Try(try_stmt) => self.exec_try(try_stmt),
            StmtKind::Raise(value) => self.exec_raise(value.as_ref()),
        }
    }

    /// Evaluate a condition that must produce a Boolean.
    pub(crate) fn eval_condition(&mut self, cond: &Expr) -> Result<bool, ControlAction> {
        match self.eval_expr(cond)?.unbox() {
            Value::Boolean(b) => Ok(b),
            other => Err(expected_type("Boolean", &other.type_name()).into()),
        }
    }

    fn exec_var(&mut self, decl: &VarDecl) -> ExecResult {
        let declared = decl
            .ty
            .as_ref()
            .map(|ty| self.resolve_type(ty))
            .transpose()?;
        let init = match &decl.init {
            Some(expr) => {
                let value = self.eval_expr(expr)?;
                Some(match &declared {
                    Some(ty) => self.coerce_to(value, ty)?,
                    None => value,
                })
            }
            None => None,
        };
        for name in &decl.names {
            let value = match (&init, &declared) {
                (Some(value), _) => value.copy_for_assign(),
                (None, Some(ty)) => ty.default_value(),
                (None, None) => Value::Variant(None),
            };
            self.env
                .define(name.clone(), value, declared.clone(), Mutability::Mutable);
        }
        Ok(())
    }

    fn exec_const(&mut self, name: &Name, ty: Option<&TypeExpr>, value: &Expr) -> ExecResult {
        let declared = ty.map(|ty| self.resolve_type(ty)).transpose()?;
        let mut value = self.eval_expr(value)?;
        if let Some(ty) = &declared {
            value = self.coerce_to(value, ty)?;
        }
        self.env.define(
            name.clone(),
            value.copy_for_assign(),
            declared,
            Mutability::Immutable,
        );
        Ok(())
    }

    /// `exit(value)` / `return value` store into `Result` before signalling.
    fn exec_exit(&mut self, value: Option<&Expr>) -> ExecResult {
        if let Some(expr) = value {
            let value = self.eval_expr(expr)?;
            let result = Name::new("Result");
            if self.env.get(&result).is_some() {
                self.assign_variable(&result, value)?;
            }
        }
        Err(ControlAction::Exit)
    }
}

fn stmt_kind_name(kind: &StmtKind) -> &'static str {
    match kind {
        StmtKind::Expr(_) => "expr",
        StmtKind::Var(_) => "var",
        StmtKind::Const { .. } => "const",
        StmtKind::Assign { .. } => "assign",
        StmtKind::Block(_) => "block",
        StmtKind::If { .. } => "if",
        StmtKind::While { .. } => "while",
        StmtKind::Repeat { .. } => "repeat",
        StmtKind::For { .. } => "for",
        StmtKind::ForIn { .. } => "for-in",
        StmtKind::Case { .. } => "case",
        StmtKind::Break => "break",
        StmtKind::Continue => "continue",
        StmtKind::Exit(_) => "exit",
        StmtKind::Return(_) => "return",
        StmtKind::Try(_) => "try",
        StmtKind::Raise(_) => "raise",
    }
}
