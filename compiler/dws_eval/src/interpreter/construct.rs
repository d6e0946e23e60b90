//! Object allocation and constructor selection.

use std::rc::Rc;

use dws_ir::{Expr, FunctionDecl, Name, Span};

use super::Interpreter;
use crate::class::ClassInfo;
use crate::errors::{abstract_instantiation, external_instantiation, undefined_method, EvalError, EvalResult};
use crate::value::{ObjectInstance, ObjectRef, Receiver, Shared, Value};

impl Interpreter {
    /// Allocate an instance of `class` with every field in the hierarchy
    /// at its initializer or default. No constructor runs.
    pub(crate) fn instantiate(&mut self, class: &Rc<ClassInfo>) -> Result<ObjectRef, EvalError> {
        if class.is_abstract {
            return Err(abstract_instantiation(class.name.as_str()));
        }
        if class.is_external {
            return Err(external_instantiation(class.name.as_str()));
        }
        let mut instance = ObjectInstance::new(Rc::clone(class));
        for field in class.all_fields() {
            let value = match &field.init {
                Some(init) => {
                    let value = self.eval_in(self.global.clone(), init)?;
                    self.coerce_to(value, &field.ty)?
                }
                None => field.ty.default_value(),
            };
            instance.fields.insert(field.name.clone(), value);
        }
        Ok(Shared::new(instance))
    }

    /// `TClass.Ctor(args)` / `new TClass(args)`.
    ///
    /// Without arguments and without a parameterless overload, the object
    /// is returned with its field defaults and no constructor runs.
    #[tracing::instrument(level = "debug", skip_all, fields(class = %class.name, ctor = %name))]
    pub(super) fn construct(&mut self, class: &Rc<ClassInfo>, name: &Name, args: &[Expr], span: Span) -> EvalResult {
        let constructors = class.constructors(name);
        if constructors.is_empty() {
            if args.is_empty() {
                return Ok(Value::Object(self.instantiate(class)?));
            }
            return Err(undefined_method(name.as_str(), class.name.as_str()).into());
        }
        if args.is_empty() && constructors.iter().all(|c| c.decl.required_params() > 0) {
            return Ok(Value::Object(self.instantiate(class)?));
        }

        let decls: Vec<&FunctionDecl> = constructors.iter().map(|c| c.decl.as_ref()).collect();
        let (prepared, ranking) = self.prepare_args(args, &decls)?;
        let index = self.select_index(&format!("{}.{name}", class.name), &decls, &ranking)?;
        self.dispatch_method(&constructors[index], Receiver::Class(Rc::clone(class)), prepared, span)
    }
}
