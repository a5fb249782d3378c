use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use crate::runtime::context::Context;
use crate::runtime::error::{Interrupt, RuntimeError};
use crate::runtime::value::Value;

/// A lexical scope: identifier to holder bindings.
pub type Closure = HashMap<String, ObjectHolder>;

/// Shared-ownership wrapper around a runtime [`Value`].
///
/// `own` roots a fresh heap value, `share` aliases an existing one without a
/// new allocation (this is how `self` is bound during method calls), and
/// `none` is the empty holder: it prints as `None` and is falsy. A sharing
/// holder keeps the value alive, so it can never dangle past its owner.
#[derive(Debug, Clone, Default)]
pub struct ObjectHolder {
    data: Option<Rc<RefCell<Value>>>,
}

impl ObjectHolder {
    pub fn own(value: Value) -> Self {
        Self {
            data: Some(Rc::new(RefCell::new(value))),
        }
    }

    pub fn none() -> Self {
        Self { data: None }
    }

    /// Aliases the wrapped value.
    pub fn share(&self) -> Self {
        self.clone()
    }

    pub fn is_none(&self) -> bool {
        self.data.is_none()
    }

    /// Borrows the wrapped value, if any.
    pub fn value(&self) -> Option<Ref<'_, Value>> {
        self.data.as_ref().map(|cell| cell.borrow())
    }

    /// Mutably borrows the wrapped value, if any.
    pub fn value_mut(&self) -> Option<RefMut<'_, Value>> {
        self.data.as_ref().map(|cell| cell.borrow_mut())
    }

    pub fn as_number(&self) -> Option<i32> {
        match self.value().as_deref() {
            Some(Value::Number(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value().as_deref() {
            Some(Value::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.value().as_deref().map_or("None", Value::type_name)
    }

    /// Invokes `method` on the wrapped class instance.
    ///
    /// The method runs under a fresh closure with `self` bound to a sharing
    /// alias of this holder and each formal parameter bound to its actual
    /// argument. An arity mismatch reports as an unknown method. A return
    /// signal reaching this boundary is adopted as the result, the same way
    /// `MethodBody` adopts it.
    pub fn call_method(
        &self,
        method: &str,
        actual_args: &[ObjectHolder],
        context: &mut Context<'_>,
    ) -> Result<ObjectHolder, RuntimeError> {
        let class = match self.value().as_deref() {
            Some(Value::Instance(instance)) => Rc::clone(instance.class()),
            _ => {
                return Err(RuntimeError::ExpectedInstance {
                    type_name: self.type_name().to_string(),
                });
            }
        };

        let found = class
            .get_method(method)
            .filter(|m| m.formal_params.len() == actual_args.len())
            .ok_or_else(|| RuntimeError::UnknownMethod {
                method: method.to_string(),
                arity: actual_args.len(),
            })?;

        let mut closure = Closure::new();
        closure.insert("self".to_string(), self.share());
        for (param, arg) in found.formal_params.iter().zip(actual_args) {
            closure.insert(param.clone(), arg.share());
        }

        match found.body.execute(&mut closure, context) {
            Ok(value) => Ok(value),
            Err(Interrupt::Return(value)) => Ok(value),
            Err(Interrupt::Error(error)) => Err(error),
        }
    }

    /// Renders the value the way `print` writes it: decimal numbers, raw
    /// string bytes, `True`/`False`, `Class <name>`, and `None` for the
    /// empty holder. Instances dispatch to a zero-argument `__str__` when
    /// their class provides one, and otherwise render an opaque identity
    /// tag.
    pub fn to_output(&self, context: &mut Context<'_>) -> Result<String, RuntimeError> {
        let Some(cell) = &self.data else {
            return Ok("None".to_string());
        };

        let dispatch_str = match &*cell.borrow() {
            Value::Instance(instance) => instance.has_method("__str__", 0),
            _ => false,
        };
        if dispatch_str {
            let rendered = self.call_method("__str__", &[], context)?;
            return rendered.to_output(context);
        }

        let text = match &*cell.borrow() {
            Value::Number(value) => value.to_string(),
            Value::String(value) => value.clone(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Class(class) => format!("Class {}", class.name()),
            Value::Instance(_) => format!("{:p}", Rc::as_ptr(cell)),
        };
        Ok(text)
    }
}

/// Truthiness: non-zero numbers, non-empty strings, and `True`. Everything
/// else, including classes and instances, is falsy.
pub fn is_true(object: &ObjectHolder) -> bool {
    match object.value().as_deref() {
        Some(Value::Number(value)) => *value != 0,
        Some(Value::String(value)) => !value.is_empty(),
        Some(Value::Bool(value)) => *value,
        _ => false,
    }
}
