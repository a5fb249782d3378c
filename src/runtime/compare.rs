//! Comparison operations over holders.
//!
//! `equal` and `less` carry the real logic; the other four are derived
//! exactly as the language defines them, so the algebraic laws between the
//! six operators hold by construction.

use crate::runtime::context::Context;
use crate::runtime::error::RuntimeError;
use crate::runtime::object::ObjectHolder;
use crate::runtime::value::Value;

/// Matching numbers, strings, or bools compare directly, two empty holders
/// are equal, and a class instance with `__eq__` decides for itself.
pub fn equal(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    context: &mut Context<'_>,
) -> Result<bool, RuntimeError> {
    if let (Some(left), Some(right)) = (lhs.value(), rhs.value()) {
        match (&*left, &*right) {
            (Value::Number(a), Value::Number(b)) => return Ok(a == b),
            (Value::String(a), Value::String(b)) => return Ok(a == b),
            (Value::Bool(a), Value::Bool(b)) => return Ok(a == b),
            _ => {}
        }
    }
    if lhs.is_none() && rhs.is_none() {
        return Ok(true);
    }
    delegate(lhs, rhs, "__eq__", context)
}

/// Numeric, lexicographic, and `False < True` orderings; a class instance
/// with `__lt__` decides for itself.
pub fn less(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    context: &mut Context<'_>,
) -> Result<bool, RuntimeError> {
    if let (Some(left), Some(right)) = (lhs.value(), rhs.value()) {
        match (&*left, &*right) {
            (Value::Number(a), Value::Number(b)) => return Ok(a < b),
            (Value::String(a), Value::String(b)) => return Ok(a < b),
            (Value::Bool(a), Value::Bool(b)) => return Ok(a < b),
            _ => {}
        }
    }
    delegate(lhs, rhs, "__lt__", context)
}

pub fn not_equal(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    context: &mut Context<'_>,
) -> Result<bool, RuntimeError> {
    Ok(!equal(lhs, rhs, context)?)
}

pub fn greater(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    context: &mut Context<'_>,
) -> Result<bool, RuntimeError> {
    Ok(!less(lhs, rhs, context)? && !equal(lhs, rhs, context)?)
}

pub fn less_or_equal(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    context: &mut Context<'_>,
) -> Result<bool, RuntimeError> {
    Ok(!greater(lhs, rhs, context)?)
}

pub fn greater_or_equal(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    context: &mut Context<'_>,
) -> Result<bool, RuntimeError> {
    Ok(!less(lhs, rhs, context)?)
}

fn delegate(
    lhs: &ObjectHolder,
    rhs: &ObjectHolder,
    method: &str,
    context: &mut Context<'_>,
) -> Result<bool, RuntimeError> {
    let has_method = match lhs.value().as_deref() {
        Some(Value::Instance(instance)) => instance.has_method(method, 1),
        _ => false,
    };
    if has_method {
        let result = lhs.call_method(method, &[rhs.share()], context)?;
        return result
            .as_bool()
            .ok_or_else(|| RuntimeError::NonBoolComparison {
                method: method.to_string(),
            });
    }
    Err(RuntimeError::IncomparableValues {
        lhs: lhs.type_name().to_string(),
        rhs: rhs.type_name().to_string(),
    })
}
