//! The builtin helpers. Operands that are functions are invoked without
//! arguments first, so thunks and plain values behave alike.

use crate::chunk::Chunk;
use crate::error::RenderError;
use crate::escape::{escape_html, escape_js, escape_json};
use crate::value::{Deferred, Function, RenderResult, Value};

use codegen::Builtin;
use log::trace;

use std::borrow::Cow;
use std::cmp::Ordering;
use std::rc::Rc;

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Null)
}

/// Invoke a function operand, or pass a value through.
fn resolve(value: Value) -> RenderResult {
    match value {
        Value::Function(function) => function.call(&[]),
        other => Ok(other),
    }
}

fn operand(args: &[Value], index: usize) -> RenderResult {
    resolve(arg(args, index))
}

pub fn function(builtin: Builtin) -> Function {
    Function::new(move |args| call(builtin, args))
}

pub fn call(builtin: Builtin, args: &[Value]) -> RenderResult {
    trace!("builtin {} with {} args", builtin, args.len());
    match builtin {
        Builtin::Each => each(args),
        Builtin::If => if_(args),
        Builtin::IsEmpty => Ok(Value::Bool(is_empty(&operand(args, 0)?))),
        Builtin::IsNotEmpty => Ok(Value::Bool(!is_empty(&operand(args, 0)?))),
        Builtin::Not => Ok(Value::Bool(!operand(args, 0)?.is_truthy())),
        Builtin::Eq => Ok(Value::Bool(strict_eq(&operand(args, 0)?, &operand(args, 1)?))),
        Builtin::Neq => Ok(Value::Bool(!strict_eq(&operand(args, 0)?, &operand(args, 1)?))),
        Builtin::Lt => compare(args, Ordering::is_lt),
        Builtin::Gt => compare(args, Ordering::is_gt),
        Builtin::Lte => compare(args, Ordering::is_le),
        Builtin::Gte => compare(args, Ordering::is_ge),
        Builtin::CmpAnd => {
            let left = operand(args, 0)?;
            if left.is_truthy() {
                operand(args, 1)
            } else {
                Ok(left)
            }
        }
        Builtin::CmpOr => {
            let left = operand(args, 0)?;
            if left.is_truthy() {
                Ok(left)
            } else {
                operand(args, 1)
            }
        }
        Builtin::Add => add(&operand(args, 0)?, &operand(args, 1)?),
        Builtin::Sub => Ok(arithmetic(&operand(args, 0)?, &operand(args, 1)?, i64::checked_sub, |l, r| l - r)),
        Builtin::Mul => Ok(arithmetic(&operand(args, 0)?, &operand(args, 1)?, i64::checked_mul, |l, r| l * r)),
        Builtin::Div => Ok(arithmetic(&operand(args, 0)?, &operand(args, 1)?, exact_div, |l, r| l / r)),
        Builtin::Mod => Ok(arithmetic(&operand(args, 0)?, &operand(args, 1)?, i64::checked_rem, |l, r| l % r)),
        Builtin::Get => get(&operand(args, 0)?, &operand(args, 1)?),
        Builtin::EscapeHtml => Ok(escape_with(arg(args, 0), escape_html)),
        Builtin::EscapeJs => Ok(escape_with(arg(args, 0), escape_js)),
        Builtin::EscapeJson => Ok(escape_with(arg(args, 0), escape_json)),
    }
}

/// Strings are escaped; anything else passes through untouched.
fn escape_with(value: Value, escaper: fn(&str) -> Cow<'_, str>) -> Value {
    if let Value::Str(text) = &value {
        if let Cow::Owned(escaped) = escaper(text) {
            return Value::from(escaped);
        }
    }
    value
}

/// Run `then` once the deferred value resolves, with the resolved value.
fn after(deferred: Deferred, then: impl FnOnce(Value) -> RenderResult + 'static) -> Value {
    Value::Deferred(Deferred::new(async move { then(deferred.resolve().await?) }))
}

fn each(args: &[Value]) -> RenderResult {
    let collection = operand(args, 0)?;
    let (then, otherwise) = (arg(args, 1), arg(args, 2));
    let items: Vec<Value> = match collection {
        Value::Deferred(deferred) => {
            return Ok(after(deferred, move |resolved| each(&[resolved, then, otherwise])));
        }
        Value::Array(items) => items.to_vec(),
        Value::Str(text) => text.chars().map(|ch| Value::from(ch.to_string())).collect(),
        _ => vec![],
    };
    if items.is_empty() {
        return if otherwise.is_truthy() {
            resolve(otherwise)
        } else {
            Ok(Value::from(""))
        };
    }
    if !then.is_truthy() {
        return Ok(Value::from(""));
    }
    let mut chunk = Chunk::new();
    for (index, item) in items.into_iter().enumerate() {
        match &then {
            Value::Function(function) => {
                let index = i64::try_from(index).unwrap_or(i64::MAX);
                chunk.write(function.call(&[item, Value::Int(index)])?)?;
            }
            other => chunk.write(other.clone())?,
        }
    }
    Ok(chunk.finalize())
}

fn if_(args: &[Value]) -> RenderResult {
    let condition = operand(args, 0)?;
    let (then, otherwise) = (arg(args, 1), arg(args, 2));
    if let Value::Deferred(deferred) = condition {
        return Ok(after(deferred, move |resolved| if_(&[resolved, then, otherwise])));
    }
    let branch = if condition.is_truthy() { then } else { otherwise };
    if branch.is_truthy() {
        resolve(branch)
    } else {
        Ok(Value::from(""))
    }
}

/// Zero is not empty; arrays are empty when they have no items; anything
/// else is empty when it is falsy.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Int(0) => false,
        Value::Float(n) if *n == 0.0 => false,
        Value::Array(items) => items.is_empty(),
        other => !other.is_truthy(),
    }
}

/// Same kind and same value. Numbers compare numerically across int and
/// float; compound values compare by identity.
#[allow(clippy::cast_precision_loss)]
pub fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Int(l), Value::Int(r)) => l == r,
        (Value::Int(l), Value::Float(r)) | (Value::Float(r), Value::Int(l)) => *l as f64 == *r,
        (Value::Float(l), Value::Float(r)) => l == r,
        (Value::Str(l), Value::Str(r)) => l == r,
        (Value::Array(l), Value::Array(r)) => Rc::ptr_eq(l, r),
        (Value::Map(l), Value::Map(r)) => Rc::ptr_eq(l, r),
        (Value::Function(l), Value::Function(r)) => l.ptr_eq(r),
        (Value::Deferred(l), Value::Deferred(r)) => l.ptr_eq(r),
        _ => false,
    }
}

fn compare(args: &[Value], test: fn(Ordering) -> bool) -> RenderResult {
    let (left, right) = (operand(args, 0)?, operand(args, 1)?);
    let ordering = match (&left, &right) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::Str(l), Value::Str(r)) => Some(l.cmp(r)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    // Comparisons involving NaN are always false
    Ok(Value::Bool(ordering.map_or(false, test)))
}

fn add(left: &Value, right: &Value) -> RenderResult {
    if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
        return Ok(Value::from(format!("{}{}", left, right)));
    }
    Ok(arithmetic(left, right, i64::checked_add, |l, r| l + r))
}

fn exact_div(left: i64, right: i64) -> Option<i64> {
    match left.checked_rem(right) {
        Some(0) => left.checked_div(right),
        _ => None,
    }
}

/// Integer operands stay integral while the integer operation is exact;
/// everything else is computed in floating point.
fn arithmetic(left: &Value, right: &Value, int: fn(i64, i64) -> Option<i64>, float: fn(f64, f64) -> f64) -> Value {
    if let (Value::Int(l), Value::Int(r)) = (left, right) {
        if let Some(result) = int(*l, *r) {
            return Value::Int(result);
        }
    }
    Value::Float(float(left.to_number(), right.to_number()))
}

fn get(object: &Value, key: &Value) -> RenderResult {
    match key {
        Value::Null => Ok(object.clone()),
        Value::Int(index) => Ok(object.get(&index.to_string())),
        Value::Str(key) => Ok(object.get(key)),
        other => Err(RenderError::helper(
            "get",
            format!("cannot use a {} as a key", other.type_name()),
        )),
    }
}
