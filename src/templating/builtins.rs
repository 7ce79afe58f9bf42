//! Comparison builtins available to conditionals.
//!
//! Numbers compare numerically across `int` and `float`. Strings compare
//! lexically. Booleans and null support only equality. Lists and maps are
//! not comparable.

use std::cmp::Ordering;

use super::value::Value;

pub(crate) fn not(args: &[Value]) -> Result<Value, String> {
    match args {
        [value] => Ok(Value::Bool(!value.is_truthy())),
        _ => Err(format!("wrong number of args for not: want 1 got {}", args.len())),
    }
}

/// `eq a b c ...` is true when `a` equals any of the following arguments.
pub(crate) fn eq(args: &[Value]) -> Result<Value, String> {
    let [first, rest @ ..] = args else {
        return Err("missing argument for comparison".to_string());
    };
    if rest.is_empty() {
        return Err("missing argument for comparison".to_string());
    }
    for other in rest {
        if equal(first, other)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

pub(crate) fn ne(args: &[Value]) -> Result<Value, String> {
    let (a, b) = pair("ne", args)?;
    Ok(Value::Bool(!equal(a, b)?))
}

pub(crate) fn lt(args: &[Value]) -> Result<Value, String> {
    ordered("lt", args, Ordering::is_lt)
}

pub(crate) fn le(args: &[Value]) -> Result<Value, String> {
    ordered("le", args, Ordering::is_le)
}

pub(crate) fn gt(args: &[Value]) -> Result<Value, String> {
    ordered("gt", args, Ordering::is_gt)
}

pub(crate) fn ge(args: &[Value]) -> Result<Value, String> {
    ordered("ge", args, Ordering::is_ge)
}

fn pair<'a>(name: &str, args: &'a [Value]) -> Result<(&'a Value, &'a Value), String> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(format!("wrong number of args for {name}: want 2 got {}", args.len())),
    }
}

fn ordered(name: &str, args: &[Value], test: fn(Ordering) -> bool) -> Result<Value, String> {
    let (a, b) = pair(name, args)?;
    let ordering = match (a, b) {
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        _ => match (number(a), number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).ok_or("invalid comparison of NaN")?,
            _ if a.kind() == b.kind() => {
                return Err(format!("invalid type for comparison: {}", a.kind()));
            }
            _ => return Err(incompatible(a, b)),
        },
    };
    Ok(Value::Bool(test(ordering)))
}

fn equal(a: &Value, b: &Value) -> Result<bool, String> {
    match (a, b) {
        (Value::List(_) | Value::Map(_), _) | (_, Value::List(_) | Value::Map(_)) => {
            Err(format!("non-comparable type: {}", a.kind()))
        }
        (Value::Int(x), Value::Int(y)) => Ok(x == y),
        _ => match (number(a), number(b)) {
            (Some(x), Some(y)) => Ok(x == y),
            _ if a.kind() == b.kind() => Ok(a == b),
            _ => Err(incompatible(a, b)),
        },
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn incompatible(a: &Value, b: &Value) -> String {
    format!("incompatible types for comparison: {} and {}", a.kind(), b.kind())
}
