//! Argument handling shared by builtins, host method surfaces, and the
//! standard-library modules. Mismatches surface as `Arg` errors.

use std::cell::RefCell;
use std::rc::Rc;

use rill_common::error::RuntimeErrorKind;

use crate::ops;
use crate::signal::{error, Exec, Signal};
use crate::value::{Value, ValueMap};

pub(crate) fn arg_error(message: impl Into<String>) -> Signal {
    error(RuntimeErrorKind::Arg, message)
}

/// Enforce `min..=max` arguments; `max: None` means unbounded.
pub(crate) fn check_arity(
    name: &str,
    args: &[Value],
    min: usize,
    max: Option<usize>,
) -> Exec<()> {
    if args.len() < min || max.map(|m| args.len() > m).unwrap_or(false) {
        let expected = match (min, max) {
            (min, Some(max)) if min == max => format!("{min}"),
            (min, Some(max)) => format!("{min} to {max}"),
            (min, None) => format!("at least {min}"),
        };
        return Err(arg_error(format!(
            "{name}() expects {expected} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

pub(crate) fn text_arg(name: &str, args: &[Value], index: usize) -> Exec<Rc<str>> {
    match args.get(index) {
        Some(Value::Text(s)) => Ok(s.clone()),
        Some(other) => Err(arg_error(format!(
            "{name}() expects text, got {}",
            other.type_name()
        ))),
        None => Err(arg_error(format!("{name}() is missing a text argument"))),
    }
}

pub(crate) fn int_arg(name: &str, args: &[Value], index: usize) -> Exec<i64> {
    match args.get(index) {
        Some(Value::Int(i)) => Ok(*i),
        Some(Value::Float(f)) if f.fract() == 0.0 => Ok(*f as i64),
        Some(other) => Err(arg_error(format!(
            "{name}() expects an integer, got {}",
            other.type_name()
        ))),
        None => Err(arg_error(format!(
            "{name}() is missing an integer argument"
        ))),
    }
}

pub(crate) fn num_arg(name: &str, args: &[Value], index: usize) -> Exec<f64> {
    args.get(index)
        .and_then(ops::as_f64)
        .ok_or_else(|| arg_error(format!("{name}() expects a number")))
}

pub(crate) fn list_arg(
    name: &str,
    args: &[Value],
    index: usize,
) -> Exec<Rc<RefCell<Vec<Value>>>> {
    match args.get(index) {
        Some(Value::List(items)) => Ok(items.clone()),
        Some(other) => Err(arg_error(format!(
            "{name}() expects a list, got {}",
            other.type_name()
        ))),
        None => Err(arg_error(format!("{name}() is missing a list argument"))),
    }
}

pub(crate) fn map_arg(name: &str, args: &[Value], index: usize) -> Exec<Rc<RefCell<ValueMap>>> {
    match args.get(index) {
        Some(Value::Map(map)) => Ok(map.clone()),
        Some(other) => Err(arg_error(format!(
            "{name}() expects a map, got {}",
            other.type_name()
        ))),
        None => Err(arg_error(format!("{name}() is missing a map argument"))),
    }
}

pub(crate) fn callable_arg(name: &str, args: &[Value], index: usize) -> Exec<Value> {
    match args.get(index) {
        Some(v) if v.is_callable() => Ok(v.clone()),
        Some(other) => Err(arg_error(format!(
            "{name}() expects a conduit, got {}",
            other.type_name()
        ))),
        None => Err(arg_error(format!(
            "{name}() is missing a conduit argument"
        ))),
    }
}

pub(crate) fn opt_int_arg(name: &str, args: &[Value], index: usize) -> Exec<Option<i64>> {
    match args.get(index) {
        None | Some(Value::None) => Ok(None),
        Some(_) => int_arg(name, args, index).map(Some),
    }
}

pub(crate) fn opt_text_arg(name: &str, args: &[Value], index: usize) -> Exec<Option<Rc<str>>> {
    match args.get(index) {
        None | Some(Value::None) => Ok(None),
        Some(_) => text_arg(name, args, index).map(Some),
    }
}

/// The bound receiver of a host method surface, which the installer
/// guarantees is present and of the right shape.
pub(crate) fn recv_text(recv: Option<&Value>) -> Rc<str> {
    match recv {
        Some(Value::Text(s)) => s.clone(),
        _ => "".into(),
    }
}

pub(crate) fn recv_list(recv: Option<&Value>) -> Rc<RefCell<Vec<Value>>> {
    match recv {
        Some(Value::List(items)) => items.clone(),
        _ => Rc::new(RefCell::new(Vec::new())),
    }
}

/// Clamp a `[start, end)` window onto a length, resolving negative
/// offsets from the end.
pub(crate) fn slice_bounds(start: Option<i64>, end: Option<i64>, len: usize) -> (usize, usize) {
    let len = len as i64;
    let resolve = |i: i64| -> i64 {
        let i = if i < 0 { i + len } else { i };
        i.clamp(0, len)
    };
    let lo = resolve(start.unwrap_or(0));
    let hi = resolve(end.unwrap_or(len));
    (lo as usize, (hi.max(lo)) as usize)
}

/// Sort by the natural ordering, failing on incomparable elements.
pub(crate) fn sort_values(mut items: Vec<Value>) -> Exec<Vec<Value>> {
    let mut failure: Option<Signal> = None;
    items.sort_by(|a, b| match ops::order(a, b) {
        Ok(ordering) => ordering,
        Err(signal) => {
            if failure.is_none() {
                failure = Some(signal);
            }
            std::cmp::Ordering::Equal
        }
    });
    match failure {
        Some(signal) => Err(signal),
        None => Ok(items),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_bounds_resolve_negatives_and_clamp() {
        assert_eq!(slice_bounds(Some(1), Some(3), 5), (1, 3));
        assert_eq!(slice_bounds(Some(-2), None, 5), (3, 5));
        assert_eq!(slice_bounds(None, Some(-1), 5), (0, 4));
        assert_eq!(slice_bounds(Some(10), Some(20), 5), (5, 5));
        assert_eq!(slice_bounds(Some(3), Some(1), 5), (3, 3));
    }

    #[test]
    fn arity_messages() {
        let err = check_arity("len", &[], 1, Some(1)).unwrap_err();
        let Signal::Error(e) = err else {
            panic!("expected error");
        };
        assert!(e.message.contains("len() expects 1"));
    }

    #[test]
    fn sort_values_orders_and_rejects_mixed() {
        let sorted = sort_values(vec![Value::Int(3), Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(Value::list(sorted).to_text(), "[1, 2, 3]");
        assert!(sort_values(vec![Value::Int(1), Value::text("a")]).is_err());
    }
}
