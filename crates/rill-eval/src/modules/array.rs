//! `array` module: sequence helpers beyond the host method surface.

use crate::interp::Interpreter;
use crate::signal::Exec;
use crate::support::{arg_error, check_arity, int_arg, list_arg};
use crate::value::{values_equal, Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[
        ("first", array_first),
        ("last", array_last),
        ("unique", array_unique),
        ("zip", array_zip),
        ("chunk", array_chunk),
        ("compact", array_compact),
    ])
}

fn array_first(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("first", &args, 1, Some(1))?;
    let items = list_arg("first", &args, 0)?;
    let first = items.borrow().first().cloned();
    Ok(first.unwrap_or(Value::None))
}

fn array_last(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("last", &args, 1, Some(1))?;
    let items = list_arg("last", &args, 0)?;
    let last = items.borrow().last().cloned();
    Ok(last.unwrap_or(Value::None))
}

fn array_unique(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("unique", &args, 1, Some(1))?;
    let items = list_arg("unique", &args, 0)?;
    let mut out: Vec<Value> = Vec::new();
    for item in items.borrow().iter() {
        if !out.iter().any(|seen| values_equal(seen, item)) {
            out.push(item.clone());
        }
    }
    Ok(Value::list(out))
}

fn array_zip(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("zip", &args, 2, Some(2))?;
    let left = list_arg("zip", &args, 0)?;
    let right = list_arg("zip", &args, 1)?;
    let pairs = left
        .borrow()
        .iter()
        .zip(right.borrow().iter())
        .map(|(a, b)| Value::list(vec![a.clone(), b.clone()]))
        .collect();
    Ok(Value::list(pairs))
}

fn array_chunk(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("chunk", &args, 2, Some(2))?;
    let items = list_arg("chunk", &args, 0)?;
    let size = int_arg("chunk", &args, 1)?;
    if size <= 0 {
        return Err(arg_error("chunk() size must be positive"));
    }
    let chunks = items
        .borrow()
        .chunks(size as usize)
        .map(|chunk| Value::list(chunk.to_vec()))
        .collect();
    Ok(Value::list(chunks))
}

fn array_compact(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("compact", &args, 1, Some(1))?;
    let items = list_arg("compact", &args, 0)?;
    let out = items
        .borrow()
        .iter()
        .filter(|v| !matches!(v, Value::None))
        .cloned()
        .collect();
    Ok(Value::list(out))
}
