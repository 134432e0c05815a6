//! `collections` module: grouping and counting helpers.

use crate::interp::Interpreter;
use crate::signal::Exec;
use crate::support::{callable_arg, check_arity, list_arg, map_arg};
use crate::value::{Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[
        ("counter", collections_counter),
        ("groupBy", collections_group_by),
        ("partition", collections_partition),
        ("invert", collections_invert),
        ("merge", collections_merge),
    ])
}

fn collections_counter(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("counter", &args, 1, Some(1))?;
    let items = list_arg("counter", &args, 0)?;
    let mut counts = ValueMap::new();
    for item in items.borrow().iter() {
        let current = match counts.get(item) {
            Some(Value::Int(n)) => *n,
            _ => 0,
        };
        counts.insert(item.clone(), Value::Int(current + 1));
    }
    Ok(Value::map(counts))
}

fn collections_group_by(
    interp: &mut Interpreter,
    _: Option<&Value>,
    args: Vec<Value>,
) -> Exec<Value> {
    check_arity("groupBy", &args, 2, Some(2))?;
    let func = callable_arg("groupBy", &args, 0)?;
    let items = list_arg("groupBy", &args, 1)?;
    let items = items.borrow().clone();

    let mut groups = ValueMap::new();
    for item in items {
        let key = interp.call_host(func.clone(), vec![item.clone()])?;
        let bucket = groups.get(&key).cloned();
        match bucket {
            Some(Value::List(bucket)) => bucket.borrow_mut().push(item),
            _ => groups.insert(key, Value::list(vec![item])),
        }
    }
    Ok(Value::map(groups))
}

fn collections_partition(
    interp: &mut Interpreter,
    _: Option<&Value>,
    args: Vec<Value>,
) -> Exec<Value> {
    check_arity("partition", &args, 2, Some(2))?;
    let func = callable_arg("partition", &args, 0)?;
    let items = list_arg("partition", &args, 1)?;
    let items = items.borrow().clone();

    let mut matched = Vec::new();
    let mut rest = Vec::new();
    for item in items {
        if interp.call_host(func.clone(), vec![item.clone()])?.is_truthy() {
            matched.push(item);
        } else {
            rest.push(item);
        }
    }
    Ok(Value::list(vec![
        Value::list(matched),
        Value::list(rest),
    ]))
}

fn collections_invert(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("invert", &args, 1, Some(1))?;
    let map = map_arg("invert", &args, 0)?;
    let mut inverted = ValueMap::new();
    for (key, value) in map.borrow().iter() {
        inverted.insert(value.clone(), key.clone());
    }
    Ok(Value::map(inverted))
}

fn collections_merge(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("merge", &args, 1, None)?;
    let mut merged = ValueMap::new();
    for (i, _) in args.iter().enumerate() {
        let map = map_arg("merge", &args, i)?;
        merged.extend_from(&map.borrow());
    }
    Ok(Value::map(merged))
}
