//! `db` module: an in-memory table store honouring the module contract.
//!
//! A database handle is a plain map (`{ name, tables: { table: [rows] } }`)
//! mutated in place by the helpers.

use crate::interp::Interpreter;
use crate::signal::Exec;
use crate::support::{arg_error, callable_arg, check_arity, map_arg, text_arg};
use crate::value::{Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[
        ("open", db_open),
        ("insert", db_insert),
        ("all", db_all),
        ("find", db_find),
        ("count", db_count),
        ("clear", db_clear),
    ])
}

fn db_open(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("open", &args, 1, Some(1))?;
    let name = text_arg("open", &args, 0)?;
    let mut handle = ValueMap::new();
    handle.insert_str("name", Value::Text(name));
    handle.insert_str("tables", Value::map(ValueMap::new()));
    Ok(Value::map(handle))
}

/// The rows list for a table, creating it on demand.
fn table_rows(name: &str, args: &[Value], create: bool) -> Exec<Option<Value>> {
    let handle = map_arg(name, args, 0)?;
    let table = text_arg(name, args, 1)?;
    let tables = handle.borrow().get_str("tables").cloned();
    let Some(Value::Map(tables)) = tables else {
        return Err(arg_error(format!("{name}() expects a database handle")));
    };
    let existing = tables.borrow().get_str(&table).cloned();
    match existing {
        Some(rows) => Ok(Some(rows)),
        None if create => {
            let rows = Value::list(Vec::new());
            tables.borrow_mut().insert_str(&table, rows.clone());
            Ok(Some(rows))
        }
        None => Ok(None),
    }
}

fn db_insert(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("insert", &args, 3, Some(3))?;
    let rows = table_rows("insert", &args, true)?.unwrap_or_else(|| Value::list(Vec::new()));
    if let Value::List(rows) = &rows {
        rows.borrow_mut().push(args[2].clone());
    }
    Ok(args[2].clone())
}

fn db_all(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("all", &args, 2, Some(2))?;
    match table_rows("all", &args, false)? {
        Some(Value::List(rows)) => Ok(Value::list(rows.borrow().clone())),
        _ => Ok(Value::list(Vec::new())),
    }
}

fn db_find(interp: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("find", &args, 3, Some(3))?;
    let predicate = callable_arg("find", &args, 2)?;
    let rows = match table_rows("find", &args, false)? {
        Some(Value::List(rows)) => rows.borrow().clone(),
        _ => Vec::new(),
    };
    let mut matched = Vec::new();
    for row in rows {
        if interp
            .call_host(predicate.clone(), vec![row.clone()])?
            .is_truthy()
        {
            matched.push(row);
        }
    }
    Ok(Value::list(matched))
}

fn db_count(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("count", &args, 2, Some(2))?;
    match table_rows("count", &args, false)? {
        Some(Value::List(rows)) => Ok(Value::Int(rows.borrow().len() as i64)),
        _ => Ok(Value::Int(0)),
    }
}

fn db_clear(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("clear", &args, 2, Some(2))?;
    if let Some(Value::List(rows)) = table_rows("clear", &args, false)? {
        rows.borrow_mut().clear();
    }
    Ok(Value::None)
}
