//! `async` module: cooperative task values.
//!
//! A task wraps a zero-argument conduit; `wait` (or an asynchronous
//! pipeline stage boundary) drives it to completion exactly once and
//! caches the result. Everything is single-threaded and cooperative.

use std::cell::RefCell;
use std::rc::Rc;

use crate::interp::Interpreter;
use crate::signal::Exec;
use crate::support::{callable_arg, check_arity, list_arg, num_arg};
use crate::value::{TaskState, Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[
        ("task", async_task),
        ("run", async_run),
        ("all", async_all),
        ("delay", async_delay),
    ])
}

fn async_task(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("task", &args, 1, Some(1))?;
    let thunk = callable_arg("task", &args, 0)?;
    Ok(Value::Task(Rc::new(RefCell::new(TaskState {
        thunk: Some(thunk),
        result: None,
    }))))
}

fn async_run(interp: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("run", &args, 1, Some(1))?;
    interp.drive_task(args[0].clone())
}

fn async_all(interp: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("all", &args, 1, Some(1))?;
    let tasks = list_arg("all", &args, 0)?;
    let tasks = tasks.borrow().clone();
    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(interp.drive_task(task)?);
    }
    Ok(Value::list(results))
}

fn async_delay(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("delay", &args, 1, Some(2))?;
    let secs = num_arg("delay", &args, 0)?;
    if secs > 0.0 {
        std::thread::sleep(std::time::Duration::from_secs_f64(secs));
    }
    Ok(args.get(1).cloned().unwrap_or(Value::None))
}
