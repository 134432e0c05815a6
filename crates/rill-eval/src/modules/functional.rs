//! `functional` module: combinators over conduits.
//!
//! Derived callables (composition, partial application) are host functions
//! whose bound receiver carries the captured conduits, so they stay plain
//! values and flow through pipelines like any other callable.

use crate::interp::Interpreter;
use crate::signal::Exec;
use crate::support::{arg_error, callable_arg, check_arity, list_arg};
use crate::value::{HostFn, Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[
        ("identity", functional_identity),
        ("constant", functional_constant),
        ("compose", functional_compose),
        ("pipe", functional_pipe),
        ("partial", functional_partial),
        ("apply", functional_apply),
    ])
}

fn functional_identity(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("identity", &args, 1, Some(1))?;
    Ok(args[0].clone())
}

fn functional_constant(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("constant", &args, 1, Some(1))?;
    Ok(HostFn::bound("constant", args[0].clone(), constant_call))
}

fn constant_call(_: &mut Interpreter, recv: Option<&Value>, _: Vec<Value>) -> Exec<Value> {
    Ok(recv.cloned().unwrap_or(Value::None))
}

fn capture_conduits(name: &str, args: &[Value]) -> Exec<Value> {
    if args.is_empty() {
        return Err(arg_error(format!("{name}() expects at least one conduit")));
    }
    for (i, _) in args.iter().enumerate() {
        callable_arg(name, args, i)?;
    }
    Ok(Value::list(args.to_vec()))
}

/// `compose(f, g, h)(x)` is `f(g(h(x)))`.
fn functional_compose(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    let captured = capture_conduits("compose", &args)?;
    Ok(HostFn::bound("composed", captured, compose_call))
}

fn compose_call(interp: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    let stages = match recv {
        Some(Value::List(stages)) => stages.borrow().clone(),
        _ => Vec::new(),
    };
    let mut value = Value::None;
    let mut first = true;
    for stage in stages.into_iter().rev() {
        value = if first {
            first = false;
            interp.call_host(stage, args.clone())?
        } else {
            interp.call_host(stage, vec![value])?
        };
    }
    Ok(value)
}

/// `pipe(f, g, h)(x)` is `h(g(f(x)))`.
fn functional_pipe(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    let captured = capture_conduits("pipe", &args)?;
    Ok(HostFn::bound("piped", captured, pipe_call))
}

fn pipe_call(interp: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    let stages = match recv {
        Some(Value::List(stages)) => stages.borrow().clone(),
        _ => Vec::new(),
    };
    let mut value = Value::None;
    let mut first = true;
    for stage in stages {
        value = if first {
            first = false;
            interp.call_host(stage, args.clone())?
        } else {
            interp.call_host(stage, vec![value])?
        };
    }
    Ok(value)
}

/// `partial(f, a, b)(c)` is `f(a, b, c)`.
fn functional_partial(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("partial", &args, 1, None)?;
    callable_arg("partial", &args, 0)?;
    Ok(HostFn::bound(
        "partial",
        Value::list(args.to_vec()),
        partial_call,
    ))
}

fn partial_call(interp: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    let captured = match recv {
        Some(Value::List(captured)) => captured.borrow().clone(),
        _ => return Ok(Value::None),
    };
    let mut iter = captured.into_iter();
    let Some(func) = iter.next() else {
        return Ok(Value::None);
    };
    let mut all: Vec<Value> = iter.collect();
    all.extend(args);
    interp.call_host(func, all)
}

fn functional_apply(interp: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("apply", &args, 2, Some(2))?;
    let func = callable_arg("apply", &args, 0)?;
    let call_args = list_arg("apply", &args, 1)?;
    let call_args = call_args.borrow().clone();
    interp.call_host(func, call_args)
}
