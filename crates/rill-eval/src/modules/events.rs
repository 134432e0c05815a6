//! `events` module: a minimal emitter built on map values.
//!
//! The emitter is an ordinary map (`{ handlers: { name: [conduits] } }`);
//! the helpers mutate it in place, so scripts can pass it around freely.

use crate::interp::Interpreter;
use crate::signal::Exec;
use crate::support::{arg_error, callable_arg, check_arity, map_arg, text_arg};
use crate::value::{Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[
        ("emitter", events_emitter),
        ("on", events_on),
        ("off", events_off),
        ("emit", events_emit),
    ])
}

fn events_emitter(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("emitter", &args, 0, Some(0))?;
    let mut map = ValueMap::new();
    map.insert_str("handlers", Value::map(ValueMap::new()));
    Ok(Value::map(map))
}

fn handlers_of(name: &str, args: &[Value]) -> Exec<Value> {
    let emitter = map_arg(name, args, 0)?;
    let handlers = emitter.borrow().get_str("handlers").cloned();
    handlers.ok_or_else(|| arg_error(format!("{name}() expects an emitter")))
}

fn events_on(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("on", &args, 3, Some(3))?;
    let handlers = handlers_of("on", &args)?;
    let event = text_arg("on", &args, 1)?;
    let handler = callable_arg("on", &args, 2)?;

    let Value::Map(handlers) = &handlers else {
        return Err(arg_error("on() expects an emitter"));
    };
    let mut handlers = handlers.borrow_mut();
    let listeners = handlers.get_str(&event).cloned();
    match listeners {
        Some(Value::List(listeners)) => listeners.borrow_mut().push(handler),
        _ => handlers.insert_str(&event, Value::list(vec![handler])),
    }
    Ok(Value::None)
}

fn events_off(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("off", &args, 2, Some(2))?;
    let handlers = handlers_of("off", &args)?;
    let event = text_arg("off", &args, 1)?;
    if let Value::Map(handlers) = &handlers {
        handlers.borrow_mut().remove(&Value::text(event));
    }
    Ok(Value::None)
}

fn events_emit(interp: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("emit", &args, 2, None)?;
    let handlers = handlers_of("emit", &args)?;
    let event = text_arg("emit", &args, 1)?;
    let payload: Vec<Value> = args[2..].to_vec();

    let listeners = match &handlers {
        Value::Map(handlers) => match handlers.borrow().get_str(&event) {
            Some(Value::List(listeners)) => listeners.borrow().clone(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let mut results = Vec::with_capacity(listeners.len());
    for listener in listeners {
        results.push(interp.call_host(listener, payload.clone())?);
    }
    Ok(Value::list(results))
}
