//! `agent` module: a tiny conversational-agent scratchpad.
//!
//! An agent is a map handle with a name and an append-only memory list;
//! the helpers are deliberately host-neutral (no network access).

use crate::interp::Interpreter;
use crate::signal::Exec;
use crate::support::{arg_error, check_arity, map_arg, text_arg};
use crate::value::{Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[
        ("create", agent_create),
        ("remember", agent_remember),
        ("recall", agent_recall),
        ("reset", agent_reset),
    ])
}

fn agent_create(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("create", &args, 1, Some(1))?;
    let name = text_arg("create", &args, 0)?;
    let mut agent = ValueMap::new();
    agent.insert_str("name", Value::Text(name));
    agent.insert_str("memory", Value::list(Vec::new()));
    Ok(Value::map(agent))
}

fn memory_of(name: &str, args: &[Value]) -> Exec<Value> {
    let agent = map_arg(name, args, 0)?;
    let memory = agent.borrow().get_str("memory").cloned();
    memory.ok_or_else(|| arg_error(format!("{name}() expects an agent handle")))
}

fn agent_remember(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("remember", &args, 2, Some(2))?;
    let memory = memory_of("remember", &args)?;
    if let Value::List(items) = &memory {
        items.borrow_mut().push(args[1].clone());
    }
    Ok(args[1].clone())
}

fn agent_recall(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("recall", &args, 1, Some(1))?;
    let memory = memory_of("recall", &args)?;
    match &memory {
        Value::List(items) => Ok(Value::list(items.borrow().clone())),
        _ => Ok(Value::list(Vec::new())),
    }
}

fn agent_reset(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("reset", &args, 1, Some(1))?;
    if let Value::List(items) = &memory_of("reset", &args)? {
        items.borrow_mut().clear();
    }
    Ok(Value::None)
}
