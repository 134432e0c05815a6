//! `regex` module: pattern matching over text.

use regex::Regex;

use crate::interp::Interpreter;
use crate::signal::{Exec, Signal};
use crate::support::{arg_error, check_arity, text_arg};
use crate::value::{Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[
        ("test", regex_test),
        ("find", regex_find),
        ("findAll", regex_find_all),
        ("replace", regex_replace),
        ("split", regex_split),
    ])
}

fn compile(name: &str, pattern: &str) -> Result<Regex, Signal> {
    Regex::new(pattern).map_err(|e| arg_error(format!("{name}() invalid pattern: {e}")))
}

fn regex_test(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("test", &args, 2, Some(2))?;
    let pattern = text_arg("test", &args, 0)?;
    let subject = text_arg("test", &args, 1)?;
    Ok(Value::Bool(compile("test", &pattern)?.is_match(&subject)))
}

fn regex_find(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("find", &args, 2, Some(2))?;
    let pattern = text_arg("find", &args, 0)?;
    let subject = text_arg("find", &args, 1)?;
    Ok(compile("find", &pattern)?
        .find(&subject)
        .map(|m| Value::text(m.as_str()))
        .unwrap_or(Value::None))
}

fn regex_find_all(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("findAll", &args, 2, Some(2))?;
    let pattern = text_arg("findAll", &args, 0)?;
    let subject = text_arg("findAll", &args, 1)?;
    let matches = compile("findAll", &pattern)?
        .find_iter(&subject)
        .map(|m| Value::text(m.as_str()))
        .collect();
    Ok(Value::list(matches))
}

fn regex_replace(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("replace", &args, 3, Some(3))?;
    let pattern = text_arg("replace", &args, 0)?;
    let subject = text_arg("replace", &args, 1)?;
    let replacement = text_arg("replace", &args, 2)?;
    let out = compile("replace", &pattern)?.replace_all(&subject, &*replacement);
    Ok(Value::text(out.into_owned()))
}

fn regex_split(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("split", &args, 2, Some(2))?;
    let pattern = text_arg("split", &args, 0)?;
    let subject = text_arg("split", &args, 1)?;
    let parts = compile("split", &pattern)?
        .split(&subject)
        .map(Value::text)
        .collect();
    Ok(Value::list(parts))
}
