//! `validation` module: predicate helpers over text and numbers.

use regex::Regex;

use crate::interp::Interpreter;
use crate::ops;
use crate::signal::Exec;
use crate::support::{arg_error, check_arity, int_arg, num_arg, text_arg};
use crate::value::{Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[
        ("isEmail", validation_is_email),
        ("isUrl", validation_is_url),
        ("isNumeric", validation_is_numeric),
        ("isEmpty", validation_is_empty),
        ("minLength", validation_min_length),
        ("maxLength", validation_max_length),
        ("inRange", validation_in_range),
    ])
}

fn validation_is_email(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("isEmail", &args, 1, Some(1))?;
    let s = text_arg("isEmail", &args, 0)?;
    let pattern = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .map_err(|e| arg_error(format!("isEmail() pattern error: {e}")))?;
    Ok(Value::Bool(pattern.is_match(&s)))
}

fn validation_is_url(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("isUrl", &args, 1, Some(1))?;
    let s = text_arg("isUrl", &args, 0)?;
    let pattern = Regex::new(r"^https?://[^\s/$.?#].[^\s]*$")
        .map_err(|e| arg_error(format!("isUrl() pattern error: {e}")))?;
    Ok(Value::Bool(pattern.is_match(&s)))
}

fn validation_is_numeric(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("isNumeric", &args, 1, Some(1))?;
    let numeric = match &args[0] {
        Value::Int(_) | Value::Float(_) => true,
        Value::Text(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    };
    Ok(Value::Bool(numeric))
}

fn validation_is_empty(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("isEmpty", &args, 1, Some(1))?;
    let empty = match &args[0] {
        Value::None => true,
        Value::Text(s) => s.is_empty(),
        Value::List(items) => items.borrow().is_empty(),
        Value::Map(map) => map.borrow().is_empty(),
        _ => false,
    };
    Ok(Value::Bool(empty))
}

fn validation_min_length(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("minLength", &args, 2, Some(2))?;
    let length = length_of(&args[0])?;
    let min = int_arg("minLength", &args, 1)?;
    Ok(Value::Bool(length >= min))
}

fn validation_max_length(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("maxLength", &args, 2, Some(2))?;
    let length = length_of(&args[0])?;
    let max = int_arg("maxLength", &args, 1)?;
    Ok(Value::Bool(length <= max))
}

fn length_of(value: &Value) -> Exec<i64> {
    match value {
        Value::Text(s) => Ok(s.chars().count() as i64),
        Value::List(items) => Ok(items.borrow().len() as i64),
        Value::Map(map) => Ok(map.borrow().len() as i64),
        other => Err(arg_error(format!(
            "length checks expect text or a collection, got {}",
            other.type_name()
        ))),
    }
}

fn validation_in_range(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("inRange", &args, 3, Some(3))?;
    let value = ops::as_f64(&args[0]);
    let lo = num_arg("inRange", &args, 1)?;
    let hi = num_arg("inRange", &args, 2)?;
    Ok(Value::Bool(
        value.map(|v| lo <= v && v <= hi).unwrap_or(false),
    ))
}
