//! `string` module: helpers beyond the host method surface.

use crate::interp::Interpreter;
use crate::signal::Exec;
use crate::support::{check_arity, text_arg};
use crate::value::{Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[
        ("capitalize", string_capitalize),
        ("title", string_title),
        ("reverse", string_reverse),
        ("count", string_count),
        ("lines", string_lines),
        ("words", string_words),
        ("isDigit", string_is_digit),
        ("isAlpha", string_is_alpha),
    ])
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn string_capitalize(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("capitalize", &args, 1, Some(1))?;
    let s = text_arg("capitalize", &args, 0)?;
    Ok(Value::text(capitalize_word(&s)))
}

fn string_title(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("title", &args, 1, Some(1))?;
    let s = text_arg("title", &args, 0)?;
    let out: Vec<String> = s.split(' ').map(capitalize_word).collect();
    Ok(Value::text(out.join(" ")))
}

fn string_reverse(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("reverse", &args, 1, Some(1))?;
    let s = text_arg("reverse", &args, 0)?;
    Ok(Value::text(s.chars().rev().collect::<String>()))
}

fn string_count(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("count", &args, 2, Some(2))?;
    let s = text_arg("count", &args, 0)?;
    let needle = text_arg("count", &args, 1)?;
    if needle.is_empty() {
        return Ok(Value::Int(0));
    }
    Ok(Value::Int(s.matches(&*needle).count() as i64))
}

fn string_lines(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("lines", &args, 1, Some(1))?;
    let s = text_arg("lines", &args, 0)?;
    Ok(Value::list(s.lines().map(Value::text).collect()))
}

fn string_words(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("words", &args, 1, Some(1))?;
    let s = text_arg("words", &args, 0)?;
    Ok(Value::list(s.split_whitespace().map(Value::text).collect()))
}

fn string_is_digit(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("isDigit", &args, 1, Some(1))?;
    let s = text_arg("isDigit", &args, 0)?;
    Ok(Value::Bool(
        !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()),
    ))
}

fn string_is_alpha(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("isAlpha", &args, 1, Some(1))?;
    let s = text_arg("isAlpha", &args, 0)?;
    Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_alphabetic)))
}
