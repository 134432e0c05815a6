//! `datetime` module: wall-clock access and formatting via chrono.

use chrono::{Datelike, Local, TimeZone, Timelike};

use crate::interp::Interpreter;
use crate::ops;
use crate::signal::Exec;
use crate::support::{arg_error, check_arity, text_arg};
use crate::value::{Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[
        ("now", dt_now),
        ("nowIso", dt_now_iso),
        ("format", dt_format),
        ("year", dt_year),
        ("month", dt_month),
        ("day", dt_day),
        ("hour", dt_hour),
        ("minute", dt_minute),
        ("second", dt_second),
        ("weekday", dt_weekday),
    ])
}

/// Timestamp argument (seconds since the epoch); defaults to now.
fn timestamp_arg(name: &str, args: &[Value]) -> Exec<chrono::DateTime<Local>> {
    let secs = match args.first() {
        None | Some(Value::None) => {
            return Ok(Local::now());
        }
        Some(value) => ops::as_f64(value)
            .ok_or_else(|| arg_error(format!("{name}() expects a timestamp")))?,
    };
    Local
        .timestamp_opt(secs as i64, ((secs.fract()) * 1e9) as u32)
        .single()
        .ok_or_else(|| arg_error(format!("{name}() timestamp out of range")))
}

fn dt_now(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("now", &args, 0, Some(0))?;
    Ok(Value::Float(Local::now().timestamp_millis() as f64 / 1000.0))
}

fn dt_now_iso(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("nowIso", &args, 0, Some(0))?;
    Ok(Value::text(Local::now().to_rfc3339()))
}

fn dt_format(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("format", &args, 2, Some(2))?;
    let when = timestamp_arg("format", &args)?;
    let pattern = text_arg("format", &args, 1)?;
    Ok(Value::text(when.format(&pattern).to_string()))
}

fn dt_year(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("year", &args, 0, Some(1))?;
    Ok(Value::Int(timestamp_arg("year", &args)?.year() as i64))
}

fn dt_month(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("month", &args, 0, Some(1))?;
    Ok(Value::Int(timestamp_arg("month", &args)?.month() as i64))
}

fn dt_day(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("day", &args, 0, Some(1))?;
    Ok(Value::Int(timestamp_arg("day", &args)?.day() as i64))
}

fn dt_hour(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("hour", &args, 0, Some(1))?;
    Ok(Value::Int(timestamp_arg("hour", &args)?.hour() as i64))
}

fn dt_minute(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("minute", &args, 0, Some(1))?;
    Ok(Value::Int(timestamp_arg("minute", &args)?.minute() as i64))
}

fn dt_second(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("second", &args, 0, Some(1))?;
    Ok(Value::Int(timestamp_arg("second", &args)?.second() as i64))
}

fn dt_weekday(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("weekday", &args, 0, Some(1))?;
    let when = timestamp_arg("weekday", &args)?;
    Ok(Value::Int(when.weekday().num_days_from_monday() as i64))
}
