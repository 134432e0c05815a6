//! `logging` module: leveled printers on standard error.

use chrono::Local;

use crate::interp::Interpreter;
use crate::signal::Exec;
use crate::value::{Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[
        ("debug", log_debug),
        ("info", log_info),
        ("warn", log_warn),
        ("error", log_error),
    ])
}

fn emit(level: &str, args: &[Value]) -> Exec<Value> {
    let rendered: Vec<String> = args.iter().map(|v| v.to_text()).collect();
    eprintln!(
        "[{} {level}] {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        rendered.join(" ")
    );
    Ok(Value::None)
}

fn log_debug(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    emit("DEBUG", &args)
}

fn log_info(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    emit("INFO", &args)
}

fn log_warn(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    emit("WARN", &args)
}

fn log_error(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    emit("ERROR", &args)
}
