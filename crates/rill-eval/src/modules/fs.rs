//! `fs` module: thin adapters over the host file system.

use std::io::Write;

use rill_common::error::RuntimeErrorKind;

use crate::interp::Interpreter;
use crate::signal::{error, Exec, Signal};
use crate::support::{check_arity, text_arg};
use crate::value::{Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[
        ("readFile", fs_read_file),
        ("writeFile", fs_write_file),
        ("appendFile", fs_append_file),
        ("exists", fs_exists),
        ("deleteFile", fs_delete_file),
        ("listDir", fs_list_dir),
        ("mkdir", fs_mkdir),
    ])
}

fn io_error(op: &str, path: &str, e: std::io::Error) -> Signal {
    error(RuntimeErrorKind::Runtime, format!("{op} '{path}': {e}"))
}

fn fs_read_file(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("readFile", &args, 1, Some(1))?;
    let path = text_arg("readFile", &args, 0)?;
    std::fs::read_to_string(&*path)
        .map(Value::text)
        .map_err(|e| io_error("Cannot read", &path, e))
}

fn fs_write_file(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("writeFile", &args, 2, Some(2))?;
    let path = text_arg("writeFile", &args, 0)?;
    let content = args[1].to_text();
    std::fs::write(&*path, content)
        .map(|_| Value::None)
        .map_err(|e| io_error("Cannot write", &path, e))
}

fn fs_append_file(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("appendFile", &args, 2, Some(2))?;
    let path = text_arg("appendFile", &args, 0)?;
    let content = args[1].to_text();
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&*path)
        .map_err(|e| io_error("Cannot open", &path, e))?;
    file.write_all(content.as_bytes())
        .map(|_| Value::None)
        .map_err(|e| io_error("Cannot append to", &path, e))
}

fn fs_exists(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("exists", &args, 1, Some(1))?;
    let path = text_arg("exists", &args, 0)?;
    Ok(Value::Bool(std::path::Path::new(&*path).exists()))
}

fn fs_delete_file(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("deleteFile", &args, 1, Some(1))?;
    let path = text_arg("deleteFile", &args, 0)?;
    std::fs::remove_file(&*path)
        .map(|_| Value::None)
        .map_err(|e| io_error("Cannot delete", &path, e))
}

fn fs_list_dir(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("listDir", &args, 1, Some(1))?;
    let path = text_arg("listDir", &args, 0)?;
    let entries = std::fs::read_dir(&*path).map_err(|e| io_error("Cannot list", &path, e))?;
    let mut names: Vec<Value> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_error("Cannot list", &path, e))?;
        names.push(Value::text(entry.file_name().to_string_lossy().to_string()));
    }
    Ok(Value::list(names))
}

fn fs_mkdir(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("mkdir", &args, 1, Some(1))?;
    let path = text_arg("mkdir", &args, 0)?;
    std::fs::create_dir_all(&*path)
        .map(|_| Value::None)
        .map_err(|e| io_error("Cannot create directory", &path, e))
}
