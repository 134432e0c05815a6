//! `http` module: blocking client requests via ureq.

use rill_common::error::RuntimeErrorKind;

use crate::interp::Interpreter;
use crate::signal::{error, Exec};
use crate::support::{check_arity, opt_text_arg, text_arg};
use crate::value::{Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[("get", http_get), ("post", http_post)])
}

/// Build the response mapping: `{ status, ok, body }`.
fn response_value(status: u16, body: String) -> Value {
    let mut map = ValueMap::new();
    map.insert_str("status", Value::Int(status as i64));
    map.insert_str("ok", Value::Bool((200..300).contains(&status)));
    map.insert_str("body", Value::text(body));
    Value::map(map)
}

fn http_get(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("get", &args, 1, Some(1))?;
    let url = text_arg("get", &args, 0)?;
    match ureq::get(&url).call() {
        Ok(response) => {
            let status = response.status();
            let body = response.into_string().unwrap_or_default();
            Ok(response_value(status, body))
        }
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            Ok(response_value(status, body))
        }
        Err(e) => Err(error(
            RuntimeErrorKind::Runtime,
            format!("get() failed: {e}"),
        )),
    }
}

fn http_post(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("post", &args, 2, Some(3))?;
    let url = text_arg("post", &args, 0)?;
    let body = args[1].to_text();
    let content_type =
        opt_text_arg("post", &args, 2)?.unwrap_or_else(|| "application/json".into());
    match ureq::post(&url)
        .set("Content-Type", &content_type)
        .send_string(&body)
    {
        Ok(response) => {
            let status = response.status();
            let body = response.into_string().unwrap_or_default();
            Ok(response_value(status, body))
        }
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            Ok(response_value(status, body))
        }
        Err(e) => Err(error(
            RuntimeErrorKind::Runtime,
            format!("post() failed: {e}"),
        )),
    }
}
