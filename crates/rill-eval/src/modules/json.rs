//! `json` module: parsing and serialisation via serde_json.

use crate::interp::Interpreter;
use crate::signal::Exec;
use crate::support::{arg_error, check_arity, text_arg};
use crate::value::{Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[("parse", json_parse), ("stringify", json_stringify)])
}

fn json_parse(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("parse", &args, 1, Some(1))?;
    let text = text_arg("parse", &args, 0)?;
    let parsed: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| arg_error(format!("parse() failed: {e}")))?;
    Ok(from_json(&parsed))
}

fn json_stringify(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("stringify", &args, 1, Some(2))?;
    let json = to_json(&args[0]);
    let pretty = args.get(1).map(|v| v.is_truthy()).unwrap_or(false);
    let rendered = if pretty {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    };
    rendered
        .map(Value::text)
        .map_err(|e| arg_error(format!("stringify() failed: {e}")))
}

/// Convert a runtime value to JSON. Map keys render via their text form;
/// callables and other opaque values become null.
pub(crate) fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::None => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.to_string()),
        Value::List(items) => {
            serde_json::Value::Array(items.borrow().iter().map(to_json).collect())
        }
        Value::Range(start, end) => serde_json::Value::Array(
            crate::value::range_items(*start, *end)
                .iter()
                .map(to_json)
                .collect(),
        ),
        Value::Map(map) => {
            let mut object = serde_json::Map::new();
            for (key, entry) in map.borrow().iter() {
                object.insert(key.to_text(), to_json(entry));
            }
            serde_json::Value::Object(object)
        }
        Value::Instance(instance) => {
            let mut object = serde_json::Map::new();
            for (name, entry) in instance.props.borrow().iter() {
                object.insert(name.clone(), to_json(entry));
            }
            serde_json::Value::Object(object)
        }
        _ => serde_json::Value::Null,
    }
}

pub(crate) fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Value::text(s.clone()),
        serde_json::Value::Array(items) => {
            Value::list(items.iter().map(from_json).collect())
        }
        serde_json::Value::Object(object) => {
            let mut map = ValueMap::new();
            for (key, entry) in object {
                map.insert_str(key, from_json(entry));
            }
            Value::map(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_scalars_and_collections() {
        let parsed: serde_json::Value =
            serde_json::from_str(r#"{"a": 1, "b": [true, null, 2.5], "c": "x"}"#).unwrap();
        let value = from_json(&parsed);
        let back = to_json(&value);
        assert_eq!(parsed, back);
    }

    #[test]
    fn integers_stay_integers() {
        let value = from_json(&serde_json::json!(42));
        assert!(matches!(value, Value::Int(42)));
        let value = from_json(&serde_json::json!(1.5));
        assert!(matches!(value, Value::Float(_)));
    }
}
