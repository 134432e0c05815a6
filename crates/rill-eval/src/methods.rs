//! Host method surfaces for built-in values.
//!
//! Member access on text and sequences resolves here: names that denote
//! attributes (`length`) yield a value directly, names that denote
//! operations yield a host function bound to the receiver, so
//! `"abc".upper` and `xs -> push(4)` both work.

use crate::interp::Interpreter;
use crate::signal::Exec;
use crate::support::{
    check_arity, int_arg, opt_int_arg, opt_text_arg, recv_list, recv_text, slice_bounds,
    sort_values, text_arg,
};
use crate::value::{HostFn, Value, values_equal};

/// Resolve a member on a built-in value. `None` when the name is not part
/// of the surface.
pub(crate) fn host_member(value: &Value, name: &str) -> Option<Value> {
    match value {
        Value::Text(s) => text_member(s, name, value),
        Value::List(items) => list_member(&items.borrow(), name, value),
        Value::Generator(_) => match name {
            "next" => Some(HostFn::bound("next", value.clone(), generator_next_fn)),
            _ => None,
        },
        _ => None,
    }
}

fn text_member(s: &str, name: &str, recv: &Value) -> Option<Value> {
    let method: fn(&mut Interpreter, Option<&Value>, Vec<Value>) -> Exec<Value> = match name {
        "length" => return Some(Value::Int(s.chars().count() as i64)),
        "upper" => text_upper,
        "lower" => text_lower,
        "trim" => text_trim,
        "split" => text_split,
        "replace" => text_replace,
        "startsWith" => text_starts_with,
        "endsWith" => text_ends_with,
        "includes" => text_includes,
        "indexOf" => text_index_of,
        "charAt" => text_char_at,
        "substring" => text_substring,
        "repeat" => text_repeat,
        "padStart" => text_pad_start,
        "padEnd" => text_pad_end,
        _ => return None,
    };
    Some(HostFn::bound(name, recv.clone(), method))
}

fn list_member(items: &[Value], name: &str, recv: &Value) -> Option<Value> {
    let method: fn(&mut Interpreter, Option<&Value>, Vec<Value>) -> Exec<Value> = match name {
        "length" => return Some(Value::Int(items.len() as i64)),
        "push" => list_push,
        "pop" => list_pop,
        "shift" => list_shift,
        "unshift" => list_unshift,
        "slice" => list_slice,
        "indexOf" => list_index_of,
        "includes" => list_includes,
        "join" => list_join,
        "reverse" => list_reverse,
        "sort" => list_sort,
        "concat" => list_concat,
        "flat" => list_flat,
        "fill" => list_fill,
        _ => return None,
    };
    Some(HostFn::bound(name, recv.clone(), method))
}

// ── Text operations ───────────────────────────────────────────────────

fn text_upper(_: &mut Interpreter, recv: Option<&Value>, _: Vec<Value>) -> Exec<Value> {
    Ok(Value::text(recv_text(recv).to_uppercase()))
}

fn text_lower(_: &mut Interpreter, recv: Option<&Value>, _: Vec<Value>) -> Exec<Value> {
    Ok(Value::text(recv_text(recv).to_lowercase()))
}

fn text_trim(_: &mut Interpreter, recv: Option<&Value>, _: Vec<Value>) -> Exec<Value> {
    Ok(Value::text(recv_text(recv).trim()))
}

/// Split on a separator; with no separator, split on whitespace runs.
pub(crate) fn split_text(s: &str, sep: Option<&str>) -> Value {
    let parts: Vec<Value> = match sep {
        Some(sep) => s.split(sep).map(Value::text).collect(),
        None => s.split_whitespace().map(Value::text).collect(),
    };
    Value::list(parts)
}

fn text_split(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("split", &args, 0, Some(1))?;
    let sep = opt_text_arg("split", &args, 0)?;
    Ok(split_text(&recv_text(recv), sep.as_deref()))
}

fn text_replace(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("replace", &args, 2, Some(2))?;
    let old = text_arg("replace", &args, 0)?;
    let new = text_arg("replace", &args, 1)?;
    Ok(Value::text(recv_text(recv).replace(&*old, &new)))
}

fn text_starts_with(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("startsWith", &args, 1, Some(1))?;
    let prefix = text_arg("startsWith", &args, 0)?;
    Ok(Value::Bool(recv_text(recv).starts_with(&*prefix)))
}

fn text_ends_with(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("endsWith", &args, 1, Some(1))?;
    let suffix = text_arg("endsWith", &args, 0)?;
    Ok(Value::Bool(recv_text(recv).ends_with(&*suffix)))
}

fn text_includes(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("includes", &args, 1, Some(1))?;
    let needle = text_arg("includes", &args, 0)?;
    Ok(Value::Bool(recv_text(recv).contains(&*needle)))
}

/// Character index of the first occurrence, or -1.
pub(crate) fn text_find(s: &str, needle: &str) -> i64 {
    match s.find(needle) {
        Some(byte) => s[..byte].chars().count() as i64,
        None => -1,
    }
}

fn text_index_of(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("indexOf", &args, 1, Some(1))?;
    let needle = text_arg("indexOf", &args, 0)?;
    Ok(Value::Int(text_find(&recv_text(recv), &needle)))
}

fn text_char_at(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("charAt", &args, 1, Some(1))?;
    let index = int_arg("charAt", &args, 0)?;
    let s = recv_text(recv);
    let ch = usize::try_from(index)
        .ok()
        .and_then(|i| s.chars().nth(i));
    Ok(Value::text(
        ch.map(|c| c.to_string()).unwrap_or_default(),
    ))
}

pub(crate) fn substring(s: &str, start: Option<i64>, end: Option<i64>) -> String {
    let chars: Vec<char> = s.chars().collect();
    let (lo, hi) = slice_bounds(start, end, chars.len());
    chars[lo..hi].iter().collect()
}

fn text_substring(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("substring", &args, 1, Some(2))?;
    let start = opt_int_arg("substring", &args, 0)?;
    let end = opt_int_arg("substring", &args, 1)?;
    Ok(Value::text(substring(&recv_text(recv), start, end)))
}

fn text_repeat(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("repeat", &args, 1, Some(1))?;
    let count = int_arg("repeat", &args, 0)?;
    Ok(Value::text(recv_text(recv).repeat(count.max(0) as usize)))
}

pub(crate) fn pad(s: &str, width: i64, fill: &str, at_start: bool) -> String {
    let fill = fill.chars().next().unwrap_or(' ');
    let len = s.chars().count() as i64;
    if width <= len {
        return s.to_string();
    }
    let padding: String = std::iter::repeat(fill).take((width - len) as usize).collect();
    if at_start {
        format!("{padding}{s}")
    } else {
        format!("{s}{padding}")
    }
}

fn text_pad_start(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("padStart", &args, 1, Some(2))?;
    let width = int_arg("padStart", &args, 0)?;
    let fill = opt_text_arg("padStart", &args, 1)?.unwrap_or_else(|| " ".into());
    Ok(Value::text(pad(&recv_text(recv), width, &fill, true)))
}

fn text_pad_end(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("padEnd", &args, 1, Some(2))?;
    let width = int_arg("padEnd", &args, 0)?;
    let fill = opt_text_arg("padEnd", &args, 1)?.unwrap_or_else(|| " ".into());
    Ok(Value::text(pad(&recv_text(recv), width, &fill, false)))
}

// ── Sequence operations ───────────────────────────────────────────────

fn list_push(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("push", &args, 1, Some(1))?;
    let items = recv_list(recv);
    items.borrow_mut().push(args[0].clone());
    Ok(Value::List(items))
}

fn list_pop(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("pop", &args, 0, Some(0))?;
    Ok(recv_list(recv).borrow_mut().pop().unwrap_or(Value::None))
}

fn list_shift(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("shift", &args, 0, Some(0))?;
    let items = recv_list(recv);
    let mut items = items.borrow_mut();
    if items.is_empty() {
        Ok(Value::None)
    } else {
        Ok(items.remove(0))
    }
}

fn list_unshift(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("unshift", &args, 1, Some(1))?;
    let items = recv_list(recv);
    items.borrow_mut().insert(0, args[0].clone());
    Ok(Value::List(items))
}

fn list_slice(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("slice", &args, 0, Some(2))?;
    let start = opt_int_arg("slice", &args, 0)?;
    let end = opt_int_arg("slice", &args, 1)?;
    let items = recv_list(recv);
    let items = items.borrow();
    let (lo, hi) = slice_bounds(start, end, items.len());
    Ok(Value::list(items[lo..hi].to_vec()))
}

fn list_index_of(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("indexOf", &args, 1, Some(1))?;
    let items = recv_list(recv);
    let index = items
        .borrow()
        .iter()
        .position(|v| values_equal(v, &args[0]))
        .map(|i| i as i64)
        .unwrap_or(-1);
    Ok(Value::Int(index))
}

fn list_includes(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("includes", &args, 1, Some(1))?;
    let items = recv_list(recv);
    let found = items.borrow().iter().any(|v| values_equal(v, &args[0]));
    Ok(Value::Bool(found))
}

fn list_join(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("join", &args, 0, Some(1))?;
    let sep = opt_text_arg("join", &args, 0)?.unwrap_or_else(|| "".into());
    let items = recv_list(recv);
    let rendered: Vec<String> = items.borrow().iter().map(|v| v.to_text()).collect();
    Ok(Value::text(rendered.join(&sep)))
}

fn list_reverse(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("reverse", &args, 0, Some(0))?;
    let items = recv_list(recv);
    let mut out = items.borrow().clone();
    out.reverse();
    Ok(Value::list(out))
}

fn list_sort(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("sort", &args, 0, Some(0))?;
    let items = recv_list(recv);
    let out = sort_values(items.borrow().clone())?;
    Ok(Value::list(out))
}

fn list_concat(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("concat", &args, 1, Some(1))?;
    let other = crate::support::list_arg("concat", &args, 0)?;
    let items = recv_list(recv);
    let mut out = items.borrow().clone();
    out.extend(other.borrow().iter().cloned());
    Ok(Value::list(out))
}

/// One-level flatten: nested sequences contribute their elements,
/// everything else passes through.
pub(crate) fn flatten_once(items: &[Value]) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::List(nested) => out.extend(nested.borrow().iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    out
}

fn list_flat(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("flat", &args, 0, Some(0))?;
    let items = recv_list(recv);
    let out = flatten_once(&items.borrow());
    Ok(Value::list(out))
}

fn list_fill(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("fill", &args, 1, Some(1))?;
    let items = recv_list(recv);
    let len = items.borrow().len();
    Ok(Value::list(vec![args[0].clone(); len]))
}

// ── Generators ────────────────────────────────────────────────────────

fn generator_next_fn(_: &mut Interpreter, recv: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("next", &args, 0, Some(0))?;
    match recv {
        Some(Value::Generator(state)) => crate::generator::resume(state),
        _ => Ok(Value::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_members_yield_values() {
        let length = host_member(&Value::text("héllo"), "length").unwrap();
        assert!(matches!(length, Value::Int(5)));
        let length = host_member(&Value::list(vec![Value::Int(1)]), "length").unwrap();
        assert!(matches!(length, Value::Int(1)));
    }

    #[test]
    fn operation_members_yield_bound_functions() {
        let upper = host_member(&Value::text("ab"), "upper").unwrap();
        assert!(upper.is_callable());
        assert!(host_member(&Value::text("ab"), "nonsense").is_none());
    }

    #[test]
    fn substring_uses_char_slices() {
        assert_eq!(substring("hello", Some(1), Some(3)), "el");
        assert_eq!(substring("hello", Some(-2), None), "lo");
        assert_eq!(substring("héllo", Some(0), Some(2)), "hé");
    }

    #[test]
    fn text_find_reports_char_index() {
        assert_eq!(text_find("héllo", "llo"), 2);
        assert_eq!(text_find("abc", "zz"), -1);
    }

    #[test]
    fn pad_behaviour() {
        assert_eq!(pad("7", 3, "0", true), "007");
        assert_eq!(pad("ab", 4, "-", false), "ab--");
        assert_eq!(pad("abcdef", 3, " ", true), "abcdef");
    }

    #[test]
    fn flatten_is_single_level() {
        let nested = vec![
            Value::Int(1),
            Value::list(vec![Value::Int(2), Value::list(vec![Value::Int(3)])]),
        ];
        let flat = flatten_once(&nested);
        assert_eq!(Value::list(flat).to_text(), "[1, 2, [3]]");
    }
}
