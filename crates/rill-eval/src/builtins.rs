//! Built-in functions seeded into the global scope.
//!
//! These are plain host functions; the collection and text helpers mirror
//! the host method surfaces so both `upper(s)` and `s.upper()` work, and
//! the higher-order helpers (`map`, `filter`, `reduce`, ...) call back into
//! the evaluator to run user conduits.

use std::io::Write;

use crate::env::ScopeRef;
use crate::interp::Interpreter;
use crate::methods::{flatten_once, pad, split_text, substring, text_find};
use crate::ops;
use crate::signal::Exec;
use crate::support::{
    arg_error, callable_arg, check_arity, int_arg, list_arg, map_arg, num_arg, opt_int_arg,
    opt_text_arg, sort_values, text_arg,
};
use crate::value::{generic_iter, values_equal, HostFn, Value};

/// Install every builtin into the given (global) scope, immutably.
pub(crate) fn install(scope: &ScopeRef) {
    let entries: &[(&str, crate::value::HostFnPtr)] = &[
        ("print", builtin_print),
        ("input", builtin_input),
        ("len", builtin_len),
        ("type", builtin_type),
        ("range", builtin_range),
        ("map", builtin_map),
        ("filter", builtin_filter),
        ("reduce", builtin_reduce),
        ("sort", builtin_sort),
        ("reverse", builtin_reverse),
        ("keys", builtin_keys),
        ("values", builtin_values),
        ("entries", builtin_entries),
        ("split", builtin_split),
        ("join", builtin_join),
        ("now", builtin_now),
        ("sleep", builtin_sleep),
        ("str", builtin_str),
        ("num", builtin_num),
        ("int", builtin_int),
        ("float", builtin_float),
        ("bool", builtin_bool),
        ("list", builtin_list),
        ("sum", builtin_sum),
        ("min", builtin_min),
        ("max", builtin_max),
        ("abs", builtin_abs),
        ("round", builtin_round),
        ("floor", builtin_floor),
        ("ceil", builtin_ceil),
        ("push", builtin_push),
        ("pop", builtin_pop),
        ("shift", builtin_shift),
        ("unshift", builtin_unshift),
        ("slice", builtin_slice),
        ("indexOf", builtin_index_of),
        ("includes", builtin_includes),
        ("find", builtin_find),
        ("every", builtin_every),
        ("some", builtin_some),
        ("concat", builtin_concat),
        ("flat", builtin_flat),
        ("fill", builtin_fill),
        ("upper", builtin_upper),
        ("lower", builtin_lower),
        ("trim", builtin_trim),
        ("replace", builtin_replace),
        ("startsWith", builtin_starts_with),
        ("endsWith", builtin_ends_with),
        ("charAt", builtin_char_at),
        ("substring", builtin_substring),
        ("repeat", builtin_repeat),
        ("padStart", builtin_pad_start),
        ("padEnd", builtin_pad_end),
    ];

    let mut scope = scope.borrow_mut();
    for (name, func) in entries {
        scope.define(*name, HostFn::new(name, *func), false, false, None);
    }
}

/// Seed the language constants into a fresh global scope.
pub(crate) fn install_constants(scope: &ScopeRef) {
    let mut scope = scope.borrow_mut();
    scope.define("yes", Value::Bool(true), false, true, None);
    scope.define("no", Value::Bool(false), false, true, None);
    scope.define("none", Value::None, false, true, None);
}

fn iterable(name: &str, args: &[Value], index: usize) -> Exec<Vec<Value>> {
    match args.get(index) {
        Some(Value::Generator(state)) => crate::generator::drain(state),
        Some(value) => generic_iter(value).ok_or_else(|| {
            arg_error(format!(
                "{name}() cannot iterate over {}",
                value.type_name()
            ))
        }),
        None => Err(arg_error(format!(
            "{name}() is missing an iterable argument"
        ))),
    }
}

// ── Console and conversions ───────────────────────────────────────────

fn builtin_print(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    let rendered: Vec<String> = args.iter().map(|v| v.to_text()).collect();
    println!("{}", rendered.join(" "));
    Ok(Value::None)
}

fn builtin_input(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("input", &args, 0, Some(1))?;
    if let Some(prompt) = args.first() {
        print!("{}", prompt.to_text());
        let _ = std::io::stdout().flush();
    }
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| arg_error(format!("input() failed: {e}")))?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Value::text(line))
}

fn builtin_len(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("len", &args, 1, Some(1))?;
    let len = match &args[0] {
        Value::None => 0,
        Value::Text(s) => s.chars().count() as i64,
        Value::List(items) => items.borrow().len() as i64,
        Value::Map(map) => map.borrow().len() as i64,
        Value::Range(a, b) => (b - a + 1).max(0),
        other => {
            return Err(arg_error(format!(
                "len() is not defined for {}",
                other.type_name()
            )))
        }
    };
    Ok(Value::Int(len))
}

fn builtin_type(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("type", &args, 1, Some(1))?;
    Ok(Value::text(args[0].type_name()))
}

fn builtin_str(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("str", &args, 1, Some(1))?;
    Ok(Value::text(args[0].to_text()))
}

/// Loose numeric conversion: numbers pass through, text parses (0 on
/// failure), booleans become 0/1, anything else is 0.
pub(crate) fn loose_num(value: &Value) -> Value {
    match value {
        Value::Int(_) | Value::Float(_) => value.clone(),
        Value::Text(s) => {
            if s.contains('.') {
                Value::Float(s.trim().parse().unwrap_or(0.0))
            } else {
                Value::Int(s.trim().parse().unwrap_or(0))
            }
        }
        Value::Bool(b) => Value::Int(i64::from(*b)),
        _ => Value::Int(0),
    }
}

fn builtin_num(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("num", &args, 1, Some(1))?;
    Ok(loose_num(&args[0]))
}

fn builtin_int(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("int", &args, 1, Some(1))?;
    Ok(match loose_num(&args[0]) {
        Value::Float(f) => Value::Int(f as i64),
        other => other,
    })
}

fn builtin_float(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("float", &args, 1, Some(1))?;
    Ok(match loose_num(&args[0]) {
        Value::Int(i) => Value::Float(i as f64),
        other => other,
    })
}

fn builtin_bool(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("bool", &args, 1, Some(1))?;
    Ok(Value::Bool(args[0].is_truthy()))
}

fn builtin_list(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("list", &args, 1, Some(1))?;
    let value = &args[0];
    if let Value::Map(map) = value {
        let pairs = map
            .borrow()
            .iter()
            .map(|(k, v)| Value::list(vec![k.clone(), v.clone()]))
            .collect();
        return Ok(Value::list(pairs));
    }
    if let Value::Generator(state) = value {
        return Ok(Value::list(crate::generator::drain(state)?));
    }
    Ok(match generic_iter(value) {
        Some(items) => Value::list(items),
        None => Value::list(vec![value.clone()]),
    })
}

// ── Collections ───────────────────────────────────────────────────────

fn builtin_range(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("range", &args, 1, Some(3))?;
    let first = int_arg("range", &args, 0)?;
    let (start, end) = match opt_int_arg("range", &args, 1)? {
        Some(end) => (first, end),
        None => (0, first),
    };
    let step = opt_int_arg("range", &args, 2)?.unwrap_or(1);
    if step == 0 {
        return Err(arg_error("range() step must not be zero"));
    }
    let mut items = Vec::new();
    let mut cursor = start;
    while (step > 0 && cursor < end) || (step < 0 && cursor > end) {
        items.push(Value::Int(cursor));
        cursor += step;
    }
    Ok(Value::list(items))
}

fn builtin_map(interp: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("map", &args, 2, Some(2))?;
    let func = callable_arg("map", &args, 0)?;
    let items = iterable("map", &args, 1)?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(interp.call_host(func.clone(), vec![item])?);
    }
    Ok(Value::list(out))
}

fn builtin_filter(interp: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("filter", &args, 2, Some(2))?;
    let func = callable_arg("filter", &args, 0)?;
    let items = iterable("filter", &args, 1)?;
    let mut out = Vec::new();
    for item in items {
        if interp.call_host(func.clone(), vec![item.clone()])?.is_truthy() {
            out.push(item);
        }
    }
    Ok(Value::list(out))
}

fn builtin_reduce(interp: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("reduce", &args, 2, Some(3))?;
    let func = callable_arg("reduce", &args, 0)?;
    let items = iterable("reduce", &args, 1)?;
    let mut iter = items.into_iter();
    let mut acc = match args.get(2) {
        Some(initial) if !matches!(initial, Value::None) => initial.clone(),
        _ => iter
            .next()
            .ok_or_else(|| arg_error("reduce() of empty sequence with no initial value"))?,
    };
    for item in iter {
        acc = interp.call_host(func.clone(), vec![acc, item])?;
    }
    Ok(acc)
}

fn builtin_sort(interp: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("sort", &args, 1, Some(3))?;
    let items = iterable("sort", &args, 0)?;
    let reverse = args.get(2).map(|v| v.is_truthy()).unwrap_or(false);

    let mut sorted = match args.get(1) {
        Some(key) if key.is_callable() => {
            // Decorate with computed keys, sort on the keys alone, strip.
            let mut decorated = Vec::with_capacity(items.len());
            for item in items {
                let k = interp.call_host(key.clone(), vec![item.clone()])?;
                decorated.push((k, item));
            }
            let mut failure = None;
            decorated.sort_by(|(a, _), (b, _)| match ops::order(a, b) {
                Ok(ordering) => ordering,
                Err(signal) => {
                    if failure.is_none() {
                        failure = Some(signal);
                    }
                    std::cmp::Ordering::Equal
                }
            });
            if let Some(signal) = failure {
                return Err(signal);
            }
            decorated.into_iter().map(|(_, item)| item).collect()
        }
        _ => sort_values(items)?,
    };

    if reverse {
        sorted.reverse();
    }
    Ok(Value::list(sorted))
}

fn builtin_reverse(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("reverse", &args, 1, Some(1))?;
    if let Value::Text(s) = &args[0] {
        return Ok(Value::text(s.chars().rev().collect::<String>()));
    }
    let mut items = iterable("reverse", &args, 0)?;
    items.reverse();
    Ok(Value::list(items))
}

fn builtin_keys(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("keys", &args, 1, Some(1))?;
    let map = map_arg("keys", &args, 0)?;
    let keys = map.borrow().iter().map(|(k, _)| k.clone()).collect();
    Ok(Value::list(keys))
}

fn builtin_values(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("values", &args, 1, Some(1))?;
    let map = map_arg("values", &args, 0)?;
    let values = map.borrow().iter().map(|(_, v)| v.clone()).collect();
    Ok(Value::list(values))
}

fn builtin_entries(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("entries", &args, 1, Some(1))?;
    let map = map_arg("entries", &args, 0)?;
    let entries = map
        .borrow()
        .iter()
        .map(|(k, v)| Value::list(vec![k.clone(), v.clone()]))
        .collect();
    Ok(Value::list(entries))
}

fn builtin_sum(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("sum", &args, 1, Some(1))?;
    let items = iterable("sum", &args, 0)?;
    let mut acc = Value::Int(0);
    for item in items {
        acc = ops::binary(rill_parser::ast::BinOp::Add, acc, item)?;
    }
    Ok(acc)
}

fn min_max(args: Vec<Value>, want_max: bool, name: &str) -> Exec<Value> {
    let candidates = if args.len() == 1 {
        iterable(name, &args, 0)?
    } else {
        args
    };
    let mut iter = candidates.into_iter();
    let mut best = iter
        .next()
        .ok_or_else(|| arg_error(format!("{name}() of an empty sequence")))?;
    for candidate in iter {
        let ordering = ops::order(&candidate, &best)?;
        let better = if want_max {
            ordering == std::cmp::Ordering::Greater
        } else {
            ordering == std::cmp::Ordering::Less
        };
        if better {
            best = candidate;
        }
    }
    Ok(best)
}

fn builtin_min(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("min", &args, 1, None)?;
    min_max(args, false, "min")
}

fn builtin_max(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("max", &args, 1, None)?;
    min_max(args, true, "max")
}

// ── Numbers ───────────────────────────────────────────────────────────

fn builtin_abs(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("abs", &args, 1, Some(1))?;
    match &args[0] {
        Value::Int(i) => Ok(Value::Int(i.abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(arg_error(format!(
            "abs() expects a number, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_round(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("round", &args, 1, Some(2))?;
    let value = num_arg("round", &args, 0)?;
    let digits = opt_int_arg("round", &args, 1)?.unwrap_or(0);
    if digits == 0 {
        return Ok(Value::Int(value.round() as i64));
    }
    let factor = 10f64.powi(digits as i32);
    Ok(Value::Float((value * factor).round() / factor))
}

fn builtin_floor(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("floor", &args, 1, Some(1))?;
    Ok(Value::Int(num_arg("floor", &args, 0)?.floor() as i64))
}

fn builtin_ceil(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("ceil", &args, 1, Some(1))?;
    Ok(Value::Int(num_arg("ceil", &args, 0)?.ceil() as i64))
}

// ── Time ──────────────────────────────────────────────────────────────

fn builtin_now(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("now", &args, 0, Some(0))?;
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    Ok(Value::Float(secs))
}

fn builtin_sleep(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("sleep", &args, 1, Some(1))?;
    let secs = num_arg("sleep", &args, 0)?;
    if secs > 0.0 {
        std::thread::sleep(std::time::Duration::from_secs_f64(secs));
    }
    Ok(Value::None)
}

// ── Higher-order sequence helpers ─────────────────────────────────────

fn builtin_find(interp: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("find", &args, 2, Some(2))?;
    let items = iterable("find", &args, 0)?;
    let func = callable_arg("find", &args, 1)?;
    for item in items {
        if interp.call_host(func.clone(), vec![item.clone()])?.is_truthy() {
            return Ok(item);
        }
    }
    Ok(Value::None)
}

fn builtin_every(interp: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("every", &args, 2, Some(2))?;
    let items = iterable("every", &args, 0)?;
    let func = callable_arg("every", &args, 1)?;
    for item in items {
        if !interp.call_host(func.clone(), vec![item])?.is_truthy() {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn builtin_some(interp: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("some", &args, 2, Some(2))?;
    let items = iterable("some", &args, 0)?;
    let func = callable_arg("some", &args, 1)?;
    for item in items {
        if interp.call_host(func.clone(), vec![item])?.is_truthy() {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

// ── Sequence helpers (free-function forms) ────────────────────────────

fn builtin_push(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("push", &args, 2, Some(2))?;
    let items = list_arg("push", &args, 0)?;
    items.borrow_mut().push(args[1].clone());
    Ok(Value::List(items))
}

fn builtin_pop(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("pop", &args, 1, Some(1))?;
    let items = list_arg("pop", &args, 0)?;
    let popped = items.borrow_mut().pop();
    Ok(popped.unwrap_or(Value::None))
}

fn builtin_shift(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("shift", &args, 1, Some(1))?;
    let items = list_arg("shift", &args, 0)?;
    let mut items = items.borrow_mut();
    if items.is_empty() {
        Ok(Value::None)
    } else {
        Ok(items.remove(0))
    }
}

fn builtin_unshift(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("unshift", &args, 2, Some(2))?;
    let items = list_arg("unshift", &args, 0)?;
    items.borrow_mut().insert(0, args[1].clone());
    Ok(Value::List(items))
}

fn builtin_slice(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("slice", &args, 1, Some(3))?;
    let start = opt_int_arg("slice", &args, 1)?;
    let end = opt_int_arg("slice", &args, 2)?;
    match &args[0] {
        Value::Text(s) => Ok(Value::text(substring(s, start, end))),
        Value::List(items) => {
            let items = items.borrow();
            let (lo, hi) = crate::support::slice_bounds(start, end, items.len());
            Ok(Value::list(items[lo..hi].to_vec()))
        }
        other => Err(arg_error(format!(
            "slice() expects text or a list, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_index_of(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("indexOf", &args, 2, Some(2))?;
    match (&args[0], &args[1]) {
        (Value::Text(s), Value::Text(needle)) => Ok(Value::Int(text_find(s, needle))),
        (Value::List(items), needle) => {
            let index = items
                .borrow()
                .iter()
                .position(|v| values_equal(v, needle))
                .map(|i| i as i64)
                .unwrap_or(-1);
            Ok(Value::Int(index))
        }
        (other, _) => Err(arg_error(format!(
            "indexOf() expects text or a list, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_includes(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("includes", &args, 2, Some(2))?;
    Ok(Value::Bool(ops::contains(&args[1], &args[0])?))
}

fn builtin_concat(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    let mut out = Vec::new();
    for arg in &args {
        match arg {
            Value::List(items) => out.extend(items.borrow().iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    Ok(Value::list(out))
}

fn flatten_depth(items: &[Value], depth: i64) -> Vec<Value> {
    if depth <= 0 {
        return items.to_vec();
    }
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::List(nested) => {
                out.extend(flatten_depth(&nested.borrow(), depth - 1));
            }
            other => out.push(other.clone()),
        }
    }
    out
}

fn builtin_flat(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("flat", &args, 1, Some(2))?;
    let items = list_arg("flat", &args, 0)?;
    let depth = opt_int_arg("flat", &args, 1)?.unwrap_or(1);
    let out = if depth == 1 {
        flatten_once(&items.borrow())
    } else {
        flatten_depth(&items.borrow(), depth)
    };
    Ok(Value::list(out))
}

fn builtin_fill(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("fill", &args, 2, Some(4))?;
    let items = list_arg("fill", &args, 0)?;
    let len = items.borrow().len();
    let start = opt_int_arg("fill", &args, 2)?.unwrap_or(0).max(0) as usize;
    let end = opt_int_arg("fill", &args, 3)?
        .map(|e| e.max(0) as usize)
        .unwrap_or(len);
    let mut items_mut = items.borrow_mut();
    for i in start..end.min(len) {
        items_mut[i] = args[1].clone();
    }
    drop(items_mut);
    Ok(Value::List(items))
}

// ── Text helpers (free-function forms) ────────────────────────────────

fn builtin_split(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("split", &args, 1, Some(2))?;
    let s = text_arg("split", &args, 0)?;
    let sep = opt_text_arg("split", &args, 1)?;
    Ok(split_text(&s, sep.as_deref()))
}

fn builtin_join(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("join", &args, 1, Some(2))?;
    let items = iterable("join", &args, 0)?;
    let sep = opt_text_arg("join", &args, 1)?.unwrap_or_else(|| "".into());
    let rendered: Vec<String> = items.iter().map(|v| v.to_text()).collect();
    Ok(Value::text(rendered.join(&sep)))
}

fn builtin_upper(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("upper", &args, 1, Some(1))?;
    Ok(Value::text(text_arg("upper", &args, 0)?.to_uppercase()))
}

fn builtin_lower(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("lower", &args, 1, Some(1))?;
    Ok(Value::text(text_arg("lower", &args, 0)?.to_lowercase()))
}

fn builtin_trim(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("trim", &args, 1, Some(1))?;
    Ok(Value::text(text_arg("trim", &args, 0)?.trim()))
}

fn builtin_replace(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("replace", &args, 3, Some(3))?;
    let s = text_arg("replace", &args, 0)?;
    let old = text_arg("replace", &args, 1)?;
    let new = text_arg("replace", &args, 2)?;
    Ok(Value::text(s.replace(&*old, &new)))
}

fn builtin_starts_with(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("startsWith", &args, 2, Some(2))?;
    let s = text_arg("startsWith", &args, 0)?;
    let prefix = text_arg("startsWith", &args, 1)?;
    Ok(Value::Bool(s.starts_with(&*prefix)))
}

fn builtin_ends_with(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("endsWith", &args, 2, Some(2))?;
    let s = text_arg("endsWith", &args, 0)?;
    let suffix = text_arg("endsWith", &args, 1)?;
    Ok(Value::Bool(s.ends_with(&*suffix)))
}

fn builtin_char_at(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("charAt", &args, 2, Some(2))?;
    let s = text_arg("charAt", &args, 0)?;
    let index = int_arg("charAt", &args, 1)?;
    let ch = usize::try_from(index).ok().and_then(|i| s.chars().nth(i));
    Ok(Value::text(ch.map(|c| c.to_string()).unwrap_or_default()))
}

fn builtin_substring(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("substring", &args, 2, Some(3))?;
    let s = text_arg("substring", &args, 0)?;
    let start = opt_int_arg("substring", &args, 1)?;
    let end = opt_int_arg("substring", &args, 2)?;
    Ok(Value::text(substring(&s, start, end)))
}

fn builtin_repeat(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("repeat", &args, 2, Some(2))?;
    let s = text_arg("repeat", &args, 0)?;
    let count = int_arg("repeat", &args, 1)?;
    Ok(Value::text(s.repeat(count.max(0) as usize)))
}

fn builtin_pad_start(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("padStart", &args, 2, Some(3))?;
    let s = text_arg("padStart", &args, 0)?;
    let width = int_arg("padStart", &args, 1)?;
    let fill = opt_text_arg("padStart", &args, 2)?.unwrap_or_else(|| " ".into());
    Ok(Value::text(pad(&s, width, &fill, true)))
}

fn builtin_pad_end(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("padEnd", &args, 2, Some(3))?;
    let s = text_arg("padEnd", &args, 0)?;
    let width = int_arg("padEnd", &args, 1)?;
    let fill = opt_text_arg("padEnd", &args, 2)?.unwrap_or_else(|| " ".into());
    Ok(Value::text(pad(&s, width, &fill, false)))
}

