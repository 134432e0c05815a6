//! `math` module: constants, elementary functions, and random numbers.

use rand::Rng;

use crate::interp::Interpreter;
use crate::signal::Exec;
use crate::support::{arg_error, check_arity, int_arg, num_arg};
use crate::value::{Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    let mut map = super::functions(&[
        ("sqrt", math_sqrt),
        ("cbrt", math_cbrt),
        ("pow", math_pow),
        ("exp", math_exp),
        ("log", math_log),
        ("log10", math_log10),
        ("sin", math_sin),
        ("cos", math_cos),
        ("tan", math_tan),
        ("hypot", math_hypot),
        ("clamp", math_clamp),
        ("random", math_random),
        ("randint", math_randint),
    ]);
    map.insert_str("pi", Value::Float(std::f64::consts::PI));
    map.insert_str("e", Value::Float(std::f64::consts::E));
    map.insert_str("tau", Value::Float(std::f64::consts::TAU));
    map
}

fn math_sqrt(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("sqrt", &args, 1, Some(1))?;
    Ok(Value::Float(num_arg("sqrt", &args, 0)?.sqrt()))
}

fn math_cbrt(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("cbrt", &args, 1, Some(1))?;
    Ok(Value::Float(num_arg("cbrt", &args, 0)?.cbrt()))
}

fn math_pow(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("pow", &args, 2, Some(2))?;
    let base = num_arg("pow", &args, 0)?;
    let exponent = num_arg("pow", &args, 1)?;
    Ok(Value::Float(base.powf(exponent)))
}

fn math_exp(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("exp", &args, 1, Some(1))?;
    Ok(Value::Float(num_arg("exp", &args, 0)?.exp()))
}

fn math_log(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("log", &args, 1, Some(2))?;
    let value = num_arg("log", &args, 0)?;
    match args.get(1) {
        Some(_) => {
            let base = num_arg("log", &args, 1)?;
            Ok(Value::Float(value.log(base)))
        }
        None => Ok(Value::Float(value.ln())),
    }
}

fn math_log10(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("log10", &args, 1, Some(1))?;
    Ok(Value::Float(num_arg("log10", &args, 0)?.log10()))
}

fn math_sin(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("sin", &args, 1, Some(1))?;
    Ok(Value::Float(num_arg("sin", &args, 0)?.sin()))
}

fn math_cos(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("cos", &args, 1, Some(1))?;
    Ok(Value::Float(num_arg("cos", &args, 0)?.cos()))
}

fn math_tan(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("tan", &args, 1, Some(1))?;
    Ok(Value::Float(num_arg("tan", &args, 0)?.tan()))
}

fn math_hypot(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("hypot", &args, 2, Some(2))?;
    let x = num_arg("hypot", &args, 0)?;
    let y = num_arg("hypot", &args, 1)?;
    Ok(Value::Float(x.hypot(y)))
}

fn math_clamp(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("clamp", &args, 3, Some(3))?;
    let value = num_arg("clamp", &args, 0)?;
    let lo = num_arg("clamp", &args, 1)?;
    let hi = num_arg("clamp", &args, 2)?;
    if lo > hi {
        return Err(arg_error("clamp() lower bound exceeds upper bound"));
    }
    Ok(Value::Float(value.clamp(lo, hi)))
}

fn math_random(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("random", &args, 0, Some(0))?;
    Ok(Value::Float(rand::rng().random::<f64>()))
}

fn math_randint(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("randint", &args, 2, Some(2))?;
    let lo = int_arg("randint", &args, 0)?;
    let hi = int_arg("randint", &args, 1)?;
    if lo > hi {
        return Err(arg_error("randint() lower bound exceeds upper bound"));
    }
    Ok(Value::Int(rand::rng().random_range(lo..=hi)))
}
