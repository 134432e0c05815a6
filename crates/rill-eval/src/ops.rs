//! Binary, unary, comparison, and membership operators.
//!
//! Numeric arithmetic promotes to floating point on a mixed pair or on
//! integer overflow. `+` concatenates when either operand is text and when
//! both are sequences; `*` repeats text and sequences by an integer count.
//! Division always yields floating point and fails on a zero divisor.

use std::cmp::Ordering;

use rill_common::error::RuntimeErrorKind;
use rill_parser::ast::{BinOp, CmpOp, UnOp};

use crate::signal::{error, Exec};
use crate::value::{values_equal, Value};

pub(crate) fn binary(op: BinOp, lhs: Value, rhs: Value) -> Exec<Value> {
    match op {
        BinOp::Add => add(lhs, rhs),
        BinOp::Sub => match (number(&lhs), number(&rhs)) {
            (Some(a), Some(b)) => Ok(numeric_sub(a, b)),
            _ => Err(type_error("-", &lhs, &rhs)),
        },
        BinOp::Mul => mul(lhs, rhs),
        BinOp::Div => {
            let (Some(a), Some(b)) = (as_f64(&lhs), as_f64(&rhs)) else {
                return Err(type_error("/", &lhs, &rhs));
            };
            if b == 0.0 {
                return Err(error(RuntimeErrorKind::DivZero, "Division by zero"));
            }
            Ok(Value::Float(a / b))
        }
        BinOp::Rem => rem(lhs, rhs),
        BinOp::Pow => pow(lhs, rhs),
        BinOp::Eq => Ok(Value::Bool(values_equal(&lhs, &rhs))),
        BinOp::Ne => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        BinOp::Lt => Ok(Value::Bool(order(&lhs, &rhs)? == Ordering::Less)),
        BinOp::Gt => Ok(Value::Bool(order(&lhs, &rhs)? == Ordering::Greater)),
        BinOp::Le => Ok(Value::Bool(order(&lhs, &rhs)? != Ordering::Greater)),
        BinOp::Ge => Ok(Value::Bool(order(&lhs, &rhs)? != Ordering::Less)),
        BinOp::In => Ok(Value::Bool(contains(&lhs, &rhs)?)),
    }
}

pub(crate) fn unary(op: UnOp, value: Value) -> Exec<Value> {
    match op {
        UnOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnOp::Neg => match value {
            Value::Int(i) => Ok(Value::Int(-i)),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(error(
                RuntimeErrorKind::Type,
                format!("Cannot negate {}", other.type_name()),
            )),
        },
        UnOp::Pos => match value {
            Value::Int(_) | Value::Float(_) => Ok(value),
            other => Err(error(
                RuntimeErrorKind::Type,
                format!("Cannot apply unary '+' to {}", other.type_name()),
            )),
        },
    }
}

pub(crate) fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> Exec<bool> {
    match op {
        CmpOp::Lt => Ok(order(lhs, rhs)? == Ordering::Less),
        CmpOp::Gt => Ok(order(lhs, rhs)? == Ordering::Greater),
        CmpOp::Le => Ok(order(lhs, rhs)? != Ordering::Greater),
        CmpOp::Ge => Ok(order(lhs, rhs)? != Ordering::Less),
        CmpOp::In => contains(lhs, rhs),
    }
}

// ── Arithmetic ────────────────────────────────────────────────────────

/// Numeric pair, preserving int-ness when both sides are integers.
enum Num {
    Int(i64),
    Float(f64),
}

fn number(value: &Value) -> Option<Num> {
    match value {
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn add(lhs: Value, rhs: Value) -> Exec<Value> {
    // Text on either side concatenates, promoting the other operand.
    if matches!(lhs, Value::Text(_)) || matches!(rhs, Value::Text(_)) {
        return Ok(Value::text(format!("{}{}", lhs.to_text(), rhs.to_text())));
    }
    if let (Value::List(a), Value::List(b)) = (&lhs, &rhs) {
        let mut items = a.borrow().clone();
        items.extend(b.borrow().iter().cloned());
        return Ok(Value::list(items));
    }
    match (number(&lhs), number(&rhs)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(a
            .checked_add(b)
            .map(Value::Int)
            .unwrap_or(Value::Float(a as f64 + b as f64))),
        (Some(a), Some(b)) => Ok(Value::Float(to_f64(a) + to_f64(b))),
        _ => Err(type_error("+", &lhs, &rhs)),
    }
}

fn numeric_sub(a: Num, b: Num) -> Value {
    match (a, b) {
        (Num::Int(a), Num::Int(b)) => a
            .checked_sub(b)
            .map(Value::Int)
            .unwrap_or(Value::Float(a as f64 - b as f64)),
        (a, b) => Value::Float(to_f64(a) - to_f64(b)),
    }
}

fn mul(lhs: Value, rhs: Value) -> Exec<Value> {
    match (&lhs, &rhs) {
        (Value::Text(s), Value::Int(n)) | (Value::Int(n), Value::Text(s)) => {
            Ok(Value::text(s.repeat((*n).max(0) as usize)))
        }
        (Value::List(items), Value::Int(n)) | (Value::Int(n), Value::List(items)) => {
            let items = items.borrow();
            let mut out = Vec::with_capacity(items.len() * (*n).max(0) as usize);
            for _ in 0..(*n).max(0) {
                out.extend(items.iter().cloned());
            }
            Ok(Value::list(out))
        }
        _ => match (number(&lhs), number(&rhs)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(a
                .checked_mul(b)
                .map(Value::Int)
                .unwrap_or(Value::Float(a as f64 * b as f64))),
            (Some(a), Some(b)) => Ok(Value::Float(to_f64(a) * to_f64(b))),
            _ => Err(type_error("*", &lhs, &rhs)),
        },
    }
}

/// Remainder with the sign of the divisor.
fn rem(lhs: Value, rhs: Value) -> Exec<Value> {
    match (number(&lhs), number(&rhs)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => {
            if b == 0 {
                return Err(error(RuntimeErrorKind::DivZero, "Division by zero"));
            }
            Ok(Value::Int(((a % b) + b) % b))
        }
        (Some(a), Some(b)) => {
            let (a, b) = (to_f64(a), to_f64(b));
            if b == 0.0 {
                return Err(error(RuntimeErrorKind::DivZero, "Division by zero"));
            }
            Ok(Value::Float(a - b * (a / b).floor()))
        }
        _ => Err(type_error("%", &lhs, &rhs)),
    }
}

fn pow(lhs: Value, rhs: Value) -> Exec<Value> {
    match (number(&lhs), number(&rhs)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) if b >= 0 => {
            let result = u32::try_from(b).ok().and_then(|e| a.checked_pow(e));
            Ok(result
                .map(Value::Int)
                .unwrap_or(Value::Float((a as f64).powf(b as f64))))
        }
        (Some(a), Some(b)) => Ok(Value::Float(to_f64(a).powf(to_f64(b)))),
        _ => Err(type_error("**", &lhs, &rhs)),
    }
}

fn to_f64(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Float(f) => f,
    }
}

// ── Ordering and membership ───────────────────────────────────────────

pub(crate) fn order(lhs: &Value, rhs: &Value) -> Exec<Ordering> {
    if let (Some(a), Some(b)) = (as_f64(lhs), as_f64(rhs)) {
        return a.partial_cmp(&b).ok_or_else(|| {
            error(RuntimeErrorKind::Type, "Cannot order NaN values")
        });
    }
    if let (Value::Text(a), Value::Text(b)) = (lhs, rhs) {
        return Ok(a.cmp(b));
    }
    // Sequences order lexicographically, element by element.
    if let (Value::List(a), Value::List(b)) = (lhs, rhs) {
        let (a, b) = (a.borrow(), b.borrow());
        for (x, y) in a.iter().zip(b.iter()) {
            match order(x, y)? {
                Ordering::Equal => continue,
                other => return Ok(other),
            }
        }
        return Ok(a.len().cmp(&b.len()));
    }
    Err(error(
        RuntimeErrorKind::Type,
        format!(
            "Cannot compare {} and {}",
            lhs.type_name(),
            rhs.type_name()
        ),
    ))
}

/// `item in container` membership test.
pub(crate) fn contains(item: &Value, container: &Value) -> Exec<bool> {
    match container {
        Value::List(items) => Ok(items.borrow().iter().any(|v| values_equal(v, item))),
        Value::Text(s) => match item {
            Value::Text(sub) => Ok(s.contains(&**sub)),
            other => Err(error(
                RuntimeErrorKind::Type,
                format!("Cannot search text for {}", other.type_name()),
            )),
        },
        Value::Map(map) => Ok(map.borrow().contains(item)),
        Value::Range(start, end) => Ok(as_f64(item)
            .map(|v| *start as f64 <= v && v <= *end as f64)
            .unwrap_or(false)),
        other => Err(error(
            RuntimeErrorKind::Type,
            format!("Cannot test membership in {}", other.type_name()),
        )),
    }
}

fn type_error(op: &str, lhs: &Value, rhs: &Value) -> crate::signal::Signal {
    error(
        RuntimeErrorKind::Type,
        format!(
            "Cannot apply '{op}' to {} and {}",
            lhs.type_name(),
            rhs.type_name()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(op: BinOp, a: Value, b: Value) -> Value {
        binary(op, a, b).expect("operation succeeds")
    }

    #[test]
    fn arithmetic_keeps_ints_where_possible() {
        assert!(matches!(
            bin(BinOp::Add, Value::Int(2), Value::Int(3)),
            Value::Int(5)
        ));
        assert!(matches!(
            bin(BinOp::Mul, Value::Int(4), Value::Float(0.5)),
            Value::Float(f) if f == 2.0
        ));
    }

    #[test]
    fn division_is_true_division() {
        assert!(matches!(
            bin(BinOp::Div, Value::Int(5), Value::Int(2)),
            Value::Float(f) if f == 2.5
        ));
    }

    #[test]
    fn division_by_zero_fails() {
        let err = binary(BinOp::Div, Value::Int(1), Value::Int(0)).unwrap_err();
        let crate::signal::Signal::Error(e) = err else {
            panic!("expected error signal");
        };
        assert_eq!(e.kind, RuntimeErrorKind::DivZero);
    }

    #[test]
    fn remainder_follows_divisor_sign() {
        assert!(matches!(
            bin(BinOp::Rem, Value::Int(-7), Value::Int(3)),
            Value::Int(2)
        ));
        assert!(matches!(
            bin(BinOp::Rem, Value::Int(7), Value::Int(-3)),
            Value::Int(-2)
        ));
    }

    #[test]
    fn text_concatenation_promotes() {
        let v = bin(BinOp::Add, Value::text("n="), Value::Int(3));
        assert_eq!(v.to_text(), "n=3");
        let v = bin(BinOp::Add, Value::Int(3), Value::text("!"));
        assert_eq!(v.to_text(), "3!");
    }

    #[test]
    fn sequence_concat_and_repeat() {
        let v = bin(
            BinOp::Add,
            Value::list(vec![Value::Int(1)]),
            Value::list(vec![Value::Int(2)]),
        );
        assert_eq!(v.to_text(), "[1, 2]");
        let v = bin(BinOp::Mul, Value::text("ab"), Value::Int(3));
        assert_eq!(v.to_text(), "ababab");
        let v = bin(BinOp::Mul, Value::list(vec![Value::Int(0)]), Value::Int(2));
        assert_eq!(v.to_text(), "[0, 0]");
    }

    #[test]
    fn power_is_exact_for_small_ints() {
        assert!(matches!(
            bin(BinOp::Pow, Value::Int(2), Value::Int(10)),
            Value::Int(1024)
        ));
        assert!(matches!(
            bin(BinOp::Pow, Value::Int(2), Value::Int(-1)),
            Value::Float(f) if f == 0.5
        ));
    }

    #[test]
    fn membership() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert!(contains(&Value::Int(2), &list).unwrap());
        assert!(!contains(&Value::Int(9), &list).unwrap());
        assert!(contains(&Value::text("ell"), &Value::text("hello")).unwrap());
        assert!(contains(&Value::Int(3), &Value::Range(1, 5)).unwrap());
    }

    #[test]
    fn mixed_type_arithmetic_is_an_error() {
        assert!(binary(BinOp::Sub, Value::text("a"), Value::Int(1)).is_err());
        assert!(binary(BinOp::Lt, Value::Int(1), Value::map(Default::default())).is_err());
    }
}
