//! Evaluation outcome type.
//!
//! Every evaluator method returns `Exec<T>`: the `Err` side carries either a
//! genuine runtime failure or one of the non-local control-flow signals.
//! Signals unwind via `?` until the construct that owns them catches them:
//! `Break`/`Continue` at the nearest loop, `Return` at the nearest call,
//! `Yield` at the nearest generator driver. `try`/`catch` only ever
//! intercepts the `Error` variant.

use rill_common::error::{RuntimeError, RuntimeErrorKind};
use rill_common::span::Span;

use crate::value::Value;

/// Non-value outcome of an evaluation step.
#[derive(Debug, Clone)]
pub enum Signal {
    /// A runtime failure; the only variant `catch` blocks see.
    Error(RuntimeError),
    /// `give` unwinding to the nearest function invocation.
    Return(Value),
    /// `stop` unwinding to the nearest loop.
    Break,
    /// `next` unwinding to the nearest loop iteration.
    Continue,
    /// `yield` unwinding to the nearest generator driver.
    Yield(Value),
}

pub type Exec<T> = Result<T, Signal>;

impl From<RuntimeError> for Signal {
    fn from(e: RuntimeError) -> Self {
        Signal::Error(e)
    }
}

/// Build an error signal of the given kind.
pub fn error(kind: RuntimeErrorKind, message: impl Into<String>) -> Signal {
    Signal::Error(RuntimeError::new(kind, message))
}

/// Build an error signal pinned to a span.
pub fn error_at(kind: RuntimeErrorKind, message: impl Into<String>, span: Span) -> Signal {
    Signal::Error(RuntimeError::new(kind, message).with_span(span))
}

/// Attach a span to an error signal that does not carry one yet; control
/// signals pass through untouched.
pub fn with_span(signal: Signal, span: Span) -> Signal {
    match signal {
        Signal::Error(e) => Signal::Error(e.with_span(span)),
        other => other,
    }
}
