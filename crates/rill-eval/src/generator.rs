//! Resumable generator driver.
//!
//! Calling a generator function packages its body as a stackful coroutine;
//! nothing runs until the first request. Each request (`next()` or one
//! iteration step) resumes evaluation until the next `yield` suspends the
//! body or it exits normally; an exhausted generator keeps answering none.
//!
//! `yield` reaches its driver through a thread-local registry of the
//! coroutines whose stacks are currently executing, innermost last. A
//! yield raised anywhere under a generator's stack therefore suspends that
//! generator, which is exactly the signal discipline: the nearest
//! enclosing driver catches it. An entry is removed for the duration of a
//! suspension, so the top of the registry always belongs to the stack
//! that is actually running.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use corosensei::{Coroutine, CoroutineResult, Yielder};

use rill_common::error::{RuntimeError, RuntimeErrorKind};

use crate::env::ScopeRef;
use crate::interp::Interpreter;
use crate::signal::{Exec, Signal};
use crate::value::{Function, Value};

/// Outcome of a finished body: `None` for a clean exit (including an
/// explicit `give`), or the failure to surface at the pending request.
type BodyOutcome = Option<RuntimeError>;

/// Producer state behind a generator value: the suspended coroutine plus
/// an exhaustion flag.
pub struct GeneratorState {
    coroutine: Coroutine<(), Value, BodyOutcome>,
    done: bool,
}

thread_local! {
    /// Yielders of the generator coroutines whose stacks are currently
    /// running, innermost last.
    static RUNNING: RefCell<Vec<*const Yielder<(), Value>>> = RefCell::new(Vec::new());
}

/// Package a generator call into a suspended coroutine. The bound
/// parameter scope is prepared by the caller; the body evaluates in a
/// dedicated interpreter over that scope chain once resumed.
pub(crate) fn spawn(
    func: Rc<Function>,
    env: ScopeRef,
    module_base: Option<PathBuf>,
) -> GeneratorState {
    let coroutine = Coroutine::new(move |yielder: &Yielder<(), Value>, _input: ()| {
        let ptr: *const Yielder<(), Value> = yielder;
        RUNNING.with(|stack| stack.borrow_mut().push(ptr));

        let mut interp = Interpreter::for_generator(env, module_base);
        let outcome = interp.exec_block(&func.decl.body);

        RUNNING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.last() == Some(&ptr) {
                stack.pop();
            }
        });

        match outcome {
            Ok(_) | Err(Signal::Return(_)) => None,
            Err(Signal::Error(error)) => Some(error),
            Err(Signal::Break) => Some(RuntimeError::new(
                RuntimeErrorKind::Runtime,
                "'stop' outside of a loop",
            )),
            Err(Signal::Continue) => Some(RuntimeError::new(
                RuntimeErrorKind::Runtime,
                "'next' outside of a loop",
            )),
            // Unreachable while this driver is registered, but a body
            // outcome must still be total.
            Err(Signal::Yield(_)) => Some(RuntimeError::new(
                RuntimeErrorKind::Runtime,
                "'yield' outside of a generator",
            )),
        }
    });

    GeneratorState {
        coroutine,
        done: false,
    }
}

/// Resume evaluation until the next yield or normal exit; none once the
/// body has exited. A failure inside the body surfaces at the request
/// that reaches it.
pub(crate) fn resume(state: &Rc<RefCell<GeneratorState>>) -> Exec<Value> {
    let mut state = state.borrow_mut();
    if state.done {
        return Ok(Value::None);
    }
    match state.coroutine.resume(()) {
        CoroutineResult::Yield(value) => Ok(value),
        CoroutineResult::Return(None) => {
            state.done = true;
            Ok(Value::None)
        }
        CoroutineResult::Return(Some(error)) => {
            state.done = true;
            Err(Signal::Error(error))
        }
    }
}

/// Whether the body has run to completion.
pub(crate) fn is_done(state: &Rc<RefCell<GeneratorState>>) -> bool {
    state.borrow().done
}

/// Drive the generator to exhaustion, collecting every remaining value.
/// Iteration and spreads go through here; an infinite generator makes
/// this loop forever, as iterating one must.
pub(crate) fn drain(state: &Rc<RefCell<GeneratorState>>) -> Exec<Vec<Value>> {
    let mut out = Vec::new();
    loop {
        let value = resume(state)?;
        if is_done(state) {
            return Ok(out);
        }
        out.push(value);
    }
}

/// Suspend the innermost running generator with a yielded value. Hands
/// the value back when no generator is driving the current stack, so the
/// caller can raise the yield signal instead.
pub(crate) fn try_suspend(value: Value) -> Result<(), Value> {
    let top = RUNNING.with(|stack| stack.borrow().last().copied());
    let Some(ptr) = top else {
        return Err(value);
    };

    // The entry comes off the registry while this coroutine is suspended,
    // so a yield on the resumer's stack reaches its own driver.
    RUNNING.with(|stack| {
        stack.borrow_mut().pop();
    });

    // SAFETY: `ptr` was pushed by the coroutine whose stack is executing
    // right now, so the yielder it points to is live; it stays live
    // across the suspension because `suspend` only returns once that same
    // coroutine is resumed again.
    unsafe {
        (*ptr).suspend(value);
    }

    RUNNING.with(|stack| stack.borrow_mut().push(ptr));
    Ok(())
}
