// Rill evaluator -- runtime values, scope chain, and the tree-walking
// interpreter, plus the builtin table and standard-library registry.

mod builtins;
pub mod env;
mod generator;
pub mod interp;
mod methods;
mod modules;
mod ops;
pub mod signal;
mod support;
pub mod value;

pub use interp::Interpreter;
pub use signal::{Exec, Signal};
pub use value::{Value, ValueMap};
