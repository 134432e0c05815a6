//! Runtime values.
//!
//! One tagged variant for everything a Rill program can produce. Sequences,
//! maps, and instances are reference types: cloning a `Value` clones the
//! `Rc`, so all holders observe in-place mutation, matching the language's
//! shared-mutable collection semantics.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use rill_parser::ast::{ConstructorDecl, FunctionDecl, LambdaDecl};

use crate::env::ScopeRef;
use crate::interp::Interpreter;
use crate::signal::Exec;

pub use crate::generator::GeneratorState;

#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<ValueMap>>),
    /// Integer range, inclusive on both ends; materialised on iteration.
    Range(i64, i64),
    Function(Rc<Function>),
    Lambda(Rc<LambdaValue>),
    BoundMethod(Rc<BoundMethod>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
    Generator(Rc<RefCell<GeneratorState>>),
    HostFn(HostFn),
    /// Deferred computation produced by the `async` module; `wait` drives it.
    Task(Rc<RefCell<TaskState>>),
}

impl Value {
    pub fn text(s: impl Into<Rc<str>>) -> Self {
        Value::Text(s.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn map(map: ValueMap) -> Self {
        Value::Map(Rc::new(RefCell::new(map)))
    }

    /// Truthiness: `none` is false, booleans themselves, numerics iff
    /// non-zero, text/sequences/maps iff non-empty, everything else true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Map(map) => !map.borrow().is_empty(),
            Value::Range(start, end) => start <= end,
            _ => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_)
                | Value::Lambda(_)
                | Value::BoundMethod(_)
                | Value::Class(_)
                | Value::HostFn(_)
        )
    }

    /// Human-readable type name, as reported by `type()` and used in
    /// type-hint checks.
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "none".into(),
            Value::Bool(_) => "bool".into(),
            Value::Int(_) | Value::Float(_) => "num".into(),
            Value::Text(_) => "text".into(),
            Value::List(_) => "list".into(),
            Value::Map(_) => "map".into(),
            Value::Range(..) => "range".into(),
            Value::Function(_) | Value::Lambda(_) | Value::BoundMethod(_) | Value::HostFn(_) => {
                "conduit".into()
            }
            Value::Class(_) => "class".into(),
            Value::Instance(instance) => format!("instance of {}", instance.class.name),
            Value::Generator(_) => "generator".into(),
            Value::Task(_) => "task".into(),
        }
    }

    /// Text form used by templates, concatenation, `str()`, and `print`.
    /// `none` renders as `"none"`, booleans as `yes`/`no`; text is unquoted.
    pub fn to_text(&self) -> String {
        match self {
            Value::Text(s) => s.to_string(),
            other => other.repr_text(),
        }
    }

    /// Display form with text quoted, used for elements of sequences and
    /// maps and for the interactive shell.
    pub fn repr_text(&self) -> String {
        match self {
            Value::None => "none".into(),
            Value::Bool(true) => "yes".into(),
            Value::Bool(false) => "no".into(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => float_text(*f),
            Value::Text(s) => format!("'{s}'"),
            Value::List(items) => {
                let rendered: Vec<String> =
                    items.borrow().iter().map(|v| v.repr_text()).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Map(map) => {
                let rendered: Vec<String> = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.to_text(), v.repr_text()))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Value::Range(start, end) => format!("{start}..{end}"),
            Value::Function(f) if f.is_method => format!("<method {}>", f.decl.name),
            Value::Function(f) => format!("<conduit {}>", f.decl.name),
            Value::Lambda(_) => "<lambda>".into(),
            Value::BoundMethod(m) => format!("<bound method {}>", m.function.decl.name),
            Value::Class(c) => format!("<class {}>", c.name),
            Value::Instance(i) => format!("<{} instance>", i.class.name),
            Value::Generator(_) => "<generator>".into(),
            Value::HostFn(f) => format!("<conduit {}>", f.name),
            Value::Task(_) => "<task>".into(),
        }
    }
}

fn float_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.repr_text())
    }
}

/// Structural equality. Numerics compare across int/float; sequences and
/// maps compare by content; functions, classes, instances, generators, and
/// tasks compare by identity.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::None, Value::None) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => *x as f64 == *y,
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| values_equal(a, b))
        }
        (Value::Map(x), Value::Map(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).map(|w| values_equal(v, w)).unwrap_or(false))
        }
        (Value::Range(a1, b1), Value::Range(a2, b2)) => a1 == a2 && b1 == b2,
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y),
        (Value::Lambda(x), Value::Lambda(y)) => Rc::ptr_eq(x, y),
        (Value::BoundMethod(x), Value::BoundMethod(y)) => Rc::ptr_eq(x, y),
        (Value::Class(x), Value::Class(y)) => Rc::ptr_eq(x, y),
        (Value::Instance(x), Value::Instance(y)) => Rc::ptr_eq(x, y),
        (Value::Generator(x), Value::Generator(y)) => Rc::ptr_eq(x, y),
        (Value::Task(x), Value::Task(y)) => Rc::ptr_eq(x, y),
        (Value::HostFn(x), Value::HostFn(y)) => x.func as usize == y.func as usize,
        _ => false,
    }
}

/// Runtime type-hint check for declarations (`text`, `num`, `bool`, `list`,
/// `map`, `none`, `conduit`, `any`). Unknown hint names always pass.
pub fn check_type(value: &Value, hint: &str) -> bool {
    match hint {
        "any" => true,
        "text" => matches!(value, Value::Text(_)),
        "num" => matches!(value, Value::Int(_) | Value::Float(_)),
        "bool" => matches!(value, Value::Bool(_)),
        "list" => matches!(value, Value::List(_)),
        "map" => matches!(value, Value::Map(_)),
        "none" => matches!(value, Value::None),
        "conduit" => value.is_callable(),
        _ => true,
    }
}

// ── Ordered value-keyed map ───────────────────────────────────────────

/// Insertion-ordered mapping from value to value. Keys compare by
/// structural equality, so any value can be a key; lookup is linear.
#[derive(Default, Clone)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| values_equal(k, key))
            .map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| matches!(k, Value::Text(t) if &**t == key))
            .map(|(_, v)| v)
    }

    /// Insert or replace, preserving the original insertion position on
    /// replacement.
    pub fn insert(&mut self, key: Value, value: Value) {
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|(k, _)| values_equal(k, &key))
        {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn insert_str(&mut self, key: &str, value: Value) {
        self.insert(Value::text(key), value);
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| values_equal(k, key))?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.entries.iter()
    }

    /// Merge every entry of `other` into `self`, replacing on key clash.
    pub fn extend_from(&mut self, other: &ValueMap) {
        for (k, v) in other.iter() {
            self.insert(k.clone(), v.clone());
        }
    }
}

// ── Callable and class payloads ───────────────────────────────────────

/// A user function: its declaration plus the scope it captured.
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub closure: ScopeRef,
    pub is_method: bool,
}

/// A lambda: its node plus the scope it captured.
pub struct LambdaValue {
    pub decl: Rc<LambdaDecl>,
    pub closure: ScopeRef,
}

/// An instance paired with one of its class's functions; calling it binds
/// `me` to the instance.
pub struct BoundMethod {
    pub instance: Rc<Instance>,
    pub function: Rc<Function>,
}

/// A class: own members plus the optional parent. Method lookup walks
/// parent-wards. The captured scope is where methods and the constructor
/// resolve free names.
pub struct Class {
    pub name: String,
    pub methods: FxHashMap<String, Rc<Function>>,
    pub properties: FxHashMap<String, Value>,
    pub parent: Option<Rc<Class>>,
    pub static_methods: FxHashMap<String, Rc<Function>>,
    pub static_properties: FxHashMap<String, Value>,
    pub constructor: Option<Rc<ConstructorDecl>>,
    pub closure: ScopeRef,
}

impl Class {
    /// Find a method on this class or any ancestor.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }
        self.parent.as_ref().and_then(|p| p.find_method(name))
    }

    /// Find a default property value on this class or any ancestor.
    pub fn find_default(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.properties.get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.find_default(name))
    }
}

/// An instance: its class plus the own-property map.
pub struct Instance {
    pub class: Rc<Class>,
    pub props: RefCell<FxHashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        // Defaults are shared by reference with the class, as collection
        // values are reference types.
        let mut props = FxHashMap::default();
        let mut chain: Vec<&Class> = Vec::new();
        let mut cursor = Some(&*class);
        while let Some(c) = cursor {
            chain.push(c);
            cursor = c.parent.as_deref();
        }
        for c in chain.into_iter().rev() {
            for (name, value) in &c.properties {
                props.insert(name.clone(), value.clone());
            }
        }
        Self {
            class: class.clone(),
            props: RefCell::new(props),
        }
    }
}

/// State behind a task value: a pending callable or its cached result.
pub struct TaskState {
    pub thunk: Option<Value>,
    pub result: Option<Value>,
}

/// Signature shared by every host function. `recv` carries the bound
/// receiver for host method surfaces (`"abc".upper`), or captured state for
/// module helpers that build derived callables.
pub type HostFnPtr = fn(&mut Interpreter, Option<&Value>, Vec<Value>) -> Exec<Value>;

/// A host-provided function value, optionally bound to a receiver.
#[derive(Clone)]
pub struct HostFn {
    pub name: Rc<str>,
    pub recv: Option<Rc<Value>>,
    pub func: HostFnPtr,
}

impl HostFn {
    pub fn new(name: &str, func: HostFnPtr) -> Value {
        Value::HostFn(Self {
            name: name.into(),
            recv: None,
            func,
        })
    }

    pub fn bound(name: &str, recv: Value, func: HostFnPtr) -> Value {
        Value::HostFn(Self {
            name: name.into(),
            recv: Some(Rc::new(recv)),
            func,
        })
    }

    pub fn call(&self, interp: &mut Interpreter, args: Vec<Value>) -> Exec<Value> {
        (self.func)(interp, self.recv.as_deref(), args)
    }
}

/// Materialise an inclusive integer range; empty when `start > end`.
pub fn range_items(start: i64, end: i64) -> Vec<Value> {
    if start > end {
        return Vec::new();
    }
    (start..=end).map(Value::Int).collect()
}

/// Generic iteration over already-materialised shapes: sequences by
/// element, ranges materialised, text by code point, maps by key. `None`
/// for anything else -- generators in particular go through the driver,
/// which callers consult first because resuming a body can fail.
pub fn generic_iter(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::List(items) => Some(items.borrow().clone()),
        Value::Range(start, end) => Some(range_items(*start, *end)),
        Value::Text(s) => Some(s.chars().map(|c| Value::text(c.to_string())).collect()),
        Value::Map(map) => Some(map.borrow().iter().map(|(k, _)| k.clone()).collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::text("").is_truthy());
        assert!(!Value::list(vec![]).is_truthy());
        assert!(!Value::map(ValueMap::new()).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(Value::text("x").is_truthy());
        assert!(Value::Range(1, 3).is_truthy());
        assert!(!Value::Range(3, 1).is_truthy());
    }

    #[test]
    fn structural_equality() {
        assert!(values_equal(&Value::Int(2), &Value::Float(2.0)));
        assert!(values_equal(
            &Value::list(vec![Value::Int(1), Value::text("a")]),
            &Value::list(vec![Value::Int(1), Value::text("a")]),
        ));
        let mut a = ValueMap::new();
        a.insert_str("k", Value::Int(1));
        let mut b = ValueMap::new();
        b.insert_str("k", Value::Int(1));
        assert!(values_equal(&Value::map(a), &Value::map(b)));
        assert!(!values_equal(&Value::Int(1), &Value::text("1")));
    }

    #[test]
    fn every_value_equals_itself() {
        let values = [
            Value::None,
            Value::Bool(true),
            Value::Int(7),
            Value::Float(1.5),
            Value::text("hi"),
            Value::list(vec![Value::Int(1)]),
            Value::map(ValueMap::new()),
            Value::Range(1, 5),
        ];
        for v in &values {
            assert!(values_equal(v, v), "{v:?} must equal itself");
        }
    }

    #[test]
    fn map_preserves_insertion_order() {
        let mut map = ValueMap::new();
        map.insert_str("b", Value::Int(1));
        map.insert_str("a", Value::Int(2));
        map.insert_str("b", Value::Int(3));
        let keys: Vec<String> = map.iter().map(|(k, _)| k.to_text()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert!(matches!(map.get_str("b"), Some(Value::Int(3))));
    }

    #[test]
    fn text_forms() {
        assert_eq!(Value::None.to_text(), "none");
        assert_eq!(Value::Bool(true).to_text(), "yes");
        assert_eq!(Value::Float(2.0).to_text(), "2.0");
        assert_eq!(Value::Float(2.5).to_text(), "2.5");
        assert_eq!(Value::text("hi").to_text(), "hi");
        assert_eq!(Value::text("hi").repr_text(), "'hi'");
        assert_eq!(
            Value::list(vec![Value::Int(1), Value::text("a")]).to_text(),
            "[1, 'a']"
        );
    }

    #[test]
    fn type_hints() {
        assert!(check_type(&Value::Int(1), "num"));
        assert!(check_type(&Value::Float(1.0), "num"));
        assert!(!check_type(&Value::text("x"), "num"));
        assert!(check_type(&Value::None, "none"));
        assert!(check_type(&Value::Int(1), "any"));
        assert!(check_type(&Value::Int(1), "Widget"));
    }
}
