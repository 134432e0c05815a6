//! Scope chain.
//!
//! Scopes form a parent-ward linked chain behind shared handles: closures
//! capture a `ScopeRef`, so a captured scope is shared mutable state and
//! writes are visible to every capture. Each binding carries its value,
//! mutability and constness flags, and an optional type hint.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::value::Value;

pub type ScopeRef = Rc<RefCell<Scope>>;

#[derive(Clone)]
pub struct Binding {
    pub value: Value,
    pub mutable: bool,
    pub constant: bool,
    pub type_hint: Option<String>,
}

pub struct Scope {
    parent: Option<ScopeRef>,
    bindings: FxHashMap<String, Binding>,
}

/// Why a write through [`Scope::set`] was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetError {
    Undefined,
    Immutable,
    Constant,
}

impl Scope {
    /// A root scope with no parent.
    pub fn root() -> ScopeRef {
        Rc::new(RefCell::new(Self {
            parent: None,
            bindings: FxHashMap::default(),
        }))
    }

    /// A child scope of `parent`; bindings here shadow same-named outer ones.
    pub fn child(parent: &ScopeRef) -> ScopeRef {
        Rc::new(RefCell::new(Self {
            parent: Some(parent.clone()),
            bindings: FxHashMap::default(),
        }))
    }

    /// Add a binding in this scope, shadowing any outer binding.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        value: Value,
        mutable: bool,
        constant: bool,
        type_hint: Option<String>,
    ) {
        self.bindings.insert(
            name.into(),
            Binding {
                value,
                mutable,
                constant,
                type_hint,
            },
        );
    }

    /// Look up the nearest binding, walking parent-wards.
    pub fn get(scope: &ScopeRef, name: &str) -> Option<Value> {
        let mut cursor = scope.clone();
        loop {
            let next = {
                let borrowed = cursor.borrow();
                if let Some(binding) = borrowed.bindings.get(name) {
                    return Some(binding.value.clone());
                }
                borrowed.parent.clone()
            };
            cursor = next?;
        }
    }

    /// Whether a binding exists anywhere in the chain.
    pub fn has(scope: &ScopeRef, name: &str) -> bool {
        Self::get(scope, name).is_some()
    }

    /// Write to the nearest binding. Fails if that binding is constant or
    /// immutable, or if no binding exists.
    pub fn set(scope: &ScopeRef, name: &str, value: Value) -> Result<(), SetError> {
        let mut cursor = scope.clone();
        loop {
            let next = {
                let mut borrowed = cursor.borrow_mut();
                if let Some(binding) = borrowed.bindings.get_mut(name) {
                    if binding.constant {
                        return Err(SetError::Constant);
                    }
                    if !binding.mutable {
                        return Err(SetError::Immutable);
                    }
                    binding.value = value;
                    return Ok(());
                }
                borrowed.parent.clone()
            };
            match next {
                Some(parent) => cursor = parent,
                None => return Err(SetError::Undefined),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let scope = Scope::root();
        scope
            .borrow_mut()
            .define("x", Value::Int(1), true, false, None);
        assert!(matches!(Scope::get(&scope, "x"), Some(Value::Int(1))));
        assert!(Scope::get(&scope, "y").is_none());
    }

    #[test]
    fn lookup_walks_parents_and_shadows() {
        let outer = Scope::root();
        outer
            .borrow_mut()
            .define("x", Value::Int(1), true, false, None);
        outer
            .borrow_mut()
            .define("y", Value::Int(10), true, false, None);

        let inner = Scope::child(&outer);
        inner
            .borrow_mut()
            .define("x", Value::Int(2), true, false, None);

        assert!(matches!(Scope::get(&inner, "x"), Some(Value::Int(2))));
        assert!(matches!(Scope::get(&inner, "y"), Some(Value::Int(10))));
        // The outer binding is untouched by the shadow.
        assert!(matches!(Scope::get(&outer, "x"), Some(Value::Int(1))));
    }

    #[test]
    fn set_writes_nearest_binding() {
        let outer = Scope::root();
        outer
            .borrow_mut()
            .define("x", Value::Int(1), true, false, None);
        let inner = Scope::child(&outer);

        Scope::set(&inner, "x", Value::Int(5)).unwrap();
        assert!(matches!(Scope::get(&outer, "x"), Some(Value::Int(5))));
    }

    #[test]
    fn immutability_rules() {
        let scope = Scope::root();
        scope
            .borrow_mut()
            .define("frozen", Value::Int(1), false, false, None);
        scope
            .borrow_mut()
            .define("pinned", Value::Int(2), false, true, None);

        assert_eq!(
            Scope::set(&scope, "frozen", Value::Int(9)),
            Err(SetError::Immutable)
        );
        assert_eq!(
            Scope::set(&scope, "pinned", Value::Int(9)),
            Err(SetError::Constant)
        );
        assert_eq!(
            Scope::set(&scope, "ghost", Value::Int(9)),
            Err(SetError::Undefined)
        );
        // Failed writes leave the binding unchanged.
        assert!(matches!(Scope::get(&scope, "frozen"), Some(Value::Int(1))));
    }

    #[test]
    fn shared_scope_writes_are_visible_to_all_handles() {
        let scope = Scope::root();
        scope
            .borrow_mut()
            .define("n", Value::Int(0), true, false, None);
        let captured = scope.clone();

        Scope::set(&scope, "n", Value::Int(42)).unwrap();
        assert!(matches!(Scope::get(&captured, "n"), Some(Value::Int(42))));
    }
}
