//! Standard-library module registry.
//!
//! The resolver recognises a closed set of module names; each builder
//! returns a map from string names to values (host functions, constants,
//! or nested maps), which the evaluator then treats uniformly through its
//! call and member-access rules.

pub(crate) mod array;
pub(crate) mod async_mod;
pub(crate) mod cloud;
pub(crate) mod collections;
pub(crate) mod crypto;
pub(crate) mod datetime;
pub(crate) mod db;
pub(crate) mod events;
pub(crate) mod fs;
pub(crate) mod functional;
pub(crate) mod http;
pub(crate) mod json;
pub(crate) mod logging;
pub(crate) mod math;
pub(crate) mod regex_mod;
pub(crate) mod string;
pub(crate) mod validation;

use crate::value::{HostFn, HostFnPtr, Value, ValueMap};

/// Build the mapping for a standard-library module name, or `None` when
/// the name is not in the registry.
pub(crate) fn load_stdlib(name: &str) -> Option<ValueMap> {
    let map = match name {
        "http" => http::module(),
        "db" => db::module(),
        "crypto" => crypto::module(),
        "fs" => fs::module(),
        "json" => json::module(),
        "math" => math::module(),
        "string" => string::module(),
        "array" => array::module(),
        "datetime" => datetime::module(),
        "regex" => regex_mod::module(),
        "validation" => validation::module(),
        "collections" => collections::module(),
        "events" => events::module(),
        "logging" => logging::module(),
        "async" => async_mod::module(),
        "functional" => functional::module(),
        "agent" => cloud::module(),
        _ => return None,
    };
    Some(map)
}

/// Assemble a module map from named host functions.
pub(crate) fn functions(entries: &[(&str, HostFnPtr)]) -> ValueMap {
    let mut map = ValueMap::new();
    for (name, func) in entries {
        map.insert_str(name, HostFn::new(name, *func));
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_module_name() {
        let names = [
            "http",
            "db",
            "crypto",
            "fs",
            "json",
            "math",
            "string",
            "array",
            "datetime",
            "regex",
            "validation",
            "collections",
            "events",
            "logging",
            "async",
            "functional",
            "agent",
        ];
        for name in names {
            let map = load_stdlib(name).unwrap_or_else(|| panic!("module {name} missing"));
            assert!(!map.is_empty(), "module {name} must export something");
        }
        assert!(load_stdlib("nope").is_none());
    }

    #[test]
    fn modules_export_string_keyed_values() {
        let map = load_stdlib("math").unwrap();
        for (key, _) in map.iter() {
            assert!(matches!(key, Value::Text(_)), "module keys must be text");
        }
    }
}
