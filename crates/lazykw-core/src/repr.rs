//! Canonical representation of configuration graphs
//!
//! Renders a value, callable or partial-application graph into a
//! deterministic, ordered JSON structure keyed by `__class__`, suitable for
//! logging, equality checks and cache keys. Structurally identical graphs
//! (same names, same values, same nesting) render identically regardless of
//! object identity.

use crate::spec::DependencySpec;
use crate::value::{Callable, Value};
use serde_json::{Map, Value as Json};

/// Rendering options.
///
/// An explicit parameter rather than process-wide state, so call sites stay
/// pure and testable.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReprOptions {
    /// Also render each function's own default parameters recursively
    pub include_defaults: bool,
}

impl ReprOptions {
    /// Options with function defaults embedded.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            include_defaults: true,
        }
    }
}

/// Render `value` into its canonical representation.
#[must_use]
pub fn represent(value: &Value, opts: ReprOptions) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(v) => Json::Bool(*v),
        Value::Int(v) => Json::from(*v),
        Value::Float(v) => serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number),
        Value::Str(v) => Json::String(v.clone()),
        Value::List(items) => Json::Array(items.iter().map(|v| represent(v, opts)).collect()),
        Value::Map(entries) => {
            let mut map = Map::new();
            for (k, v) in entries {
                map.insert(k.clone(), represent(v, opts));
            }
            Json::Object(map)
        }
        Value::Callable(c) => callable_repr(c, opts),
        Value::Spec(s) => spec_repr(s, opts),
    }
}

fn callable_repr(callable: &Callable, opts: ReprOptions) -> Json {
    match callable {
        Callable::Function(f) => {
            let mut map = Map::new();
            map.insert("__class__".to_string(), Json::String(f.name().to_string()));
            if opts.include_defaults {
                for param in f.params() {
                    if let Some(default) = param.default() {
                        map.insert(param.name().to_string(), represent(default, opts));
                    }
                }
            }
            Json::Object(map)
        }
        Callable::Partial(p) => {
            let mut map = Map::new();
            map.insert("__class__".to_string(), Json::String("partial".to_string()));
            map.insert("func".to_string(), callable_repr(p.target(), opts));
            for (k, v) in p.kwargs() {
                map.insert(k.clone(), represent(v, opts));
            }
            if !p.args().is_empty() {
                map.insert(
                    "__args__".to_string(),
                    Json::Array(p.args().iter().map(|v| represent(v, opts)).collect()),
                );
            }
            Json::Object(map)
        }
    }
}

fn spec_repr(spec: &DependencySpec, opts: ReprOptions) -> Json {
    let mut map = Map::new();
    map.insert(
        "__class__".to_string(),
        Json::String(format!("lazykw:{}", spec.kind())),
    );
    match spec {
        DependencySpec::Args(s) | DependencySpec::Memo(s) => {
            map.insert("func".to_string(), callable_repr(s.func(), opts));
        }
        DependencySpec::Lazy(lazy) => {
            // Context-consuming: no callable to descend into, render the
            // display name (plus any copied-in overrides, partial-style).
            let mut inner = Map::new();
            inner.insert(
                "__class__".to_string(),
                Json::String(lazy.name().to_string()),
            );
            if lazy.bound().is_empty() {
                map.insert("func".to_string(), Json::Object(inner));
            } else {
                let mut partial = Map::new();
                partial.insert("__class__".to_string(), Json::String("partial".to_string()));
                partial.insert("func".to_string(), Json::Object(inner));
                for (k, v) in lazy.bound().iter() {
                    partial.insert(k.clone(), represent(v, opts));
                }
                map.insert("func".to_string(), Json::Object(partial));
            }
        }
    }
    if let Some(inner) = spec.arg_spec() {
        if !inner.expect_args().is_empty() {
            map.insert(
                "expect_args".to_string(),
                Json::Array(
                    inner
                        .expect_args()
                        .iter()
                        .map(|s| Json::String(s.clone()))
                        .collect(),
                ),
            );
        }
        if !inner.expect_kw().is_empty() {
            map.insert(
                "expect_kw".to_string(),
                Json::Array(
                    inner
                        .expect_kw()
                        .iter()
                        .map(|s| Json::String(s.clone()))
                        .collect(),
                ),
            );
        }
    }
    Json::Object(map)
}

/// Collapse a nested representation into a single-level mapping with
/// `sep`-joined keys, mirroring the dotted-path convention of recursive
/// partial application. Non-object inputs are returned unchanged.
#[must_use]
pub fn flatten(repr: &Json, sep: &str) -> Json {
    match repr {
        Json::Object(map) => {
            let mut flat = Map::new();
            flatten_into("", map, sep, &mut flat);
            Json::Object(flat)
        }
        other => other.clone(),
    }
}

fn flatten_into(prefix: &str, map: &Map<String, Json>, sep: &str, out: &mut Map<String, Json>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{sep}{key}")
        };
        match value {
            Json::Object(nested) => flatten_into(&path, nested, sep, out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}

/// Canonical representation flattened to dotted keys in one step.
#[must_use]
pub fn flattened_repr(value: &Value, opts: ReprOptions, sep: &str) -> Json {
    flatten(&represent(value, opts), sep)
}

/// Deterministic fingerprint of a value, used as a memo-cache key
/// component. Defaults are embedded so that two partial applications of the
/// same function with different bindings fingerprint differently.
pub(crate) fn fingerprint(value: &Value) -> String {
    represent(value, ReprOptions::with_defaults()).to_string()
}
