//! Recursive partial application over dotted parameter paths
//!
//! An override mapping like `{"a.b.c": v}` rebinds the default of `c`
//! inside the callable bound at `b` inside the callable bound at `a` —
//! nested partial applications built in one pass, without mutating any of
//! the original callables. Spec-valued defaults participate through
//! [`DependencySpec::copy`](lazykw_core::DependencySpec::copy), so the
//! original spec objects stay immutable too.

use crate::ComposeError;
use indexmap::IndexMap;
use lazykw_core::Value;

/// Whether a value can take keyword overrides.
fn composable(value: &Value) -> bool {
    matches!(value, Value::Callable(_) | Value::Spec(_))
}

/// Default parameters visible on a callable-or-spec value.
fn default_kw(value: &Value) -> IndexMap<String, Value> {
    match value {
        Value::Callable(c) => c.default_kw(),
        Value::Spec(s) => s.default_kw(),
        _ => IndexMap::new(),
    }
}

fn target_name(value: &Value) -> String {
    match value {
        Value::Callable(c) => c.name().to_string(),
        Value::Spec(s) => s.name().to_string(),
        other => other.type_name().to_string(),
    }
}

/// Partially apply keyword `overrides` to a callable or spec value.
///
/// Callables gain a partial-application layer; specs derive a copy whose
/// underlying function is partially applied. Either way the input is left
/// untouched and a new value is returned. Overriding a name the target does
/// not declare fails with [`ComposeError::UnknownParameter`] up front,
/// rather than at eventual call time.
pub fn clone_partial(
    target: &Value,
    overrides: IndexMap<String, Value>,
) -> Result<Value, ComposeError> {
    if !composable(target) {
        return Err(ComposeError::NotCallable {
            target: target_name(target),
            kind: target.type_name(),
        });
    }
    for name in overrides.keys() {
        let known = match target {
            Value::Callable(c) => c.declares(name),
            Value::Spec(s) => s.declares(name),
            _ => false,
        };
        if !known {
            return Err(ComposeError::UnknownParameter {
                name: name.clone(),
                target: target_name(target),
            });
        }
    }
    match target {
        Value::Callable(c) => Ok(Value::Callable(c.with_kwargs(overrides))),
        Value::Spec(s) => Ok(Value::spec(s.copy(overrides))),
        _ => unreachable!("checked composable above"),
    }
}

/// Recursively partially apply dotted-path `overrides` to `target`.
///
/// Keys without a separator apply directly; keys with one are grouped by
/// first segment (order of first appearance preserved) and recursively
/// applied to the value currently bound at that segment — an override from
/// the same call if present, else the target's own default. That value must
/// itself be a callable or spec.
pub fn recpartial(
    target: &Value,
    overrides: &IndexMap<String, Value>,
    sep: &str,
) -> Result<Value, ComposeError> {
    if !composable(target) {
        return Err(ComposeError::NotCallable {
            target: target_name(target),
            kind: target.type_name(),
        });
    }
    let mut head: IndexMap<String, Value> = IndexMap::new();
    let mut tails: IndexMap<String, IndexMap<String, Value>> = IndexMap::new();
    for (path, value) in overrides {
        match path.split_once(sep) {
            Some((segment, rest)) => {
                tails
                    .entry(segment.to_string())
                    .or_default()
                    .insert(rest.to_string(), value.clone());
            }
            None => {
                head.insert(path.clone(), value.clone());
            }
        }
    }

    let defaults = default_kw(target);
    for (segment, sub) in &tails {
        let current = match head.get(segment).or_else(|| defaults.get(segment)) {
            Some(v) => v.clone(),
            None => {
                return Err(ComposeError::UnknownParameter {
                    name: segment.clone(),
                    target: target_name(target),
                })
            }
        };
        if !composable(&current) {
            return Err(ComposeError::NotCallable {
                target: segment.clone(),
                kind: current.type_name(),
            });
        }
        tracing::trace!(segment = %segment, overrides = sub.len(), "descend");
        let nested = recpartial(&current, sub, sep)?;
        head.insert(segment.clone(), nested);
    }
    clone_partial(target, head)
}

/// [`recpartial`] with the conventional `"."` separator.
pub fn recpartial_dotted(
    target: &Value,
    overrides: &IndexMap<String, Value>,
) -> Result<Value, ComposeError> {
    recpartial(target, overrides, ".")
}
