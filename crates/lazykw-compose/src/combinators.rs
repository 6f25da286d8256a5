//! Pure composition combinators
//!
//! Chain callables into a single callable: value-threading, keyword-
//! threading and positional-threading variants. The result is an ordinary
//! [`Callable`], so it nests as a default, partially applies and renders
//! canonically like any other function.

use crate::ComposeError;
use indexmap::IndexMap;
use lazykw_core::{Callable, EvalError, Function, Value};

/// Compose `fs = [f, g, h]` into `r` with `r(x) = f(g(h(x)))`.
///
/// Each stage is called with a single positional argument — the previous
/// stage's result — bound to its first parameter.
pub fn compose(fs: Vec<Callable>) -> Result<Callable, ComposeError> {
    if fs.is_empty() {
        return Err(ComposeError::EmptyChain);
    }
    let stages: Vec<Callable> = fs.into_iter().rev().collect();
    Ok(Function::builder("lazykw:compose")
        .required("value")
        .build(move |args| {
            let mut acc = args.value("value")?.clone();
            for stage in &stages {
                acc = stage.call(vec![acc], IndexMap::new())?;
            }
            Ok(acc)
        }))
}

/// Compose keyword functions right to left over a keyword mapping.
///
/// The chain threads a keyword mapping: every stage except the last must
/// return a [`Value::Map`], which becomes the next stage's keyword
/// arguments. The composed callable takes the initial mapping as its single
/// `kwargs` parameter.
pub fn kwcompose(fs: Vec<Callable>) -> Result<Callable, ComposeError> {
    if fs.is_empty() {
        return Err(ComposeError::EmptyChain);
    }
    let stages: Vec<Callable> = fs.into_iter().rev().collect();
    Ok(Function::builder("lazykw:kwcompose")
        .required("kwargs")
        .build(move |args| {
            let mut kwargs = args.map("kwargs")?.clone();
            let last = stages.len() - 1;
            for (i, stage) in stages.iter().enumerate() {
                let out = stage.call(Vec::new(), kwargs)?;
                if i == last {
                    return Ok(out);
                }
                kwargs = match out {
                    Value::Map(m) => m,
                    other => {
                        return Err(EvalError::type_mismatch(
                            "kwargs",
                            "map",
                            other.type_name(),
                        ))
                    }
                };
            }
            unreachable!("chain is non-empty")
        }))
}

/// Compose positional functions right to left over an argument list.
///
/// The chain threads a positional list: every stage except the last must
/// return a [`Value::List`], splatted into the next stage. The composed
/// callable takes the initial list as its single `args` parameter.
pub fn argcompose(fs: Vec<Callable>) -> Result<Callable, ComposeError> {
    if fs.is_empty() {
        return Err(ComposeError::EmptyChain);
    }
    let stages: Vec<Callable> = fs.into_iter().rev().collect();
    Ok(Function::builder("lazykw:argcompose")
        .required("args")
        .build(move |args| {
            let mut positional = args.list("args")?.to_vec();
            let last = stages.len() - 1;
            for (i, stage) in stages.iter().enumerate() {
                let out = stage.call(positional, IndexMap::new())?;
                if i == last {
                    return Ok(out);
                }
                positional = match out {
                    Value::List(items) => items,
                    other => {
                        return Err(EvalError::type_mismatch(
                            "args",
                            "list",
                            other.type_name(),
                        ))
                    }
                };
            }
            unreachable!("chain is non-empty")
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    fn inc() -> Callable {
        Function::builder("tests:inc")
            .required("v")
            .build(|args| Ok(Value::Int(args.int("v")? + 1)))
    }

    fn double() -> Callable {
        Function::builder("tests:double")
            .required("v")
            .build(|args| Ok(Value::Int(args.int("v")? * 2)))
    }

    #[test]
    fn compose_applies_right_to_left() {
        // double(inc(3)) = 8, not inc(double(3)) = 7
        let r = compose(vec![double(), inc()]).unwrap();
        let out = r.call(vec![Value::Int(3)], IndexMap::new()).unwrap();
        assert_eq!(out, Value::Int(8));
    }

    #[test]
    fn single_stage_compose_is_identity_of_that_stage() {
        let r = compose(vec![inc()]).unwrap();
        assert_eq!(
            r.call(vec![Value::Int(0)], IndexMap::new()).unwrap(),
            Value::Int(1)
        );
    }

    #[test]
    fn empty_chain_is_rejected() {
        assert!(matches!(compose(Vec::new()), Err(ComposeError::EmptyChain)));
        assert!(matches!(kwcompose(Vec::new()), Err(ComposeError::EmptyChain)));
        assert!(matches!(argcompose(Vec::new()), Err(ComposeError::EmptyChain)));
    }

    #[test]
    fn kwcompose_threads_keyword_maps() {
        let widen = Function::builder("tests:widen")
            .required("width")
            .build(|args| {
                Ok(Value::Map(indexmap! {
                    "width".to_string() => Value::Int(args.int("width")? * 2),
                }))
            });
        let describe = Function::builder("tests:describe")
            .required("width")
            .build(|args| Ok(Value::Str(format!("width={}", args.int("width")?))));
        let r = kwcompose(vec![describe, widen]).unwrap();
        let out = r
            .call(
                vec![Value::Map(indexmap! {"width".to_string() => Value::Int(4)})],
                IndexMap::new(),
            )
            .unwrap();
        assert_eq!(out, Value::Str("width=8".to_string()));
    }

    #[test]
    fn kwcompose_rejects_non_map_intermediate() {
        let bad = Function::builder("tests:bad")
            .required("width")
            .build(|args| args.value("width").cloned());
        let tail = Function::builder("tests:tail")
            .required("width")
            .build(|args| args.value("width").cloned());
        let r = kwcompose(vec![tail, bad]).unwrap();
        let err = r
            .call(
                vec![Value::Map(indexmap! {"width".to_string() => Value::Int(4)})],
                IndexMap::new(),
            )
            .unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn argcompose_threads_positional_lists() {
        let swap = Function::builder("tests:swap")
            .required("a")
            .required("b")
            .build(|args| {
                Ok(Value::List(vec![
                    args.value("b")?.clone(),
                    args.value("a")?.clone(),
                ]))
            });
        let sub = Function::builder("tests:sub")
            .required("a")
            .required("b")
            .build(|args| Ok(Value::Int(args.int("a")? - args.int("b")?)));
        let r = argcompose(vec![sub, swap]).unwrap();
        let out = r
            .call(
                vec![Value::List(vec![Value::Int(3), Value::Int(10)])],
                IndexMap::new(),
            )
            .unwrap();
        assert_eq!(out, Value::Int(7));
    }
}
