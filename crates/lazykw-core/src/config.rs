//! The configuration-function wrapper
//!
//! [`ConfigFn`] turns an ordinary callable's declared defaults into a lazy
//! dependency graph: each call seeds a fresh [`EvalContext`] with the
//! defaulted parameters, merges call-site overrides, resolves every
//! declared parameter and invokes the callable fully evaluated by keyword.
//! The body never observes an unevaluated [`Value::Spec`].

use crate::context::EvalContext;
use crate::error::EvalError;
use crate::value::{Callable, Function, Value};
use indexmap::IndexMap;
use std::sync::Arc;

/// A callable whose defaulted parameters resolve lazily at call time.
#[derive(Clone, Debug)]
pub struct ConfigFn {
    inner: Callable,
}

impl ConfigFn {
    /// Wrap a callable.
    #[must_use]
    pub fn new(inner: Callable) -> Self {
        Self { inner }
    }

    /// The wrapped callable.
    #[inline]
    #[must_use]
    pub fn callable(&self) -> &Callable {
        &self.inner
    }

    /// Invoke with positional and keyword overrides.
    ///
    /// Positionals zip against the required-parameter names in declaration
    /// order; keywords win when both target the same name. Keywords that
    /// match no declared parameter are accepted into the context — a lazy
    /// or argument-consuming spec may depend on them as siblings.
    pub fn call(
        &self,
        args: Vec<Value>,
        kwargs: IndexMap<String, Value>,
    ) -> Result<Value, EvalError> {
        let mut ctx = EvalContext::new(self.inner.default_kw());
        self.call_in(&mut ctx, args, kwargs)
    }

    /// Invoke against a caller-supplied context.
    ///
    /// The context's memo cache persists for its own lifetime, so a caller
    /// reusing one context across calls shares memoized results between
    /// them. [`ConfigFn::call`] creates a fresh context per call and has no
    /// such leakage.
    pub fn call_in(
        &self,
        ctx: &mut EvalContext,
        args: Vec<Value>,
        kwargs: IndexMap<String, Value>,
    ) -> Result<Value, EvalError> {
        let required = self.inner.required_params();
        if args.len() > required.len() {
            return Err(EvalError::TooManyPositionalArguments {
                got: args.len(),
                required: required.len(),
            });
        }
        tracing::debug!(func = self.inner.name(), args = args.len(), "configure");
        let mut positional = IndexMap::with_capacity(args.len());
        for (name, value) in required.iter().zip(args) {
            positional.insert(name.clone(), value);
        }
        ctx.update(positional);
        ctx.update(kwargs);

        let mut resolved = IndexMap::new();
        for name in self.inner.param_names() {
            resolved.insert(name.clone(), ctx.resolve(&name)?);
        }
        self.inner.call(Vec::new(), resolved)
    }

    /// Re-wrap as a plain [`Callable`] with the same name and parameter
    /// list, so a configuration function can nest as another function's
    /// default and flow through partial application like any callable.
    #[must_use]
    pub fn as_callable(&self) -> Callable {
        let this = self.clone();
        let function = self.inner.function();
        Callable::Function(Arc::new(Function::new(
            function.name().to_string(),
            function.params().to_vec(),
            move |call_args| {
                this.call(Vec::new(), call_args.values().clone())
            },
        )))
    }
}

impl From<Callable> for ConfigFn {
    fn from(inner: Callable) -> Self {
        Self::new(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::DependencySpec;
    use indexmap::indexmap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// f(data, lr=0.1, steps=xargs(scale, [lr]))
    fn sample() -> ConfigFn {
        let scale = Function::builder("tests:scale")
            .required("lr")
            .build(|args| Ok(Value::Int((args.float("lr")? * 1000.0) as i64)));
        let f = Function::builder("tests:train")
            .required("data")
            .param("lr", 0.1)
            .param(
                "steps",
                DependencySpec::args(scale, ["lr"], Vec::<String>::new()),
            )
            .build(|args| {
                Ok(Value::List(vec![
                    args.value("data")?.clone(),
                    args.value("lr")?.clone(),
                    args.value("steps")?.clone(),
                ]))
            });
        ConfigFn::new(f)
    }

    #[test]
    fn defaults_resolve_through_their_dependencies() {
        let out = sample().call(vec![Value::from("mnist")], IndexMap::new()).unwrap();
        assert_eq!(
            out,
            Value::List(vec![
                Value::from("mnist"),
                Value::from(0.1),
                Value::Int(100),
            ])
        );
    }

    #[test]
    fn overrides_propagate_into_dependent_specs() {
        let out = sample()
            .call(
                vec![Value::from("mnist")],
                indexmap! {"lr".to_string() => Value::from(0.5)},
            )
            .unwrap();
        assert_eq!(
            out,
            Value::List(vec![
                Value::from("mnist"),
                Value::from(0.5),
                Value::Int(500),
            ])
        );
    }

    #[test]
    fn keyword_wins_over_positional_for_same_name() {
        let out = sample()
            .call(
                vec![Value::from("positional")],
                indexmap! {"data".to_string() => Value::from("keyword")},
            )
            .unwrap();
        match out {
            Value::List(items) => assert_eq!(items[0], Value::from("keyword")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn too_many_positionals_fail_eagerly() {
        let err = sample()
            .call(
                vec![Value::from("a"), Value::from("b")],
                IndexMap::new(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            EvalError::TooManyPositionalArguments { got: 2, required: 1 }
        ));
    }

    #[test]
    fn extra_keywords_feed_lazy_specs() {
        let f = Function::builder("tests:report")
            .param(
                "label",
                DependencySpec::lazy("tests:label_from_run", |ctx, _| {
                    ctx.resolve("run_id")
                }),
            )
            .build(|args| args.value("label").cloned());
        let out = ConfigFn::new(f)
            .call(
                Vec::new(),
                indexmap! {"run_id".to_string() => Value::Int(7)},
            )
            .unwrap();
        assert_eq!(out, Value::Int(7));
    }

    #[test]
    fn fresh_context_per_call_recomputes_memo() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let build = Function::builder("tests:build")
            .required("size")
            .build(|args| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                args.value("size").cloned()
            });
        let f = Function::builder("tests:run")
            .param("size", 4)
            .param(
                "model",
                DependencySpec::memo(build, ["size"], Vec::<String>::new()),
            )
            .build(|args| args.value("model").cloned());
        let cfg = ConfigFn::new(f);
        cfg.call(Vec::new(), IndexMap::new()).unwrap();
        cfg.call(Vec::new(), IndexMap::new()).unwrap();
        // No cross-call memo leakage: each call evaluates once.
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn shared_context_keeps_memo_across_calls() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let build = Function::builder("tests:build_shared")
            .required("size")
            .build(|args| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                args.value("size").cloned()
            });
        let f = Function::builder("tests:run_shared")
            .param("size", 4)
            .param(
                "model",
                DependencySpec::memo(build, ["size"], Vec::<String>::new()),
            )
            .build(|args| args.value("model").cloned());
        let cfg = ConfigFn::new(f);
        let mut ctx = EvalContext::new(cfg.callable().default_kw());
        cfg.call_in(&mut ctx, Vec::new(), IndexMap::new()).unwrap();
        cfg.call_in(&mut ctx, Vec::new(), IndexMap::new()).unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_config_fn_acts_as_plain_callable() {
        let inner = ConfigFn::new(
            Function::builder("tests:inner")
                .param("y", 1)
                .param("z", 2)
                .build(|args| Ok(Value::Int(args.int("y")? + args.int("z")?))),
        );
        let outer = Function::builder("tests:outer")
            .param("x", inner.as_callable())
            .build(|args| args.callable("x")?.call(Vec::new(), IndexMap::new()));
        let out = ConfigFn::new(outer).call(Vec::new(), IndexMap::new()).unwrap();
        assert_eq!(out, Value::Int(3));
    }
}
