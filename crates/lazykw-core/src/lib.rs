//! LazyKW evaluation engine
//!
//! Lazy, memoized keyword-configuration evaluation: a callable's defaulted
//! parameters form a small on-demand dependency graph, resolved only when
//! first accessed, with memoized results cached per evaluation context.
//!
//! # Core Concepts
//!
//! - [`Value`]: the runtime value union (data, callables, specs)
//! - [`Function`] / [`Callable`]: explicitly declared functions and
//!   partial-application stacks over them
//! - [`DependencySpec`]: a declared-but-unevaluated default — argument-
//!   consuming, context-consuming or memoized
//! - [`EvalContext`]: declared mapping + memo cache; resolves keys by
//!   following their specs depth-first
//! - [`ConfigFn`]: wraps a callable so its defaults resolve lazily at call
//!   time
//! - [`repr`]: canonical, deterministic representation of a configuration
//!   graph, for logging and cache keys
//!
//! # Example
//!
//! ```rust
//! use lazykw_core::{ConfigFn, DependencySpec, Function, Value};
//! use indexmap::IndexMap;
//!
//! let steps = Function::builder("train:steps")
//!     .required("epochs")
//!     .build(|args| Ok(Value::Int(args.int("epochs")? * 100)));
//!
//! let train = Function::builder("train:run")
//!     .param("epochs", 3)
//!     .param("steps", DependencySpec::args(steps, ["epochs"], Vec::<String>::new()))
//!     .build(|args| args.value("steps").cloned());
//!
//! let out = ConfigFn::new(train).call(Vec::new(), IndexMap::new()).unwrap();
//! assert_eq!(out, Value::Int(300));
//! ```

mod config;
mod context;
mod error;
pub mod repr;
mod spec;
mod value;

pub use config::ConfigFn;
pub use context::{EvalContext, MemoKey};
pub use error::EvalError;
pub use repr::{flatten, flattened_repr, represent, ReprOptions};
pub use spec::{ArgSpec, ContextFn, DependencySpec, LazyArgs, LazySpec};
pub use value::{CallArgs, Callable, Function, FunctionBuilder, NativeFn, Param, Partial, Value};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for configuration assembly
    pub use crate::{
        CallArgs, Callable, ConfigFn, DependencySpec, EvalContext, EvalError, Function, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use indexmap::{indexmap, IndexMap};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Assemble a training-style configuration exercising all three spec
    /// kinds together: a memoized model, an argument-consuming step count
    /// and a context-consuming device pick.
    #[test]
    fn full_configuration_lifecycle() {
        let model_builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&model_builds);
        let build_model = Function::builder("models:mlp")
            .required("width")
            .required("depth")
            .build(move |args| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Str(format!(
                    "mlp-{}x{}",
                    args.int("width")?,
                    args.int("depth")?
                )))
            });

        let steps_for = Function::builder("train:steps_for")
            .required("epochs")
            .param("per_epoch", 50)
            .build(|args| Ok(Value::Int(args.int("epochs")? * args.int("per_epoch")?)));

        let train = Function::builder("train:run")
            .required("data")
            .param("width", 128)
            .param("depth", 2)
            .param("epochs", 3)
            .param(
                "model",
                DependencySpec::memo(build_model, ["width", "depth"], Vec::<String>::new()),
            )
            .param(
                "steps",
                DependencySpec::args(steps_for, ["epochs"], Vec::<String>::new()),
            )
            .param(
                "device",
                DependencySpec::lazy("train:pick_device", |ctx, _| {
                    if ctx.contains("gpu") {
                        ctx.resolve("gpu")
                    } else {
                        Ok(Value::from("cpu"))
                    }
                }),
            )
            .build(|args| {
                Ok(Value::Map(indexmap! {
                    "data".to_string() => args.value("data")?.clone(),
                    "model".to_string() => args.value("model")?.clone(),
                    "steps".to_string() => args.value("steps")?.clone(),
                    "device".to_string() => args.value("device")?.clone(),
                }))
            });
        let cfg = ConfigFn::new(train);

        let out = cfg.call(vec![Value::from("mnist")], IndexMap::new()).unwrap();
        let Value::Map(map) = out else {
            panic!("expected map result")
        };
        assert_eq!(map["model"], Value::from("mlp-128x2"));
        assert_eq!(map["steps"], Value::Int(150));
        assert_eq!(map["device"], Value::from("cpu"));
        assert_eq!(model_builds.load(Ordering::SeqCst), 1);

        // Overrides flow into the dependent specs, including extra keywords
        // that only the lazy spec consumes.
        let out = cfg
            .call(
                vec![Value::from("cifar")],
                indexmap! {
                    "width".to_string() => Value::Int(256),
                    "gpu".to_string() => Value::from("cuda:0"),
                },
            )
            .unwrap();
        let Value::Map(map) = out else {
            panic!("expected map result")
        };
        assert_eq!(map["model"], Value::from("mlp-256x2"));
        assert_eq!(map["device"], Value::from("cuda:0"));
    }

    #[test]
    fn representation_of_a_composed_configuration_is_flat_and_stable() {
        let build = || {
            let optim = Function::builder("optim:sgd")
                .param("lr", 0.1)
                .build(|args| args.value("lr").cloned());
            Function::builder("train:run")
                .param("optimizer", optim)
                .param("seed", 0)
                .build(|args| args.value("seed").cloned())
        };
        let first = repr::flattened_repr(
            &Value::Callable(build()),
            ReprOptions::with_defaults(),
            ".",
        );
        let second = repr::flattened_repr(
            &Value::Callable(build()),
            ReprOptions::with_defaults(),
            ".",
        );
        assert_eq!(first.to_string(), second.to_string());
        let obj = first.as_object().unwrap();
        assert_eq!(obj["optimizer.__class__"], "optim:sgd");
        assert_eq!(obj["optimizer.lr"], 0.1);
    }
}
