//! LazyKW composition layer
//!
//! Recursive partial application over dotted parameter paths, plus the pure
//! composition combinators.
//!
//! # Core Concepts
//!
//! - [`recpartial`]: apply `{"a.b.c": v}`-style overrides to a nested
//!   configuration tree, producing a new callable without mutating the
//!   original
//! - [`clone_partial`]: one partial-application step that works uniformly
//!   on callables and dependency specs
//! - [`compose`] / [`kwcompose`] / [`argcompose`]: chain callables into one
//!
//! # Example
//!
//! ```rust
//! use indexmap::{indexmap, IndexMap};
//! use lazykw_core::{Function, Value};
//! use lazykw_compose::recpartial_dotted;
//!
//! let g = Function::builder("demo:g")
//!     .param("y", 1)
//!     .build(|args| args.value("y").cloned());
//! let f = Function::builder("demo:f")
//!     .param("x", g)
//!     .build(|args| args.callable("x")?.call(Vec::new(), IndexMap::new()));
//!
//! let tuned = recpartial_dotted(
//!     &Value::Callable(f),
//!     &indexmap! {"x.y".to_string() => Value::Int(5)},
//! )
//! .unwrap();
//! let out = tuned.as_callable().unwrap().call(Vec::new(), IndexMap::new());
//! assert_eq!(out.unwrap(), Value::Int(5));
//! ```

mod combinators;
mod partial;

pub use combinators::{argcompose, compose, kwcompose};
pub use partial::{clone_partial, recpartial, recpartial_dotted};

/// Errors raised while composing or partially applying callables.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ComposeError {
    /// A path segment's current value cannot take overrides
    #[error("'{target}' is not callable (found {kind})")]
    NotCallable {
        /// The override path segment (or root target) at fault
        target: String,
        /// Type tag of the offending value
        kind: &'static str,
    },

    /// An override names a parameter the target does not declare
    #[error("unknown parameter '{name}' for '{target}'")]
    UnknownParameter {
        /// The undeclared parameter name
        name: String,
        /// The callable it was applied to
        target: String,
    },

    /// Composition of zero callables
    #[error("cannot compose an empty chain")]
    EmptyChain,
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
