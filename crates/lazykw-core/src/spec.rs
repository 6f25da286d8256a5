//! Declared-but-unevaluated defaults
//!
//! A default parameter value may be a [`DependencySpec`] instead of a plain
//! value: a recipe for producing the value from sibling parameters at
//! resolution time. Three kinds exist, dispatched by pattern matching:
//!
//! - [`DependencySpec::Args`] — consumes named siblings, re-evaluated on
//!   every access
//! - [`DependencySpec::Lazy`] — consumes the whole context, for dependency
//!   sets that cannot be enumerated up front
//! - [`DependencySpec::Memo`] — like `Args`, but cached per distinct
//!   sibling-value tuple

use crate::context::{EvalContext, MemoKey};
use crate::error::EvalError;
use crate::repr;
use crate::value::{Callable, Value};
use indexmap::IndexMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Closure form of a context-consuming dependency.
pub type ContextFn =
    Arc<dyn Fn(&mut EvalContext, &LazyArgs) -> Result<Value, EvalError> + Send + Sync>;

/// Keyword values pre-bound onto a context-consuming spec by [`DependencySpec::copy`].
///
/// A closure cannot be partially applied the way a keyword function can, so
/// copied-in overrides are surfaced here instead and the closure consults
/// them before falling back to the context.
#[derive(Clone, Debug, Default)]
pub struct LazyArgs {
    bound: IndexMap<String, Value>,
}

impl LazyArgs {
    /// Pre-bound value for `key`, if any.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.bound.get(key)
    }

    /// True when no overrides were bound.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    /// Iterate over bound overrides in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.bound.iter()
    }

    /// Resolve `key` from the bound overrides first, then the context.
    pub fn resolve(&self, ctx: &mut EvalContext, key: &str) -> Result<Value, EvalError> {
        match self.bound.get(key) {
            Some(v) => Ok(v.clone()),
            None => ctx.resolve(key),
        }
    }
}

/// Payload of the argument-consuming spec kinds.
#[derive(Clone)]
pub struct ArgSpec {
    func: Callable,
    expect_args: Vec<String>,
    expect_kw: Vec<String>,
}

impl ArgSpec {
    /// Underlying callable
    #[inline]
    #[must_use]
    pub fn func(&self) -> &Callable {
        &self.func
    }

    /// Sibling names supplied positionally, in order
    #[inline]
    #[must_use]
    pub fn expect_args(&self) -> &[String] {
        &self.expect_args
    }

    /// Sibling names supplied by keyword
    #[inline]
    #[must_use]
    pub fn expect_kw(&self) -> &[String] {
        &self.expect_kw
    }

    /// Evaluate every expected sibling, positional first then keyword.
    fn resolve_siblings(
        &self,
        ctx: &mut EvalContext,
    ) -> Result<(Vec<Value>, IndexMap<String, Value>), EvalError> {
        let mut args = Vec::with_capacity(self.expect_args.len());
        for name in &self.expect_args {
            args.push(ctx.resolve(name)?);
        }
        let mut kwargs = IndexMap::with_capacity(self.expect_kw.len());
        for name in &self.expect_kw {
            kwargs.insert(name.clone(), ctx.resolve(name)?);
        }
        Ok((args, kwargs))
    }
}

impl Debug for ArgSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgSpec")
            .field("func", &self.func.name())
            .field("expect_args", &self.expect_args)
            .field("expect_kw", &self.expect_kw)
            .finish()
    }
}

/// Payload of the context-consuming spec kind.
#[derive(Clone)]
pub struct LazySpec {
    name: String,
    func: ContextFn,
    bound: LazyArgs,
}

impl LazySpec {
    /// Display name given at construction
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Overrides bound by `copy`
    #[inline]
    #[must_use]
    pub fn bound(&self) -> &LazyArgs {
        &self.bound
    }
}

impl Debug for LazySpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySpec")
            .field("name", &self.name)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

/// How an unevaluated default produces its value.
#[derive(Clone, Debug)]
pub enum DependencySpec {
    /// Evaluate named siblings, call the function; never cached
    Args(ArgSpec),
    /// Hand the whole context to a closure; never cached
    Lazy(LazySpec),
    /// Evaluate named siblings, cache per sibling-value tuple
    Memo(ArgSpec),
}

impl DependencySpec {
    /// Argument-consuming spec: `func` receives the evaluated values of
    /// `expect_args` positionally and `expect_kw` by name.
    pub fn args<A, K>(func: Callable, expect_args: A, expect_kw: K) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        Self::Args(ArgSpec {
            func,
            expect_args: expect_args.into_iter().map(Into::into).collect(),
            expect_kw: expect_kw.into_iter().map(Into::into).collect(),
        })
    }

    /// Context-consuming spec: `func` receives the evaluation context and
    /// resolves whatever it needs. `name` identifies the spec in
    /// representations and diagnostics.
    pub fn lazy(
        name: impl Into<String>,
        func: impl Fn(&mut EvalContext, &LazyArgs) -> Result<Value, EvalError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self::Lazy(LazySpec {
            name: name.into(),
            func: Arc::new(func),
            bound: LazyArgs::default(),
        })
    }

    /// Memoized argument-consuming spec.
    pub fn memo<A, K>(func: Callable, expect_args: A, expect_kw: K) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        let Self::Args(inner) = Self::args(func, expect_args, expect_kw) else {
            unreachable!()
        };
        Self::Memo(inner)
    }

    /// Kind tag: `args`, `lazy` or `memo`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Args(_) => "args",
            Self::Lazy(_) => "lazy",
            Self::Memo(_) => "memo",
        }
    }

    /// Name of the underlying function (or the lazy display name).
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Args(s) | Self::Memo(s) => s.func().name(),
            Self::Lazy(s) => s.name(),
        }
    }

    /// Underlying callable, absent for context-consuming specs.
    #[must_use]
    pub fn func(&self) -> Option<&Callable> {
        match self {
            Self::Args(s) | Self::Memo(s) => Some(s.func()),
            Self::Lazy(_) => None,
        }
    }

    /// Argument-consuming payload, absent for context-consuming specs.
    #[must_use]
    pub fn arg_spec(&self) -> Option<&ArgSpec> {
        match self {
            Self::Args(s) | Self::Memo(s) => Some(s),
            Self::Lazy(_) => None,
        }
    }

    /// Context-consuming payload, if this is a lazy spec.
    #[must_use]
    pub fn lazy_spec(&self) -> Option<&LazySpec> {
        match self {
            Self::Lazy(s) => Some(s),
            _ => None,
        }
    }

    /// Defaults of the underlying callable (empty for context-consuming
    /// specs, whose parameters cannot be enumerated).
    #[must_use]
    pub fn default_kw(&self) -> IndexMap<String, Value> {
        match self {
            Self::Args(s) | Self::Memo(s) => s.func().default_kw(),
            Self::Lazy(_) => IndexMap::new(),
        }
    }

    /// Whether `name` can be bound on the underlying function.
    ///
    /// Context-consuming specs accept any name: their dependency set is not
    /// statically enumerable, which is the reason they exist.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        match self {
            Self::Args(s) | Self::Memo(s) => s.func().declares(name),
            Self::Lazy(_) => true,
        }
    }

    /// Derive a new spec whose underlying function is partially applied
    /// with `overrides`; `expect_args`/`expect_kw` are preserved.
    #[must_use]
    pub fn copy(&self, overrides: IndexMap<String, Value>) -> Self {
        match self {
            Self::Args(s) => Self::Args(ArgSpec {
                func: s.func.with_kwargs(overrides),
                expect_args: s.expect_args.clone(),
                expect_kw: s.expect_kw.clone(),
            }),
            Self::Memo(s) => Self::Memo(ArgSpec {
                func: s.func.with_kwargs(overrides),
                expect_args: s.expect_args.clone(),
                expect_kw: s.expect_kw.clone(),
            }),
            Self::Lazy(s) => {
                let mut bound = s.bound.clone();
                for (k, v) in overrides {
                    bound.bound.insert(k, v);
                }
                Self::Lazy(LazySpec {
                    name: s.name.clone(),
                    func: Arc::clone(&s.func),
                    bound,
                })
            }
        }
    }

    /// Produce the value for `key` inside `ctx`.
    ///
    /// Siblings are resolved depth-first through the context; re-entrant
    /// resolution of a shared sibling recomputes it unless the sibling is
    /// itself memoized.
    pub(crate) fn evaluate(&self, ctx: &mut EvalContext, key: &str) -> Result<Value, EvalError> {
        match self {
            Self::Args(s) => {
                let (args, kwargs) = s.resolve_siblings(ctx)?;
                s.func().call(args, kwargs)
            }
            Self::Lazy(s) => (s.func)(ctx, &s.bound),
            Self::Memo(s) => {
                let (args, kwargs) = s.resolve_siblings(ctx)?;
                let mut fingerprints = Vec::with_capacity(args.len() + kwargs.len());
                for v in args.iter().chain(kwargs.values()) {
                    fingerprints.push(repr::fingerprint(v));
                }
                let memo_key = MemoKey::new(key, fingerprints);
                if let Some(hit) = ctx.memo_get(&memo_key) {
                    tracing::trace!(key, "memo hit");
                    return Ok(hit);
                }
                let computed = s.func().call(args, kwargs)?;
                ctx.memo_insert(memo_key, computed.clone());
                Ok(computed)
            }
        }
    }
}
