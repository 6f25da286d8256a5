//! Runtime values and the explicit callable model
//!
//! Configuration parameters are dynamically shaped, so the engine works over
//! a tagged [`Value`] union. Callables are declared explicitly through
//! [`Function::builder`] (name, ordered parameters, defaults) rather than
//! recovered by reflection, which keeps parameter lists stable under
//! refactoring and makes representations deterministic.

use crate::error::EvalError;
use crate::spec::DependencySpec;
use indexmap::IndexMap;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

/// Body of a native function: receives fully-bound keyword arguments.
pub type NativeFn = Arc<dyn Fn(&CallArgs) -> Result<Value, EvalError> + Send + Sync>;

/// A configuration value.
///
/// Data variants compare structurally; [`Value::Callable`] and
/// [`Value::Spec`] compare by pointer identity, since two independently
/// built closures are never interchangeable.
#[derive(Clone)]
pub enum Value {
    /// Absent / explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// String
    Str(String),
    /// Ordered list
    List(Vec<Value>),
    /// Ordered string-keyed mapping
    Map(IndexMap<String, Value>),
    /// Invokable value (function or partial application)
    Callable(Callable),
    /// Declared-but-unevaluated default
    Spec(Arc<DependencySpec>),
}

impl Value {
    /// Wrap a dependency spec as a declarable default value.
    #[must_use]
    pub fn spec(spec: DependencySpec) -> Self {
        Self::Spec(Arc::new(spec))
    }

    /// Short type tag used in error messages and diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Callable(_) => "callable",
            Self::Spec(_) => "spec",
        }
    }

    /// The callable behind this value, if it is one.
    #[must_use]
    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Self::Callable(c) => Some(c),
            _ => None,
        }
    }

    /// The dependency spec behind this value, if it is one.
    #[must_use]
    pub fn as_spec(&self) -> Option<&Arc<DependencySpec>> {
        match self {
            Self::Spec(s) => Some(s),
            _ => None,
        }
    }

    /// True for values that carry a dependency spec.
    #[must_use]
    pub fn is_spec(&self) -> bool {
        matches!(self, Self::Spec(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Callable(a), Self::Callable(b)) => a.ptr_eq(b),
            (Self::Spec(a), Self::Spec(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Int(v) => write!(f, "Int({v})"),
            Self::Float(v) => write!(f, "Float({v})"),
            Self::Str(v) => write!(f, "Str({v:?})"),
            Self::List(v) => f.debug_tuple("List").field(v).finish(),
            Self::Map(v) => {
                let entries: Vec<_> = v.iter().collect();
                f.debug_tuple("Map").field(&entries).finish()
            }
            Self::Callable(c) => write!(f, "Callable({})", c.name()),
            Self::Spec(s) => write!(f, "Spec({}:{})", s.kind(), s.name()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
            Self::List(v) => {
                write!(f, "[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(v) => {
                write!(f, "{{")?;
                for (i, (k, item)) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {item}")?;
                }
                write!(f, "}}")
            }
            Self::Callable(c) => write!(f, "{}", c.name()),
            Self::Spec(s) => write!(f, "{}", s.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(v: IndexMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl From<Callable> for Value {
    fn from(v: Callable) -> Self {
        Self::Callable(v)
    }
}

impl From<DependencySpec> for Value {
    fn from(v: DependencySpec) -> Self {
        Self::spec(v)
    }
}

/// One declared parameter of a [`Function`].
#[derive(Clone, Debug)]
pub struct Param {
    name: String,
    default: Option<Value>,
}

impl Param {
    /// Declare a parameter, defaulted or required.
    #[must_use]
    pub fn new(name: impl Into<String>, default: Option<Value>) -> Self {
        Self {
            name: name.into(),
            default,
        }
    }

    /// Parameter name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared default, if any (may itself be a [`Value::Spec`])
    #[inline]
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// A named native function with an explicitly declared parameter list.
///
/// The qualified name (`module:function` by convention) identifies the
/// function in canonical representations, so it must be stable across
/// processes for representation determinism to hold.
#[derive(Clone)]
pub struct Function {
    name: String,
    params: Vec<Param>,
    body: NativeFn,
}

impl Function {
    /// Construct directly from a parameter list.
    pub fn new(
        name: impl Into<String>,
        params: Vec<Param>,
        body: impl Fn(&CallArgs) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            body: Arc::new(body),
        }
    }

    /// Start declaring a function.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> FunctionBuilder {
        FunctionBuilder {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Qualified name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered parameter declarations
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Bind arguments to the declared parameters and run the body.
    ///
    /// Positional arguments bind left to right; keyword arguments win over
    /// positional and defaults fill the rest. A keyword that matches no
    /// declared parameter is rejected.
    pub(crate) fn invoke(
        &self,
        args: &[Value],
        kwargs: &IndexMap<String, Value>,
    ) -> Result<Value, EvalError> {
        if args.len() > self.params.len() {
            return Err(EvalError::TooManyPositionalArguments {
                got: args.len(),
                required: self.params.len(),
            });
        }
        for key in kwargs.keys() {
            if !self.params.iter().any(|p| p.name == *key) {
                return Err(EvalError::UnknownParameter(key.clone()));
            }
        }
        let mut values = IndexMap::with_capacity(self.params.len());
        for (i, param) in self.params.iter().enumerate() {
            let value = kwargs
                .get(&param.name)
                .cloned()
                .or_else(|| args.get(i).cloned())
                .or_else(|| param.default.clone());
            match value {
                Some(v) => {
                    values.insert(param.name.clone(), v);
                }
                None => return Err(EvalError::MissingArgument(param.name.clone())),
            }
        }
        (self.body)(&CallArgs::new(values))
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Function`] declarations.
#[derive(Debug)]
pub struct FunctionBuilder {
    name: String,
    params: Vec<Param>,
}

impl FunctionBuilder {
    /// Declare a required parameter (no default).
    #[must_use]
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param::new(name, None));
        self
    }

    /// Declare a defaulted parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.params.push(Param::new(name, Some(default.into())));
        self
    }

    /// Attach the body and finish.
    #[must_use]
    pub fn build(
        self,
        body: impl Fn(&CallArgs) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Callable {
        debug_assert!(
            {
                let mut names: Vec<_> = self.params.iter().map(Param::name).collect();
                names.sort_unstable();
                names.windows(2).all(|w| w[0] != w[1])
            },
            "duplicate parameter name in function '{}'",
            self.name
        );
        Callable::Function(Arc::new(Function::new(self.name, self.params, body)))
    }
}

/// A partial application layer over a callable.
///
/// Value semantics: a partial never mutates its target; deriving one always
/// yields a new object. Call-site keywords win over partial keywords.
#[derive(Clone)]
pub struct Partial {
    target: Callable,
    args: Vec<Value>,
    kwargs: IndexMap<String, Value>,
}

impl Partial {
    /// Apply positional and keyword arguments over `target`.
    #[must_use]
    pub fn new(target: Callable, args: Vec<Value>, kwargs: IndexMap<String, Value>) -> Self {
        Self {
            target,
            args,
            kwargs,
        }
    }

    /// The callable this layer wraps
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Callable {
        &self.target
    }

    /// Positional arguments applied by this layer
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Keyword arguments applied by this layer
    #[inline]
    #[must_use]
    pub fn kwargs(&self) -> &IndexMap<String, Value> {
        &self.kwargs
    }
}

impl Debug for Partial {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partial")
            .field("target", &self.target.name())
            .field("args", &self.args)
            .field("kwargs", &self.kwargs)
            .finish()
    }
}

/// An invokable value: a declared function or a stack of partial
/// applications over one.
#[derive(Clone, Debug)]
pub enum Callable {
    /// A declared native function
    Function(Arc<Function>),
    /// A partial application layer
    Partial(Arc<Partial>),
}

impl Callable {
    /// Identity comparison (same function object / same partial object).
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Function(a), Self::Function(b)) => Arc::ptr_eq(a, b),
            (Self::Partial(a), Self::Partial(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The root function beneath any partial layers.
    #[must_use]
    pub fn function(&self) -> &Arc<Function> {
        let mut current = self;
        loop {
            match current {
                Self::Function(f) => return f,
                Self::Partial(p) => current = p.target(),
            }
        }
    }

    /// Qualified name of the root function.
    #[must_use]
    pub fn name(&self) -> &str {
        self.function().name()
    }

    /// Ordered names of every declared parameter.
    #[must_use]
    pub fn param_names(&self) -> Vec<String> {
        self.function()
            .params()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Whether the root function declares `name` as a parameter.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.function().params().iter().any(|p| p.name() == name)
    }

    /// Accumulated positional and keyword bindings across partial layers.
    ///
    /// Inner layers bind positionals first; outer layers override keywords.
    #[must_use]
    pub fn layers(&self) -> (Vec<Value>, IndexMap<String, Value>) {
        match self {
            Self::Function(_) => (Vec::new(), IndexMap::new()),
            Self::Partial(p) => {
                let (mut args, mut kwargs) = p.target().layers();
                args.extend(p.args().iter().cloned());
                for (k, v) in p.kwargs() {
                    kwargs.insert(k.clone(), v.clone());
                }
                (args, kwargs)
            }
        }
    }

    /// Effective defaults in declaration order.
    ///
    /// A parameter is defaulted if the function declares a default, a
    /// partial layer bound it positionally, or a partial layer bound it by
    /// keyword (keyword bindings win). Defaults may be unevaluated
    /// [`Value::Spec`] entries.
    #[must_use]
    pub fn default_kw(&self) -> IndexMap<String, Value> {
        let (args, kwargs) = self.layers();
        let mut defaults = IndexMap::new();
        for (i, param) in self.function().params().iter().enumerate() {
            let bound = kwargs
                .get(param.name())
                .cloned()
                .or_else(|| args.get(i).cloned())
                .or_else(|| param.default().cloned());
            if let Some(v) = bound {
                defaults.insert(param.name().to_string(), v);
            }
        }
        defaults
    }

    /// Names of parameters with no effective default, in declaration order.
    #[must_use]
    pub fn required_params(&self) -> Vec<String> {
        let (args, kwargs) = self.layers();
        self.function()
            .params()
            .iter()
            .enumerate()
            .filter(|(i, param)| {
                param.default().is_none()
                    && *i >= args.len()
                    && !kwargs.contains_key(param.name())
            })
            .map(|(_, param)| param.name().to_string())
            .collect()
    }

    /// Derive a new callable with extra keyword bindings.
    #[must_use]
    pub fn with_kwargs(&self, kwargs: IndexMap<String, Value>) -> Self {
        Self::Partial(Arc::new(Partial::new(self.clone(), Vec::new(), kwargs)))
    }

    /// Derive a new callable with extra positional bindings.
    #[must_use]
    pub fn with_args(&self, args: Vec<Value>) -> Self {
        Self::Partial(Arc::new(Partial::new(self.clone(), args, IndexMap::new())))
    }

    /// Invoke with positional and keyword arguments.
    ///
    /// Partial layers are flattened first; call-site keywords override
    /// layer keywords. This is a *plain* call: spec-valued defaults are
    /// passed through unevaluated (context-aware evaluation is the job of
    /// [`ConfigFn`](crate::ConfigFn)).
    pub fn call(
        &self,
        args: Vec<Value>,
        kwargs: IndexMap<String, Value>,
    ) -> Result<Value, EvalError> {
        let (mut all_args, mut merged) = self.layers();
        all_args.extend(args);
        for (k, v) in kwargs {
            merged.insert(k, v);
        }
        self.function().invoke(&all_args, &merged)
    }
}

/// Fully-bound keyword arguments handed to a function body.
#[derive(Clone, Debug)]
pub struct CallArgs {
    values: IndexMap<String, Value>,
}

impl CallArgs {
    /// Wrap a bound argument mapping.
    #[must_use]
    pub fn new(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }

    /// All bound arguments, in parameter order.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// The raw value bound to `key`.
    pub fn value(&self, key: &str) -> Result<&Value, EvalError> {
        self.values
            .get(key)
            .ok_or_else(|| EvalError::MissingArgument(key.to_string()))
    }

    /// Integer argument
    pub fn int(&self, key: &str) -> Result<i64, EvalError> {
        match self.value(key)? {
            Value::Int(v) => Ok(*v),
            other => Err(EvalError::type_mismatch(key, "int", other.type_name())),
        }
    }

    /// Float argument; integers widen.
    #[allow(clippy::cast_precision_loss)]
    pub fn float(&self, key: &str) -> Result<f64, EvalError> {
        match self.value(key)? {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            other => Err(EvalError::type_mismatch(key, "float", other.type_name())),
        }
    }

    /// String argument
    pub fn str(&self, key: &str) -> Result<&str, EvalError> {
        match self.value(key)? {
            Value::Str(v) => Ok(v),
            other => Err(EvalError::type_mismatch(key, "str", other.type_name())),
        }
    }

    /// Boolean argument
    pub fn bool(&self, key: &str) -> Result<bool, EvalError> {
        match self.value(key)? {
            Value::Bool(v) => Ok(*v),
            other => Err(EvalError::type_mismatch(key, "bool", other.type_name())),
        }
    }

    /// List argument
    pub fn list(&self, key: &str) -> Result<&[Value], EvalError> {
        match self.value(key)? {
            Value::List(v) => Ok(v),
            other => Err(EvalError::type_mismatch(key, "list", other.type_name())),
        }
    }

    /// Map argument
    pub fn map(&self, key: &str) -> Result<&IndexMap<String, Value>, EvalError> {
        match self.value(key)? {
            Value::Map(v) => Ok(v),
            other => Err(EvalError::type_mismatch(key, "map", other.type_name())),
        }
    }

    /// Callable argument
    pub fn callable(&self, key: &str) -> Result<&Callable, EvalError> {
        match self.value(key)? {
            Value::Callable(v) => Ok(v),
            other => Err(EvalError::type_mismatch(key, "callable", other.type_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    fn add() -> Callable {
        Function::builder("tests:add")
            .required("a")
            .param("b", 10)
            .build(|args| Ok(Value::Int(args.int("a")? + args.int("b")?)))
    }

    #[test]
    fn positional_and_default_binding() {
        let f = add();
        let out = f.call(vec![Value::Int(1)], IndexMap::new()).unwrap();
        assert_eq!(out, Value::Int(11));
    }

    #[test]
    fn keyword_wins_over_default() {
        let f = add();
        let out = f
            .call(vec![Value::Int(1)], indexmap! {"b".to_string() => Value::Int(2)})
            .unwrap();
        assert_eq!(out, Value::Int(3));
    }

    #[test]
    fn missing_required_argument() {
        let f = add();
        let err = f.call(Vec::new(), IndexMap::new()).unwrap_err();
        assert!(matches!(err, EvalError::MissingArgument(name) if name == "a"));
    }

    #[test]
    fn unknown_keyword_is_rejected() {
        let f = add();
        let err = f
            .call(
                vec![Value::Int(1)],
                indexmap! {"nope".to_string() => Value::Int(2)},
            )
            .unwrap_err();
        assert!(matches!(err, EvalError::UnknownParameter(name) if name == "nope"));
    }

    #[test]
    fn too_many_positionals() {
        let f = add();
        let err = f
            .call(
                vec![Value::Int(1), Value::Int(2), Value::Int(3)],
                IndexMap::new(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            EvalError::TooManyPositionalArguments { got: 3, required: 2 }
        ));
    }

    #[test]
    fn partial_kwargs_bind_and_call_site_wins() {
        let f = add().with_kwargs(indexmap! {"b".to_string() => Value::Int(100)});
        assert_eq!(
            f.call(vec![Value::Int(1)], IndexMap::new()).unwrap(),
            Value::Int(101)
        );
        assert_eq!(
            f.call(vec![Value::Int(1)], indexmap! {"b".to_string() => Value::Int(0)})
                .unwrap(),
            Value::Int(1)
        );
    }

    #[test]
    fn stacked_partials_prepend_positionals() {
        let f = add().with_args(vec![Value::Int(5)]);
        // "a" is bound by the layer; only "b" remains unbound.
        assert_eq!(f.required_params(), Vec::<String>::new());
        assert_eq!(f.call(Vec::new(), IndexMap::new()).unwrap(), Value::Int(15));
    }

    #[test]
    fn default_kw_reflects_partial_bindings() {
        let f = add();
        assert_eq!(f.default_kw(), indexmap! {"b".to_string() => Value::Int(10)});
        let g = f.with_kwargs(indexmap! {"a".to_string() => Value::Int(7)});
        assert_eq!(
            g.default_kw(),
            indexmap! {"a".to_string() => Value::Int(7), "b".to_string() => Value::Int(10)}
        );
        assert!(g.required_params().is_empty());
    }

    #[test]
    fn value_equality_is_structural_for_data() {
        assert_eq!(Value::from(1.5), Value::from(1.5));
        assert_eq!(
            Value::List(vec![Value::Int(1)]),
            Value::List(vec![Value::Int(1)])
        );
        let f = add();
        assert_eq!(Value::Callable(f.clone()), Value::Callable(f.clone()));
        assert_ne!(Value::Callable(f), Value::Callable(add()));
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(Value::from(0.1).to_string(), "0.1");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::from("x")]).to_string(),
            "[1, x]"
        );
    }
}
