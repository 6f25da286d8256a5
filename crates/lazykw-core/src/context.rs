//! The evaluation context
//!
//! Holds the declared parameter mapping and the memo cache, and resolves
//! keys to concrete values by interpreting [`DependencySpec`] entries.
//! Single-threaded by design: one context per configuration call, never
//! shared across concurrent callers without external serialization.

use crate::error::EvalError;
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Memo-cache key: parameter name plus the canonical fingerprints of its
/// evaluated sibling values.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemoKey {
    key: String,
    siblings: Vec<String>,
}

impl MemoKey {
    /// Build a key for `key` from already-fingerprinted sibling values.
    #[must_use]
    pub fn new(key: impl Into<String>, siblings: Vec<String>) -> Self {
        Self {
            key: key.into(),
            siblings,
        }
    }
}

/// Mutable mapping of declared values plus a per-key memo cache.
///
/// Resolving a key is deterministic for a fixed `declared` snapshot and
/// fixed sibling values: argument- and context-consuming specs recompute
/// after any sibling change, while memoized specs cache per distinct
/// sibling-value tuple.
#[derive(Debug, Default)]
pub struct EvalContext {
    declared: IndexMap<String, Value>,
    memo: HashMap<MemoKey, Value>,
    resolving: Vec<String>,
}

impl EvalContext {
    /// Context seeded from a callable's defaulted parameters.
    #[must_use]
    pub fn new(defaults: IndexMap<String, Value>) -> Self {
        Self {
            declared: defaults,
            memo: HashMap::new(),
            resolving: Vec::new(),
        }
    }

    /// Replace or add declared entries.
    ///
    /// Later updates fully replace a prior entry for the same key. The memo
    /// cache is untouched: memoized specs re-derive their sibling tuple on
    /// every resolve, so entries keyed by superseded sibling values simply
    /// stop matching.
    pub fn update(&mut self, overrides: IndexMap<String, Value>) {
        for (key, value) in overrides {
            tracing::trace!(key = %key, "declare");
            self.declared.insert(key, value);
        }
    }

    /// Replace or add a single declared entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.declared.insert(key.into(), value.into());
    }

    /// Declared mapping, in declaration order.
    #[inline]
    #[must_use]
    pub fn declared(&self) -> &IndexMap<String, Value> {
        &self.declared
    }

    /// Whether `key` is declared.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.declared.contains_key(key)
    }

    /// The declared entry for `key`, unevaluated.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.declared.get(key)
    }

    /// Number of memoized entries (test observability).
    #[inline]
    #[must_use]
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Resolve `key` to a concrete value.
    ///
    /// Plain declared values are returned verbatim. Spec entries evaluate
    /// their dependencies depth-first through re-entrant `resolve` calls;
    /// nothing is deduplicated beyond the memo cache, so a sibling shared by
    /// two non-memoized specs is computed twice. A resolution chain that
    /// revisits a key fails with [`EvalError::CyclicDependency`].
    pub fn resolve(&mut self, key: &str) -> Result<Value, EvalError> {
        let entry = match self.declared.get(key) {
            Some(v) => v.clone(),
            None => return Err(EvalError::UnknownParameter(key.to_string())),
        };
        let spec = match entry {
            Value::Spec(spec) => spec,
            plain => return Ok(plain),
        };
        if self.resolving.iter().any(|k| k == key) {
            let chain = self
                .resolving
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(key));
            return Err(EvalError::cycle(chain));
        }
        tracing::trace!(key, kind = spec.kind(), "resolve");
        self.resolving.push(key.to_string());
        let result = spec.evaluate(self, key);
        self.resolving.pop();
        if let Err(err) = &result {
            tracing::debug!(key, %err, "resolve failed");
        }
        result
    }

    pub(crate) fn memo_get(&self, key: &MemoKey) -> Option<Value> {
        self.memo.get(key).cloned()
    }

    pub(crate) fn memo_insert(&mut self, key: MemoKey, value: Value) {
        self.memo.insert(key, value);
    }
}
