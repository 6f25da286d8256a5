//! Error types for configuration evaluation
//!
//! All failures surface synchronously at the point of detection; nothing is
//! retried or suppressed. Configuration assembly is expected to fail fast.

/// Errors raised while resolving declared parameters or invoking callables.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
    /// Resolution referenced a name absent from the declared mapping
    #[error("unknown parameter: '{0}'")]
    UnknownParameter(String),

    /// A key's resolution path revisited the key before completing
    #[error("cyclic dependency: {path}")]
    CyclicDependency {
        /// The resolution chain, ending at the revisited key
        path: String,
    },

    /// Call-site positional count exceeds what the callable accepts
    #[error("too many positional arguments: got {got}, callable accepts {required}")]
    TooManyPositionalArguments {
        /// Positional arguments supplied
        got: usize,
        /// Positional slots the callable can bind
        required: usize,
    },

    /// A body asked for an argument the call did not provide
    #[error("missing argument: '{0}'")]
    MissingArgument(String),

    /// A body asked for an argument under the wrong type
    #[error("type mismatch for '{key}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Argument name
        key: String,
        /// Type the accessor asked for
        expected: &'static str,
        /// Type actually bound
        actual: &'static str,
    },
}

impl EvalError {
    /// Cyclic-dependency error for a resolution chain
    pub fn cycle<I, S>(chain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let path = chain
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::CyclicDependency { path }
    }

    /// Type-mismatch error for an argument accessor
    pub fn type_mismatch(
        key: impl Into<String>,
        expected: &'static str,
        actual: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected,
            actual,
        }
    }
}
