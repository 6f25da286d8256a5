//! LazyKW variation expansion
//!
//! Tag selected configuration keys as *variation lists* and expand the
//! tagged mapping into the cartesian product of concrete configurations —
//! one per combination — for running a computation across many
//! configurations (hyper-parameter sweeps and the like).
//!
//! # Core Concepts
//!
//! - [`Setting`]: a scalar override or a tagged list of candidate values
//! - [`expand`]: cartesian product over the tagged lists, merged with the
//!   untagged scalars
//! - [`expand_labeled`]: the same expansion with a `-`-joined label per
//!   combination, for naming sweep runs
//!
//! # Example
//!
//! ```rust
//! use indexmap::indexmap;
//! use lazykw_core::Value;
//! use lazykw_vary::{expand, Setting};
//!
//! let configs = expand(&indexmap! {
//!     "lr".to_string() => Setting::many([Value::from(0.1), Value::from(0.01)]),
//!     "seed".to_string() => Setting::from(Value::Int(0)),
//! });
//! assert_eq!(configs.len(), 2);
//! assert_eq!(configs[0]["lr"], Value::from(0.1));
//! assert_eq!(configs[0]["seed"], Value::Int(0));
//! ```

use indexmap::IndexMap;
use lazykw_core::Value;

/// One configuration entry: a concrete override, or a tagged list of
/// candidates to sweep over.
#[derive(Clone, Debug, PartialEq)]
pub enum Setting {
    /// A single concrete value
    One(Value),
    /// An ordered list of candidate values to expand over
    Many(Vec<Value>),
}

impl Setting {
    /// Tag an ordered list of candidates as a variation.
    #[must_use]
    pub fn many(values: impl IntoIterator<Item = Value>) -> Self {
        Self::Many(values.into_iter().collect())
    }

    /// True for tagged variation lists.
    #[inline]
    #[must_use]
    pub fn is_variation(&self) -> bool {
        matches!(self, Self::Many(_))
    }
}

impl From<Value> for Setting {
    fn from(value: Value) -> Self {
        Self::One(value)
    }
}

/// Split a tagged mapping into its variation lists and its scalar
/// overrides, each preserving declaration order.
#[must_use]
pub fn separate_variations(
    settings: &IndexMap<String, Setting>,
) -> (IndexMap<String, Vec<Value>>, IndexMap<String, Value>) {
    let mut variations = IndexMap::new();
    let mut common = IndexMap::new();
    for (key, setting) in settings {
        match setting {
            Setting::Many(values) => {
                variations.insert(key.clone(), values.clone());
            }
            Setting::One(value) => {
                common.insert(key.clone(), value.clone());
            }
        }
    }
    (variations, common)
}

/// Expand a tagged mapping into one concrete configuration per combination
/// of the variation lists.
///
/// Combination order is the declaration order of the tagged keys, the last
/// key's list cycling fastest. Every produced mapping carries that
/// combination's values merged with the untagged scalars. With no tagged
/// entries the result is exactly one mapping — the scalars alone — never an
/// empty sequence; the count is always the product of the list lengths.
#[must_use]
pub fn expand(settings: &IndexMap<String, Setting>) -> Vec<IndexMap<String, Value>> {
    let (variations, common) = separate_variations(settings);
    combinations(&variations)
        .into_iter()
        .map(|mut combo| {
            for (key, value) in &common {
                combo.insert(key.clone(), value.clone());
            }
            combo
        })
        .collect()
}

/// [`expand`] plus a `-`-joined label per combination (`"0.1-32"`), the
/// conventional naming scheme for sweep runs.
#[must_use]
pub fn expand_labeled(
    settings: &IndexMap<String, Setting>,
) -> Vec<(String, IndexMap<String, Value>)> {
    let (variations, common) = separate_variations(settings);
    combinations(&variations)
        .into_iter()
        .map(|mut combo| {
            let label = combo
                .values()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("-");
            for (key, value) in &common {
                combo.insert(key.clone(), value.clone());
            }
            (label, combo)
        })
        .collect()
}

/// Cartesian product over the variation lists, rightmost key fastest.
fn combinations(variations: &IndexMap<String, Vec<Value>>) -> Vec<IndexMap<String, Value>> {
    let lengths: Vec<usize> = variations.values().map(Vec::len).collect();
    let total: usize = lengths.iter().product();
    let mut out = Vec::with_capacity(total);
    for mut n in 0..total {
        let mut combo = IndexMap::with_capacity(variations.len());
        // Mixed-radix decode, least significant digit last.
        let mut indices = vec![0usize; lengths.len()];
        for (slot, len) in lengths.iter().enumerate().rev() {
            indices[slot] = n % len;
            n /= len;
        }
        for (slot, (key, values)) in variations.iter().enumerate() {
            combo.insert(key.clone(), values[indices[slot]].clone());
        }
        out.push(combo);
    }
    out
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
