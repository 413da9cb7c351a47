//! Value resolution
//!
//! A model may stand for some other value: a lazily computed view, a proxy,
//! a wrapper around the "real" state. Handlers receive the resolved value,
//! obtained by following the derivation chain until it ends or loops.


use std::collections::HashSet;

use tracing::trace;

use crate::ModelKey;

/// Capability of a value to derive another value from itself.
///
/// The default implementation derives nothing, which makes the value
/// terminal: `resolve` hands it back unchanged.
pub trait HasDerivedValue: ModelKey {
    /// Returns the value this one stands for, or `None` if it is terminal.
    fn derived_value(&self) -> Option<Self> {
        None
    }
}

/// Follow `derived_value` until a terminal value or a cycle is reached.
///
/// On a cycle the value whose identity was already seen is returned, so a
/// chain `v -> a -> b -> a` resolves to `a`. Time and memory are linear in
/// the length of the chain.
pub fn resolve<V: HasDerivedValue>(value: V) -> V {
    let mut seen = HashSet::new();
    let mut current = value;

    loop {
        if !seen.insert(current.id()) {
            trace!(model = ?current.id(), depth = seen.len(), "derivation cycle detected");
            return current;
        }

        match current.derived_value() {
            Some(next) => current = next,
            None => return current,
        }
    }
}
