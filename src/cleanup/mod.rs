//! Cleanup registry
//!
//! Associates models with callbacks that must run exactly once, for example
//! to detach signal handlers when a view of the model is torn down.
//! Callbacks run in registration order and are forgotten afterwards.


use dashmap::DashMap;
use tracing::debug;
use tracing::trace;

use crate::ModelKey;

type Cleanup = Box<dyn FnOnce() + Send + Sync>;

struct CleanupEntry<K: ModelKey> {
    model: K::WeakRef,
    callbacks: Vec<Cleanup>,
}

/// Model → ordered run-once callbacks.
///
/// Like the handler registry, entries hold only the model's identity and a
/// weak reference.
pub struct CleanupRegistry<K: ModelKey> {
    entries: DashMap<K::Id, CleanupEntry<K>>,
}

impl<K: ModelKey> Default for CleanupRegistry<K> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K: ModelKey> CleanupRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` to run on the next `run_and_forget(model)`.
    pub fn register<F>(
        &self,
        model: &K,
        callback: F,
    ) where
        F: FnOnce() + Send + Sync + 'static,
    {
        let id = model.id();
        trace!(model = ?id, "cleanup registered");
        self.entries
            .entry(id)
            .or_insert_with(|| CleanupEntry {
                model: model.downgrade(),
                callbacks: Vec::new(),
            })
            .callbacks
            .push(Box::new(callback));
    }

    /// Run every callback registered for `model`, in registration order,
    /// then forget them. Returns how many ran.
    ///
    /// The entry is removed before the first callback runs, so callbacks
    /// may register new cleanups; those wait for the next call.
    pub fn run_and_forget(
        &self,
        model: &K,
    ) -> usize {
        let Some((id, entry)) = self.entries.remove(&model.id()) else {
            return 0;
        };

        let count = entry.callbacks.len();
        for callback in entry.callbacks {
            callback();
        }
        debug!(model = ?id, count, "cleanups executed");

        count
    }

    /// Number of callbacks waiting for `model`.
    pub fn pending(
        &self,
        model: &K,
    ) -> usize {
        self.entries.get(&model.id()).map(|entry| entry.callbacks.len()).unwrap_or(0)
    }

    /// Forget callbacks of models that are no longer reachable, without
    /// running them.
    pub fn prune(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| K::upgrade(&entry.model).is_some());
        before - self.entries.len()
    }
}
