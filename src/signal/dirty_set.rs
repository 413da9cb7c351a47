use std::collections::HashSet;
use std::collections::VecDeque;

use crate::ModelKey;

/// Models awaiting a drain tick, in first-triggered order.
///
/// Inserting a model that is already pending is a no-op and does not move
/// it to the back.
pub(crate) struct DirtySet<K: ModelKey> {
    order: VecDeque<K>,
    members: HashSet<K::Id>,
}

impl<K: ModelKey> Default for DirtySet<K> {
    fn default() -> Self {
        Self {
            order: VecDeque::new(),
            members: HashSet::new(),
        }
    }
}

impl<K: ModelKey> DirtySet<K> {
    /// Returns false if the model was already pending.
    pub(crate) fn insert(
        &mut self,
        model: &K,
    ) -> bool {
        if !self.members.insert(model.id()) {
            return false;
        }
        self.order.push_back(model.clone());
        true
    }

    /// Remove and return up to `n` models from the front.
    pub(crate) fn take(
        &mut self,
        n: usize,
    ) -> Vec<K> {
        let n = n.min(self.order.len());
        let batch: Vec<K> = self.order.drain(..n).collect();
        for model in &batch {
            self.members.remove(&model.id());
        }
        batch
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }
}
