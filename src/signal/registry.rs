use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::DispatchError;
use crate::ModelKey;
use crate::Result;

/// Callback notified with the resolved model.
pub type Handler<K> = Arc<dyn Fn(K) + Send + Sync>;

/// Opaque handle returned by `attach`, consumed by `detach`.
///
/// Tokens increase monotonically within one engine and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u64);

impl fmt::Display for Token {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "signal#{}", self.0)
    }
}

/// Handlers of one model, ordered by token, i.e. by attachment.
struct ModelHandlers<K: ModelKey> {
    model: K::WeakRef,
    handlers: BTreeMap<Token, Handler<K>>,
}

/// State unlinked from the registry by `detach` or `prune`.
///
/// Dropping it may run handler or model destructors, which are free to call
/// back into the engine, so it must be dropped after the engine lock is
/// released.
pub(crate) struct Unlinked<K: ModelKey> {
    models: Vec<K::WeakRef>,
    _handlers: Vec<Handler<K>>,
}

impl<K: ModelKey> Unlinked<K> {
    fn new() -> Self {
        Self {
            models: Vec::new(),
            _handlers: Vec::new(),
        }
    }

    /// Number of model entries removed.
    pub(crate) fn model_count(&self) -> usize {
        self.models.len()
    }
}

/// Model → handlers, plus token → model for detachment.
///
/// The model map never keeps a model alive: it holds the model's identity
/// and weak reference only.
pub(crate) struct HandlerRegistry<K: ModelKey> {
    models: HashMap<K::Id, ModelHandlers<K>>,
    tokens: HashMap<Token, K::Id>,
    next_token: u64,
}

impl<K: ModelKey> Default for HandlerRegistry<K> {
    fn default() -> Self {
        Self {
            models: HashMap::new(),
            tokens: HashMap::new(),
            next_token: 1,
        }
    }
}

impl<K: ModelKey> HandlerRegistry<K> {
    pub(crate) fn attach(
        &mut self,
        model: &K,
        handler: Handler<K>,
    ) -> Token {
        let token = Token(self.next_token);
        self.next_token += 1;

        let id = model.id();
        self.models
            .entry(id.clone())
            .or_insert_with(|| ModelHandlers {
                model: model.downgrade(),
                handlers: BTreeMap::new(),
            })
            .handlers
            .insert(token, handler);
        trace!(%token, model = ?id, "handler attached");
        self.tokens.insert(token, id);

        token
    }

    pub(crate) fn detach(
        &mut self,
        token: Token,
    ) -> Result<Unlinked<K>> {
        let id = self.tokens.remove(&token).ok_or(DispatchError::UnknownToken(token))?;
        let mut unlinked = Unlinked::new();

        // The entry may already be gone if its model was pruned.
        if let Some(entry) = self.models.get_mut(&id) {
            unlinked._handlers.extend(entry.handlers.remove(&token));
            if entry.handlers.is_empty() {
                if let Some(entry) = self.models.remove(&id) {
                    unlinked.models.push(entry.model);
                }
            }
        }
        trace!(%token, model = ?id, "handler detached");

        Ok(unlinked)
    }

    /// Snapshot of the handlers currently attached to `model`.
    pub(crate) fn handlers_for(
        &self,
        model: &K,
    ) -> Vec<Handler<K>> {
        self.models
            .get(&model.id())
            .map(|entry| entry.handlers.values().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn is_watched(
        &self,
        model: &K,
    ) -> bool {
        self.models.contains_key(&model.id())
    }

    pub(crate) fn handler_count(
        &self,
        model: &K,
    ) -> usize {
        self.models.get(&model.id()).map(|entry| entry.handlers.len()).unwrap_or(0)
    }

    pub(crate) fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Drop entries whose model is no longer reachable. Their tokens stay
    /// valid until detached.
    pub(crate) fn prune(&mut self) -> Unlinked<K> {
        let unreachable: Vec<K::Id> = self
            .models
            .iter()
            .filter(|(_, entry)| K::upgrade(&entry.model).is_none())
            .map(|(id, _)| id.clone())
            .collect();

        let mut unlinked = Unlinked::new();
        for id in unreachable {
            if let Some(entry) = self.models.remove(&id) {
                unlinked._handlers.extend(entry.handlers.into_values());
                unlinked.models.push(entry.model);
            }
        }
        unlinked
    }
}
