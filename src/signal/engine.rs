//! Signal dispatch engine
//!
//! Callers mark a model as changed with [`SignalEngine::trigger`]; every
//! handler attached to that model is later called with the resolved model.
//! Triggers that arrive before the model is drained are coalesced into one
//! dispatch.
//!
//! # Drain loop
//!
//! ```text
//! trigger(model) ──► dirty set ──(idle? spawn)──► drain task
//!                                                   │ every turn:
//!                                                   │  take ≤ rate models
//!                                                   │  snapshot handlers
//!                                                   ▼
//!                                      one task per handler: handler(resolve(model))
//! ```
//!
//! The drain task keeps ticking until a tick finds the dirty set empty,
//! and only then disarms. Arming and disarming happen under the same lock
//! as `trigger`, so a trigger racing with the idle check is never lost.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;
use tracing::warn;
use tracing::Instrument;

use super::DirtySet;
use super::Handler;
use super::HandlerRegistry;
use super::Token;
use crate::async_task::next_turn;
use crate::async_task::spawn_handler;
use crate::DispatchConfig;
use crate::DispatchError;
use crate::Error;
use crate::HasDerivedValue;
use crate::ModelKey;
use crate::Rate;
use crate::Result;

/// Outcome of one drain tick, broadcast to [`SignalEngine::subscribe_ticks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport<Id> {
    /// Tick sequence number, starting at 1 for the engine's first tick
    pub tick: u64,
    /// Models drained this tick, in drain order
    pub drained: Vec<Id>,
    /// Handler invocations spawned this tick
    pub dispatched: usize,
}

impl<Id> TickReport<Id> {
    /// An idle tick found nothing pending and disarmed the loop.
    pub fn is_idle(&self) -> bool {
        self.drained.is_empty()
    }
}

/// One drained model with its handler snapshot.
pub(crate) struct Dispatch<K: ModelKey> {
    pub(crate) model: K,
    pub(crate) handlers: Vec<Handler<K>>,
}

/// Everything mutated by public operations and by the drain task.
pub(crate) struct DispatchState<K: ModelKey> {
    pub(crate) registry: HandlerRegistry<K>,
    pub(crate) dirty: DirtySet<K>,
    pub(crate) rate: Rate,
    pub(crate) armed: bool,
    pub(crate) shut_down: bool,
    pub(crate) tick: u64,
}

impl<K: ModelKey> DispatchState<K> {
    pub(crate) fn new(rate: Rate) -> Self {
        Self {
            registry: HandlerRegistry::default(),
            dirty: DirtySet::default(),
            rate,
            armed: false,
            shut_down: false,
            tick: 0,
        }
    }

    /// Mark `model` dirty. Returns true if the drain task must be spawned.
    pub(crate) fn mark_dirty(
        &mut self,
        model: &K,
    ) -> bool {
        if self.shut_down || !self.registry.is_watched(model) {
            return false;
        }
        self.dirty.insert(model);

        if self.armed {
            return false;
        }
        self.armed = true;
        true
    }

    /// Stop accepting triggers and disarm. Returns the models that were
    /// pending, to be dropped once the lock is released.
    pub(crate) fn close(&mut self) -> DirtySet<K> {
        self.shut_down = true;
        self.armed = false;
        std::mem::take(&mut self.dirty)
    }

    /// Take the next batch. `None` means the dirty set was empty and the
    /// loop is now disarmed.
    pub(crate) fn next_batch(&mut self) -> Option<Vec<Dispatch<K>>> {
        self.tick += 1;

        let size = self.rate.batch_size(self.dirty.len());
        if size == 0 {
            self.armed = false;
            return None;
        }

        let batch = self
            .dirty
            .take(size)
            .into_iter()
            .map(|model| Dispatch {
                handlers: self.registry.handlers_for(&model),
                model,
            })
            .collect();
        Some(batch)
    }
}

struct EngineInner<K: HasDerivedValue> {
    state: Mutex<DispatchState<K>>,
    config: DispatchConfig,
    runtime: Handle,
    shutdown: CancellationToken,
    ticks: broadcast::Sender<TickReport<K::Id>>,
}

/// Change-notification bus keyed by models of type `K`.
///
/// Cloning is cheap and every clone drives the same engine. Independent
/// engines share nothing.
pub struct SignalEngine<K: HasDerivedValue> {
    inner: Arc<EngineInner<K>>,
}

impl<K: HasDerivedValue> Clone for SignalEngine<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: HasDerivedValue> SignalEngine<K> {
    /// Create an engine driven by the current tokio runtime.
    ///
    /// # Errors
    /// `DispatchError::RuntimeUnavailable` outside of a runtime.
    pub fn new(config: DispatchConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| DispatchError::RuntimeUnavailable)?;
        Ok(Self::with_handle(runtime, config))
    }

    /// Create an engine whose drain loop and handlers run on `runtime`.
    pub fn with_handle(
        runtime: Handle,
        config: DispatchConfig,
    ) -> Self {
        let (ticks, _) = broadcast::channel(config.tick_report_capacity.max(1));
        Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(DispatchState::new(config.rate)),
                config,
                runtime,
                shutdown: CancellationToken::new(),
                ticks,
            }),
        }
    }

    /// Attach `handler` to `model`. The returned token detaches it again.
    pub fn attach<F>(
        &self,
        model: &K,
        handler: F,
    ) -> Token
    where
        F: Fn(K) + Send + Sync + 'static,
    {
        self.inner.state.lock().registry.attach(model, Arc::new(handler))
    }

    /// Detach the handler registered under `token`.
    ///
    /// Invocations already snapshotted by a drain tick still run. The
    /// handler itself is dropped after the engine lock is released, so its
    /// destructor may use the engine.
    ///
    /// # Errors
    /// `DispatchError::UnknownToken` if the token was never issued by this
    /// engine or was already detached. Nothing is modified in that case.
    pub fn detach(
        &self,
        token: Token,
    ) -> Result<()> {
        let unlinked = self.inner.state.lock().registry.detach(token)?;
        drop(unlinked);
        Ok(())
    }

    /// Signal that `model` changed.
    ///
    /// Never calls a handler directly: handlers run on later turns of the
    /// runtime. Models without handlers are ignored.
    pub fn trigger(
        &self,
        model: &K,
    ) {
        if self.inner.shutdown.is_cancelled() {
            warn!(model = ?model.id(), "trigger ignored, signal engine is shut down");
            return;
        }

        let arm = self.inner.state.lock().mark_dirty(model);
        if arm {
            trace!(model = ?model.id(), "arming drain loop");
            self.inner
                .runtime
                .spawn(drain_loop(self.inner.clone()).in_current_span());
        }
    }

    /// Change how many models are drained per tick, from the next tick on.
    ///
    /// Accepts a [`Rate`], a positive integer, `f64::INFINITY`, or
    /// `"unbounded"`.
    ///
    /// # Errors
    /// `DispatchError::InvalidRate` for zero, negative or fractional values.
    /// The current rate is kept.
    pub fn set_rate<R>(
        &self,
        rate: R,
    ) -> Result<()>
    where
        R: TryInto<Rate>,
        Error: From<R::Error>,
    {
        let rate = rate.try_into()?;
        self.inner.state.lock().rate = rate;
        debug!(%rate, "dispatch rate updated");
        Ok(())
    }

    pub fn rate(&self) -> Rate {
        self.inner.state.lock().rate
    }

    /// True while a drain task is scheduled.
    pub fn is_armed(&self) -> bool {
        self.inner.state.lock().armed
    }

    /// Number of models waiting for a drain tick.
    pub fn pending(&self) -> usize {
        self.inner.state.lock().dirty.len()
    }

    pub fn handler_count(
        &self,
        model: &K,
    ) -> usize {
        self.inner.state.lock().registry.handler_count(model)
    }

    /// Number of models with at least one handler.
    pub fn watched_model_count(&self) -> usize {
        self.inner.state.lock().registry.model_count()
    }

    /// Drop registry entries whose model is no longer reachable.
    pub fn prune(&self) -> usize {
        let unlinked = self.inner.state.lock().registry.prune();
        unlinked.model_count()
    }

    /// Receive a [`TickReport`] for every drain tick from now on.
    pub fn subscribe_ticks(&self) -> broadcast::Receiver<TickReport<K::Id>> {
        self.inner.ticks.subscribe()
    }

    /// Stop the drain loop and drop pending models. Later triggers are
    /// ignored; attach and detach keep working.
    pub fn shutdown(&self) {
        let pending = self.inner.state.lock().close();
        self.inner.shutdown.cancel();
        drop(pending);
        debug!("signal engine shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }
}

async fn drain_loop<K: HasDerivedValue>(inner: Arc<EngineInner<K>>) {
    let interval = inner.config.tick_interval();

    loop {
        tokio::select! {
            biased;
            _ = inner.shutdown.cancelled() => {
                inner.state.lock().armed = false;
                debug!("drain loop cancelled");
                return;
            }
            _ = next_turn(interval) => {}
        }

        if !drain_tick(&inner) {
            return;
        }
    }
}

/// Run one tick. Returns false once the loop has disarmed.
fn drain_tick<K: HasDerivedValue>(inner: &EngineInner<K>) -> bool {
    let (tick, batch, pruned) = {
        let mut state = inner.state.lock();
        let batch = state.next_batch();
        let pruned = match batch {
            None if inner.config.prune_on_idle => Some(state.registry.prune()),
            _ => None,
        };
        (state.tick, batch, pruned)
    };

    if let Some(pruned) = pruned {
        if pruned.model_count() > 0 {
            debug!(pruned = pruned.model_count(), "pruned unreachable models");
        }
    }

    let Some(batch) = batch else {
        trace!(tick, "dirty set empty, drain loop disarmed");
        let _ = inner.ticks.send(TickReport {
            tick,
            drained: Vec::new(),
            dispatched: 0,
        });
        return false;
    };

    let mut drained = Vec::with_capacity(batch.len());
    let mut dispatched = 0;
    for Dispatch { model, handlers } in batch {
        drained.push(model.id());
        dispatched += handlers.len();
        for handler in handlers {
            spawn_handler(&inner.runtime, model.clone(), handler);
        }
    }
    trace!(tick, models = drained.len(), dispatched, "drain tick");

    let _ = inner.ticks.send(TickReport {
        tick,
        drained,
        dispatched,
    });
    true
}
