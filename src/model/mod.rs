//! Model keys
//!
//! A model is whatever a caller wants to signal about. The engine never owns
//! models: it keys its bookkeeping by the model's identity and keeps only a
//! weak back-reference, so watching a model does not keep it alive.
//!
//! - Plain values (integers, strings, ...) have value identity.
//! - `Arc<T>` has object identity: two clones of the same `Arc` are the same
//!   model, two separately allocated `Arc`s never are, even if equal.

#[cfg(test)]
mod model_test;

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::Weak;

use crate::HasDerivedValue;

/// A value usable as a signal key.
pub trait ModelKey: Clone + Send + Sync + 'static {
    /// Identity of the model. Equal ids mean the same model.
    type Id: Hash + Eq + Clone + Debug + Send + Sync + 'static;

    /// Non-owning back-reference held by registries.
    type WeakRef: Send + Sync + 'static;

    fn id(&self) -> Self::Id;

    fn downgrade(&self) -> Self::WeakRef;

    /// Returns the model if it is still reachable from somewhere else.
    fn upgrade(weak: &Self::WeakRef) -> Option<Self>;
}

/// Object identity of an `Arc` allocation.
///
/// Registries hold a `Weak` next to every `ObjectId`, which keeps the
/// allocation reserved, so an address is never reused for a different model
/// while it is still being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn of<T: ?Sized>(object: &Arc<T>) -> Self {
        ObjectId(Arc::as_ptr(object) as *const () as usize)
    }
}

impl<T> ModelKey for Arc<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    type Id = ObjectId;
    type WeakRef = Weak<T>;

    fn id(&self) -> ObjectId {
        ObjectId::of(self)
    }

    fn downgrade(&self) -> Weak<T> {
        Arc::downgrade(self)
    }

    fn upgrade(weak: &Weak<T>) -> Option<Self> {
        weak.upgrade()
    }
}

// Plain `Arc` objects are terminal: they resolve to themselves.
impl<T> HasDerivedValue for Arc<T> where T: ?Sized + Send + Sync + 'static {}

macro_rules! value_model_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ModelKey for $ty {
                type Id = $ty;
                type WeakRef = $ty;

                fn id(&self) -> $ty {
                    self.clone()
                }

                fn downgrade(&self) -> $ty {
                    self.clone()
                }

                fn upgrade(weak: &$ty) -> Option<Self> {
                    Some(weak.clone())
                }
            }

            impl HasDerivedValue for $ty {}
        )*
    };
}

value_model_key!(
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    String,
    &'static str,
);
