//! Shared helpers for unit tests: a model type that can derive values and
//! form derivation cycles, plus small runtime utilities.
use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;

use crate::HasDerivedValue;
use crate::ModelKey;
use crate::ObjectId;

/// A model that is either a plain number or an object which may derive
/// another model.
#[derive(Clone)]
pub(crate) enum TestModel {
    Number(i64),
    Object(Arc<TestObject>),
}

#[derive(Default)]
pub(crate) struct TestObject {
    derives_to: Mutex<Option<TestModel>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum TestModelId {
    Number(i64),
    Object(ObjectId),
}

pub(crate) enum WeakTestModel {
    Number(i64),
    Object(Weak<TestObject>),
}

impl TestModel {
    pub(crate) fn object() -> Self {
        TestModel::Object(Arc::new(TestObject::default()))
    }

    /// Make this object derive `target`. Panics on numbers.
    pub(crate) fn derive_to(
        &self,
        target: TestModel,
    ) {
        match self {
            TestModel::Object(object) => *object.derives_to.lock() = Some(target),
            TestModel::Number(_) => panic!("numbers cannot derive"),
        }
    }
}

// Objects may form derivation cycles, so only the identity is printed.
impl std::fmt::Debug for TestModel {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{:?}", self.id())
    }
}

impl PartialEq for TestModel {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.id() == other.id()
    }
}

impl ModelKey for TestModel {
    type Id = TestModelId;
    type WeakRef = WeakTestModel;

    fn id(&self) -> TestModelId {
        match self {
            TestModel::Number(n) => TestModelId::Number(*n),
            TestModel::Object(object) => TestModelId::Object(ObjectId::of(object)),
        }
    }

    fn downgrade(&self) -> WeakTestModel {
        match self {
            TestModel::Number(n) => WeakTestModel::Number(*n),
            TestModel::Object(object) => WeakTestModel::Object(Arc::downgrade(object)),
        }
    }

    fn upgrade(weak: &WeakTestModel) -> Option<Self> {
        match weak {
            WeakTestModel::Number(n) => Some(TestModel::Number(*n)),
            WeakTestModel::Object(object) => object.upgrade().map(TestModel::Object),
        }
    }
}

impl HasDerivedValue for TestModel {
    fn derived_value(&self) -> Option<Self> {
        match self {
            TestModel::Number(_) => None,
            TestModel::Object(object) => object.derives_to.lock().clone(),
        }
    }
}

/// Let every runnable task finish. With a paused clock the sleep only
/// completes once the runtime has nothing else to do.
pub(crate) async fn flush() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
