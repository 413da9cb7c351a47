#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Weak;
use std::time::Duration;

use d_signal::HasDerivedValue;
use d_signal::ModelKey;
use d_signal::ObjectId;
use parking_lot::Mutex;

/// A named node that may forward to another node, like a proxy standing in
/// for the object it wraps.
#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

pub struct NodeInner {
    name: String,
    forward: Mutex<Option<Node>>,
}

impl Node {
    pub fn new(name: &str) -> Self {
        Node(Arc::new(NodeInner {
            name: name.to_string(),
            forward: Mutex::new(None),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn forward_to(
        &self,
        target: &Node,
    ) {
        *self.0.forward.lock() = Some(target.clone());
    }
}

impl std::fmt::Debug for Node {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "Node({})", self.0.name)
    }
}

impl ModelKey for Node {
    type Id = ObjectId;
    type WeakRef = Weak<NodeInner>;

    fn id(&self) -> ObjectId {
        ObjectId::of(&self.0)
    }

    fn downgrade(&self) -> Weak<NodeInner> {
        Arc::downgrade(&self.0)
    }

    fn upgrade(weak: &Weak<NodeInner>) -> Option<Self> {
        weak.upgrade().map(Node)
    }
}

impl HasDerivedValue for Node {
    fn derived_value(&self) -> Option<Self> {
        self.0.forward.lock().clone()
    }
}

/// Collects the names of the nodes a handler was called with.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn handler(&self) -> impl Fn(Node) + Send + Sync + 'static {
        let calls = self.calls.clone();
        move |node: Node| calls.lock().push(node.name().to_string())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

/// Let every runnable task finish. Requires a paused clock.
pub async fn flush() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
