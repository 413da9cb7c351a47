use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::error;
use tracing::Instrument;

use crate::resolve;
use crate::Handler;
use crate::HasDerivedValue;

/// Spawn one handler invocation as its own task.
///
/// The model is resolved inside the task, right before the call. A panic in
/// either step is caught and logged here, so it can never reach the drain
/// loop or the sibling handlers of the same batch. The task inherits the
/// caller's span.
pub(crate) fn spawn_handler<K>(
    runtime: &Handle,
    model: K,
    handler: Handler<K>,
) -> JoinHandle<()>
where
    K: HasDerivedValue,
{
    runtime.spawn(async move {
        let id = model.id();
        let outcome = AssertUnwindSafe(async move { handler(resolve(model)) })
            .catch_unwind()
            .await;

        if let Err(panic) = outcome {
            error!(model = ?id, "signal handler panicked: {}", panic_message(panic.as_ref()));
        }
    }
    .in_current_span())
}

/// Wait for the next turn of the runtime: a plain yield for a zero
/// interval, a timer otherwise.
pub(crate) async fn next_turn(interval: Duration) {
    if interval.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(interval).await;
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
