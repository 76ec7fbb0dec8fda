use std::{future::Future, sync::Arc, time::Duration};

use futures::{channel::oneshot, future::BoxFuture, pin_mut, select, FutureExt};
use tokio::task::JoinHandle;

type Sink<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

struct Pending {
    guard: oneshot::Receiver<()>,
    task: JoinHandle<()>,
}

/// Coalesces bursts of values into a single write, performed once no new
/// value arrived for the quiet period.
///
/// The pending write is a spawned task racing its timer against a guard held
/// here: dropping the guard (by rescheduling, cancelling or dropping the
/// debouncer) disarms it. Writes never overlap: each one first waits for the
/// write scheduled before it.
pub struct Debouncer<T> {
    quiet: Duration,
    sink: Sink<T>,
    pending: Option<Pending>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Must be used from within a tokio runtime
    pub fn new<F, Fut>(quiet: Duration, sink: F) -> Debouncer<T>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Debouncer {
            quiet,
            sink: Arc::new(move |v| sink(v).boxed()),
            pending: None,
        }
    }

    /// Arm a write of `value`, replacing any write still pending
    pub fn schedule(&mut self, value: T) {
        let previous = self.pending.take().map(|p| p.task);
        let (mut guard, pending) = oneshot::channel::<()>();
        let sink = self.sink.clone();
        let quiet = self.quiet;
        let task = tokio::spawn(async move {
            let cancellation = guard.cancellation().fuse();
            let delay = tokio::time::sleep(quiet).fuse();
            pin_mut!(cancellation, delay);
            let fire = select! {
                _ = cancellation => false,
                _ = delay => true,
            };
            if let Some(previous) = previous {
                wait_for(previous).await;
            }
            match fire {
                true => sink(value).await,
                false => tracing::trace!("pending write disarmed"),
            }
        });
        self.pending = Some(Pending {
            guard: pending,
            task,
        });
    }

    /// Disarm any pending write, and wait for the writes already running
    pub async fn settle(&mut self) {
        if let Some(Pending { guard, task }) = self.pending.take() {
            drop(guard);
            wait_for(task).await;
        }
    }

    /// Write `value` right away, once any write already running is done
    pub async fn flush(&mut self, value: T) {
        self.settle().await;
        (self.sink)(value).await
    }

    /// Disarm any pending write; a write already running still completes
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            tracing::trace!("cancelling pending write");
        }
    }

    /// Whether a scheduled write has neither completed nor been cancelled yet
    pub fn is_armed(&mut self) -> bool {
        match &mut self.pending {
            None => false,
            Some(p) => match p.guard.try_recv() {
                Ok(None) => true,
                _ => {
                    self.pending = None;
                    false
                }
            },
        }
    }
}

async fn wait_for(task: JoinHandle<()>) {
    if let Err(e) = task.await {
        tracing::error!(err=?e, "debounced write panicked");
    }
}
